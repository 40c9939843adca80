// tests/web_preview.rs
use outage_relay::change_detector::{ChangeDetector, Detection};
use outage_relay::config::WatchConfig;
use outage_relay::feed::web_preview::{parse_preview, WebPreviewFeed};
use outage_relay::feed::FeedSource;

const FIXTURE: &str = include_str!("fixtures/channel_preview.html");

#[test]
fn fixture_parses_newest_first_with_album_grouping() {
    let posts = parse_preview(FIXTURE);
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![4103, 4102, 4101, 4100]);

    let single = &posts[0];
    assert_eq!(single.group_id, None);
    assert_eq!(
        single.photo_url.as_deref(),
        Some("https://cdn4.telesco.pe/file/ccc.jpg")
    );

    let (second, first) = (&posts[1], &posts[2]);
    assert_eq!(first.group_id.as_deref(), Some("4101"));
    assert_eq!(second.group_id.as_deref(), Some("4101"));
    assert_eq!(first.text, "Київщина: графіки відключень\nна 12 березня !");
    assert!(second.text.is_empty());
    assert_eq!(
        second.photo_url.as_deref(),
        Some("https://cdn4.telesco.pe/file/bbb.jpg")
    );

    let text_only = &posts[3];
    assert!(!text_only.has_photo());
    assert_eq!(text_only.text, "Шановні клієнти! Планові роботи у Вишгороді.");
}

#[test]
fn detector_picks_the_revision_from_the_fixture() {
    let posts = parse_preview(FIXTURE);
    let d = ChangeDetector::from_config(&WatchConfig::default()).unwrap();
    let Detection::Process(c) = d.detect(&posts, None) else {
        panic!("expected a candidate");
    };
    assert!(c.is_revision);
    assert_eq!(c.identity, "4103");
    assert_eq!(c.album.len(), 1);

    // Without the revision the album is chosen, with both photos.
    let Detection::Process(c) = d.detect(&posts[1..], None) else {
        panic!("expected a candidate");
    };
    assert_eq!(c.identity, "4101");
    assert_eq!(c.album.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4101, 4102]);
}

#[tokio::test]
async fn fetch_recent_reads_preview_page_and_limits() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/s/dtek_ua")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(FIXTURE)
        .create_async()
        .await;
    let photo = server
        .mock("GET", "/file/ccc.jpg")
        .with_status(200)
        .with_body(vec![0xFF, 0xD8, 0xFF])
        .create_async()
        .await;

    let feed = WebPreviewFeed::new("dtek_ua")
        .unwrap()
        .with_base_url(server.url());
    let posts = feed.fetch_recent(2).await.unwrap();
    assert_eq!(posts.len(), 2);
    page.assert_async().await;

    let mut newest = posts[0].clone();
    newest.photo_url = Some(format!("{}/file/ccc.jpg", server.url()));
    let bytes = feed.download_image(&newest).await.unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    photo.assert_async().await;
}

#[tokio::test]
async fn preview_http_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/s/dtek_ua")
        .with_status(503)
        .create_async()
        .await;

    let feed = WebPreviewFeed::new("dtek_ua")
        .unwrap()
        .with_base_url(server.url());
    assert!(feed.fetch_recent(20).await.is_err());
}
