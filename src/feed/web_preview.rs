// src/feed/web_preview.rs
//! Reads a public channel through its web preview (`https://t.me/s/<channel>`).
//! No account or session is needed; the page lists the ~20 latest posts.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{FeedSource, SourcePost};

pub const DEFAULT_BASE_URL: &str = "https://t.me";

static RE_DATA_POST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-post="[^"/]+/(\d+)""#).expect("data-post regex"));
static RE_PHOTO_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a\s[^>]*class="tgme_widget_message_photo_wrap[^"]*"[^>]*>"#)
        .expect("photo tag regex")
});
static RE_HREF_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="[^"]*/(\d+)(?:\?[^"]*)?""#).expect("href regex"));
static RE_BG_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"background-image:url\(['"]?([^'")]+)['"]?\)"#).expect("bg url regex")
});
static RE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="tgme_widget_message_text[^"]*"[^>]*>(.*?)</div>"#)
        .expect("text regex")
});
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));

pub struct WebPreviewFeed {
    channel: String,
    base_url: String,
    client: reqwest::Client,
}

impl WebPreviewFeed {
    pub fn new(channel: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("outage-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .context("build feed http client")?;
        Ok(Self {
            channel: channel.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl FeedSource for WebPreviewFeed {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<SourcePost>> {
        let url = format!("{}/s/{}", self.base_url, self.channel);
        let html = self
            .client
            .get(&url)
            .send()
            .await
            .context("fetch channel preview")?
            .error_for_status()
            .context("channel preview non-2xx")?
            .text()
            .await
            .context("read channel preview body")?;

        let mut posts = parse_preview(&html);
        posts.truncate(limit);
        Ok(posts)
    }

    async fn download_image(&self, post: &SourcePost) -> Result<Vec<u8>> {
        let url = post
            .photo_url
            .as_deref()
            .ok_or_else(|| anyhow!("post {} has no photo", post.id))?;
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("download photo of post {}", post.id))?
            .error_for_status()
            .context("photo download non-2xx")?
            .bytes()
            .await
            .context("read photo bytes")?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        &self.channel
    }
}

/// Parse the preview page into posts, newest first.
///
/// A grouped (album) block becomes one post per photo, all sharing the
/// block's id as `group_id`; the caption is attached to the first photo.
pub fn parse_preview(html: &str) -> Vec<SourcePost> {
    let mut posts = Vec::new();

    for block in html.split("tgme_widget_message_wrap").skip(1) {
        let Some(block_id) = RE_DATA_POST
            .captures(block)
            .and_then(|c| c[1].parse::<i64>().ok())
        else {
            continue;
        };

        let text = RE_TEXT
            .captures(block)
            .map(|c| html_to_text(&c[1]))
            .unwrap_or_default();

        let photos: Vec<(Option<i64>, String)> = RE_PHOTO_TAG
            .find_iter(block)
            .filter_map(|m| {
                let tag = m.as_str();
                let url = RE_BG_URL.captures(tag)?[1].to_string();
                let id = RE_HREF_ID
                    .captures(tag)
                    .and_then(|c| c[1].parse::<i64>().ok());
                Some((id, url))
            })
            .collect();

        if block.contains("tgme_widget_message_grouped_wrap") && !photos.is_empty() {
            let group_id = block_id.to_string();
            for (i, (id, url)) in photos.into_iter().enumerate() {
                posts.push(SourcePost {
                    id: id.unwrap_or(block_id + i as i64),
                    group_id: Some(group_id.clone()),
                    text: if i == 0 { text.clone() } else { String::new() },
                    photo_url: Some(url),
                });
            }
        } else {
            posts.push(SourcePost {
                id: block_id,
                group_id: None,
                text,
                photo_url: photos.into_iter().next().map(|(_, url)| url),
            });
        }
    }

    posts.sort_by(|a, b| b.id.cmp(&a.id));
    posts.dedup_by_key(|p| p.id);
    posts
}

fn html_to_text(fragment: &str) -> String {
    let with_breaks = RE_BR.replace_all(fragment, "\n");
    let stripped = RE_TAGS.replace_all(&with_breaks, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_keeps_line_breaks() {
        let out = html_to_text("<b>Київщина:</b> графіки<br/>на 12 березня &amp; далі");
        assert_eq!(out, "Київщина: графіки\nна 12 березня & далі");
    }

    #[test]
    fn block_without_data_post_is_skipped() {
        let html = r#"<div class="tgme_widget_message_wrap"><div class="x">nothing</div></div>"#;
        assert!(parse_preview(html).is_empty());
    }
}
