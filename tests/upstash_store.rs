// tests/upstash_store.rs
use mockito::Matcher;
use outage_relay::state::{KvStore, UpstashStore};
use serde_json::json;

fn store(server: &mockito::Server) -> UpstashStore {
    UpstashStore::new(server.url(), "tok").unwrap()
}

#[tokio::test]
async fn get_returns_string_result() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get/outage_relay_state")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(json!({"result": "{\"last_source_identity\":\"1\"}"}).to_string())
        .create_async()
        .await;

    let v = store(&server).get("outage_relay_state").await.unwrap();
    assert_eq!(v.as_deref(), Some("{\"last_source_identity\":\"1\"}"));
    mock.assert_async().await;
}

#[tokio::test]
async fn get_null_is_absent() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get/missing")
        .with_status(200)
        .with_body(json!({"result": null}).to_string())
        .create_async()
        .await;

    assert_eq!(store(&server).get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn set_posts_value_as_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/set/k")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Exact("{\"a\":1}".into()))
        .with_status(200)
        .with_body(json!({"result": "OK"}).to_string())
        .create_async()
        .await;

    store(&server).set("k", "{\"a\":1}").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn error_reply_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get/k")
        .with_status(401)
        .with_body(json!({"error": "WRONGPASS invalid password"}).to_string())
        .create_async()
        .await;

    let err = store(&server).get("k").await.unwrap_err();
    assert!(format!("{err:#}").contains("WRONGPASS"));
}
