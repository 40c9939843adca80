// tests/common/mod.rs
// In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use outage_relay::config::WatchConfig;
use outage_relay::feed::{FeedSource, SourcePost};
use outage_relay::notify::Publisher;
use outage_relay::ocr::OcrEngine;
use outage_relay::state::{MemoryStore, StateRepo, DEFAULT_STATE_KEY};
use outage_relay::Watcher;

pub fn post(id: i64, group: Option<&str>, text: &str, photo: bool) -> SourcePost {
    SourcePost {
        id,
        group_id: group.map(str::to_string),
        text: text.to_string(),
        photo_url: photo.then(|| format!("https://cdn.example/{id}.jpg")),
    }
}

#[derive(Default)]
struct FeedInner {
    posts: Mutex<Vec<SourcePost>>,
    // post id -> image bytes; EchoOcr returns the bytes as text
    images: Mutex<HashMap<i64, Vec<u8>>>,
    fail_fetch: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    downloads: Mutex<Vec<i64>>,
}

#[derive(Clone, Default)]
pub struct FakeFeed(Arc<FeedInner>);

impl FakeFeed {
    pub fn set_posts(&self, posts: Vec<SourcePost>) {
        *self.0.posts.lock().unwrap() = posts;
    }

    pub fn set_image(&self, id: i64, ocr_text: &str) {
        self.0
            .images
            .lock()
            .unwrap()
            .insert(id, ocr_text.as_bytes().to_vec());
    }

    pub fn fail_fetch(&self, on: bool) {
        self.0.fail_fetch.store(on, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.0.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn downloads(&self) -> Vec<i64> {
        self.0.downloads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for FakeFeed {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<SourcePost>> {
        let delay = *self.0.fetch_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self.0.fail_fetch.load(Ordering::SeqCst) {
            bail!("feed unavailable");
        }
        let mut posts = self.0.posts.lock().unwrap().clone();
        posts.truncate(limit);
        Ok(posts)
    }

    async fn download_image(&self, post: &SourcePost) -> Result<Vec<u8>> {
        self.0.downloads.lock().unwrap().push(post.id);
        self.0
            .images
            .lock()
            .unwrap()
            .get(&post.id)
            .cloned()
            .ok_or_else(|| anyhow!("no image for {}", post.id))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct EchoOcr;

#[async_trait::async_trait]
impl OcrEngine for EchoOcr {
    async fn recognize(&self, image: &[u8], _language: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(image).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Publish(String),
    Edit(i64, String),
}

struct PublisherInner {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    fail: AtomicBool,
}

#[derive(Clone)]
pub struct RecordingPublisher(Arc<PublisherInner>);

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self(Arc::new(PublisherInner {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            fail: AtomicBool::new(false),
        }))
    }
}

impl RecordingPublisher {
    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.lock().unwrap().clone()
    }

    pub fn fail(&self, on: bool) {
        self.0.fail.store(on, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<i64> {
        if self.0.fail.load(Ordering::SeqCst) {
            bail!("sendMessage rejected: Bad Request");
        }
        self.0.calls.lock().unwrap().push(Call::Publish(text.to_string()));
        Ok(self.0.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit(&self, message_id: i64, text: &str) -> Result<()> {
        if self.0.fail.load(Ordering::SeqCst) {
            bail!("editMessageText rejected: Bad Request");
        }
        self.0
            .calls
            .lock()
            .unwrap()
            .push(Call::Edit(message_id, text.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub feed: FakeFeed,
    pub publisher: RecordingPublisher,
    pub store: Arc<MemoryStore>,
    pub watcher: Watcher,
}

pub fn harness() -> Harness {
    harness_with(WatchConfig::default())
}

pub fn harness_with(cfg: WatchConfig) -> Harness {
    let feed = FakeFeed::default();
    let publisher = RecordingPublisher::default();
    let store = Arc::new(MemoryStore::new());
    let repo = StateRepo::new(Box::new(store.clone()), DEFAULT_STATE_KEY);
    let watcher = Watcher::new(
        cfg,
        Box::new(feed.clone()),
        Box::new(EchoOcr),
        Box::new(publisher.clone()),
        repo,
    )
    .unwrap();
    Harness {
        feed,
        publisher,
        store,
        watcher,
    }
}
