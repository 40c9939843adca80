// src/feed/mod.rs
pub mod web_preview;

use anyhow::Result;

/// One fetched item from the watched channel. An album of N images arrives
/// as N posts sharing `group_id`; the caption sits on one of them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourcePost {
    pub id: i64,
    pub group_id: Option<String>,
    pub text: String,
    pub photo_url: Option<String>,
}

impl SourcePost {
    pub fn has_photo(&self) -> bool {
        self.photo_url.is_some()
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Most recent posts, newest first.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<SourcePost>>;
    async fn download_image(&self, post: &SourcePost) -> Result<Vec<u8>>;
    fn name(&self) -> &str;
}
