// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;

pub use telegram::TelegramBot;

/// Outbound announcement channel.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Send a new announcement and return its message id.
    async fn publish(&self, text: &str) -> Result<i64>;
    /// Replace the text of a previously sent announcement.
    async fn edit(&self, message_id: i64, text: &str) -> Result<()>;
}
