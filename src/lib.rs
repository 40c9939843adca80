// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod telemetry;

// Core: detection, extraction, parsing, formatting, reconciliation
pub mod change_detector;
pub mod extract;
pub mod reconcile;
pub mod schedule;

// Collaborators
pub mod feed;
pub mod notify;
pub mod ocr;
pub mod state;

// Orchestration
pub mod pipeline;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::pipeline::{CycleOutcome, Watcher};
pub use crate::schedule::{format_announcement, parse, Schedule, TimeWindow};

use anyhow::Result;

use crate::config::{Config, StateBackend};
use crate::feed::web_preview::WebPreviewFeed;
use crate::notify::TelegramBot;
use crate::ocr::TesseractCli;
use crate::state::{FileStore, KvStore, StateRepo, UpstashStore};

/// Wire the production collaborators from configuration.
pub fn build_watcher(cfg: &Config) -> Result<Watcher> {
    let store: Box<dyn KvStore> = match &cfg.state {
        StateBackend::Upstash { url, token } => Box::new(UpstashStore::new(url, token)?),
        StateBackend::File { path } => Box::new(FileStore::new(path)),
    };
    let repo = StateRepo::new(store, cfg.watch.state_key.clone());

    Watcher::new(
        cfg.watch.clone(),
        Box::new(WebPreviewFeed::new(cfg.watch.channel.clone())?),
        Box::new(TesseractCli::new(cfg.watch.tesseract_bin.clone())),
        Box::new(TelegramBot::new(cfg.bot_token.clone(), cfg.chat_id.clone())),
        repo,
    )
}
