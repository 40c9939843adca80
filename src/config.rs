// src/config.rs
//! Runtime configuration.
//!
//! Secrets and endpoints come from the environment (`.env` is honoured by
//! `main`). The watch rules come from an optional TOML file:
//! 1) $WATCH_CONFIG_PATH (must exist if set)
//! 2) config/watch.toml
//! 3) built-in defaults
//!
//! A few rules can be overridden from the environment as well.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::extract::ExtractionStrategy;
use crate::state::{file::DEFAULT_STATE_PATH, DEFAULT_STATE_KEY};

pub const ENV_WATCH_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const DEFAULT_WATCH_CONFIG_PATH: &str = "config/watch.toml";

fn default_channel() -> String {
    "dtek_ua".into()
}
fn default_region() -> String {
    "Київщина".into()
}
fn default_keyword() -> String {
    "графіки".into()
}
fn default_revision_marker() -> String {
    "оновлен".into()
}
fn default_fetch_limit() -> usize {
    20
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_ocr_language() -> String {
    "ukr".into()
}
fn default_tesseract_bin() -> String {
    "tesseract".into()
}
fn default_strategies() -> Vec<ExtractionStrategy> {
    vec![ExtractionStrategy::Ocr, ExtractionStrategy::Caption]
}
fn default_state_key() -> String {
    DEFAULT_STATE_KEY.into()
}

/// What to watch and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Caption must contain `<region>:` followed by `<keyword>`.
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    /// Word stem marking a revised schedule, between region and keyword.
    #[serde(default = "default_revision_marker")]
    pub revision_marker: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,
    /// Tried in order until one yields at least one queue.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<ExtractionStrategy>,
    #[serde(default = "default_state_key")]
    pub state_key: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            region: default_region(),
            keyword: default_keyword(),
            revision_marker: default_revision_marker(),
            fetch_limit: default_fetch_limit(),
            poll_interval_secs: default_poll_interval_secs(),
            ocr_language: default_ocr_language(),
            tesseract_bin: default_tesseract_bin(),
            strategies: default_strategies(),
            state_key: default_state_key(),
        }
    }
}

impl WatchConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading watch config from {}", path.display()))?;
        let cfg: WatchConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.sanitized()
    }

    pub fn load_default() -> Result<Self> {
        let cfg = if let Ok(p) = env::var(ENV_WATCH_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("WATCH_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_WATCH_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_WATCH_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.with_env_overrides().sanitized()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = non_empty_env("SOURCE_CHANNEL") {
            self.channel = v;
        }
        if let Some(v) = non_empty_env("POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.poll_interval_secs = v;
        }
        if let Some(v) = non_empty_env("FETCH_LIMIT").and_then(|v| v.parse().ok()) {
            self.fetch_limit = v;
        }
        if let Some(v) = non_empty_env("OCR_LANG") {
            self.ocr_language = v;
        }
        self
    }

    fn sanitized(mut self) -> Result<Self> {
        self.channel = self.channel.trim().trim_start_matches('@').to_string();
        if self.channel.is_empty() {
            bail!("watch config: channel must not be empty");
        }
        if self.region.trim().is_empty() || self.keyword.trim().is_empty() {
            bail!("watch config: region and keyword must not be empty");
        }
        if self.revision_marker.trim().is_empty() {
            bail!("watch config: revision_marker must not be empty");
        }
        if self.strategies.is_empty() {
            self.strategies = default_strategies();
        }
        self.poll_interval_secs = self.poll_interval_secs.max(5);
        self.fetch_limit = self.fetch_limit.clamp(1, 100);
        Ok(self)
    }
}

/// Where durable state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateBackend {
    Upstash { url: String, token: String },
    File { path: PathBuf },
}

/// Full process configuration. Not `Debug`: it carries the bot token.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub state: StateBackend,
    pub port: u16,
    pub watch: WatchConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token =
            non_empty_env("BOT_TOKEN").ok_or_else(|| anyhow!("Missing BOT_TOKEN env var"))?;
        let chat_id = non_empty_env("CHAT_ID").ok_or_else(|| anyhow!("Missing CHAT_ID env var"))?;

        let state = match (
            non_empty_env("UPSTASH_REDIS_REST_URL"),
            non_empty_env("UPSTASH_REDIS_REST_TOKEN"),
        ) {
            (Some(url), Some(token)) => StateBackend::Upstash { url, token },
            (Some(_), None) => {
                bail!("UPSTASH_REDIS_REST_URL set without UPSTASH_REDIS_REST_TOKEN")
            }
            _ => StateBackend::File {
                path: non_empty_env("STATE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            },
        };

        let port = match non_empty_env("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {p}"))?,
            None => 3000,
        };

        Ok(Self {
            bot_token,
            chat_id,
            state,
            port,
            watch: WatchConfig::load_default()?,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
