// src/state/mod.rs
//! Durable dedup bookkeeping.
//!
//! The whole [`ProcessingState`] is stored as one JSON value under one key,
//! so identity and output message id can never be written separately.

pub mod file;
pub mod upstash;

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub use file::FileStore;
pub use upstash::UpstashStore;

pub const DEFAULT_STATE_KEY: &str = "outage_relay_state";

// Split keys written by earlier deployments; read only when the compound
// record does not exist yet.
pub const LEGACY_IDENTITY_KEY: &str = "last_dtek_album";
pub const LEGACY_MESSAGE_KEY: &str = "last_dtek_message";

#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub last_source_identity: Option<String>,
    pub last_output_message_id: Option<i64>,
    /// SHA-256 of the last published/edited announcement text.
    #[serde(default)]
    pub last_text_digest: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reads and writes [`ProcessingState`] through a [`KvStore`].
pub struct StateRepo {
    key: String,
    store: Box<dyn KvStore>,
}

impl StateRepo {
    pub fn new(store: Box<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            store,
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Result<ProcessingState> {
        if let Some(raw) = self.store.get(&self.key).await.context("state get")? {
            return serde_json::from_str(&raw)
                .with_context(|| format!("decode state under {}", self.key));
        }
        self.load_legacy().await
    }

    async fn load_legacy(&self) -> Result<ProcessingState> {
        let identity = self
            .store
            .get(LEGACY_IDENTITY_KEY)
            .await
            .context("legacy identity get")?
            // "single" was written for every non-album post; it identifies nothing.
            .filter(|v| !v.is_empty() && v != "single");
        let message_id = self
            .store
            .get(LEGACY_MESSAGE_KEY)
            .await
            .context("legacy message get")?
            .and_then(|v| v.trim().parse::<i64>().ok());

        if identity.is_some() || message_id.is_some() {
            tracing::info!(
                ?identity,
                ?message_id,
                "state: no compound record, using legacy keys"
            );
        }
        Ok(ProcessingState {
            last_source_identity: identity,
            last_output_message_id: message_id,
            ..ProcessingState::default()
        })
    }

    /// One `set` call carrying every field.
    pub async fn save(&self, state: &ProcessingState) -> Result<()> {
        let raw = serde_json::to_string(state).context("encode state")?;
        self.store.set(&self.key, &raw).await.context("state set")
    }
}

/// In-process store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.inner.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait::async_trait]
impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn repo(store: Arc<MemoryStore>) -> StateRepo {
        StateRepo::new(Box::new(store), DEFAULT_STATE_KEY)
    }

    #[tokio::test]
    async fn missing_record_means_never_processed() {
        let st = repo(Arc::new(MemoryStore::new())).load().await.unwrap();
        assert_eq!(st, ProcessingState::default());
    }

    #[tokio::test]
    async fn save_is_a_single_key_write() {
        let store = Arc::new(MemoryStore::new());
        let r = repo(store.clone());
        let st = ProcessingState {
            last_source_identity: Some("777".into()),
            last_output_message_id: Some(42),
            ..Default::default()
        };
        r.save(&st).await.unwrap();

        let snap = store.snapshot().await;
        assert_eq!(snap.len(), 1);
        assert!(snap.contains_key(DEFAULT_STATE_KEY));
        assert_eq!(r.load().await.unwrap(), st);
    }

    #[tokio::test]
    async fn legacy_keys_are_used_as_fallback() {
        let store = Arc::new(MemoryStore::new());
        store.set(LEGACY_IDENTITY_KEY, "single").await.unwrap();
        store.set(LEGACY_MESSAGE_KEY, "1234").await.unwrap();

        let st = repo(store).load().await.unwrap();
        assert_eq!(st.last_source_identity, None);
        assert_eq!(st.last_output_message_id, Some(1234));
    }

    #[tokio::test]
    async fn corrupt_record_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_STATE_KEY, "{not json").await.unwrap();
        assert!(repo(store).load().await.is_err());
    }
}
