// src/state/upstash.rs
//! Upstash Redis over its REST API: `GET /get/<key>` and `POST /set/<key>`
//! with the value as the request body.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::KvStore;

pub struct UpstashStore {
    base_url: String,
    token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .context("build upstash http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    async fn reply(rsp: reqwest::Response, op: &str) -> Result<RestReply> {
        let status = rsp.status();
        let body = rsp
            .text()
            .await
            .map_err(|e| anyhow!("upstash {op} body: {}", e.without_url()))?;
        let reply: RestReply = serde_json::from_str(&body)
            .with_context(|| format!("upstash {op} returned {status}: {body}"))?;
        if let Some(err) = reply.error {
            bail!("upstash {op} error: {err}");
        }
        if !status.is_success() {
            bail!("upstash {op} returned {status}");
        }
        Ok(reply)
    }
}

#[async_trait::async_trait]
impl KvStore for UpstashStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let rsp = self
            .client
            .get(format!("{}/get/{}", self.base_url, key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| anyhow!("upstash get request failed: {}", e.without_url()))?;

        match Self::reply(rsp, "get").await?.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let rsp = self
            .client
            .post(format!("{}/set/{}", self.base_url, key))
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| anyhow!("upstash set request failed: {}", e.without_url()))?;

        let reply = Self::reply(rsp, "set").await?;
        match reply.result {
            Some(serde_json::Value::String(s)) if s == "OK" => Ok(()),
            other => bail!("upstash set unexpected result: {other:?}"),
        }
    }

    fn name(&self) -> &'static str {
        "upstash"
    }
}
