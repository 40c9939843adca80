// src/notify/telegram.rs
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Publisher;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client posting HTML announcements to one chat.
#[derive(Clone)]
pub struct TelegramBot {
    token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

impl TelegramBot {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        // `without_url` keeps the bot token out of error messages and logs.
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {method} request failed: {}", e.without_url()))?;

        let status = rsp.status();
        let text = rsp
            .text()
            .await
            .map_err(|e| anyhow!("telegram {method} body: {}", e.without_url()))?;

        serde_json::from_str::<ApiResponse<T>>(&text)
            .with_context(|| format!("telegram {method} returned {status} with unexpected body"))
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: &'a str,
    message_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[async_trait::async_trait]
impl Publisher for TelegramBot {
    async fn publish(&self, text: &str) -> Result<i64> {
        let req = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let rsp: ApiResponse<SentMessage> = self.call("sendMessage", &req).await?;
        if !rsp.ok {
            bail!(
                "sendMessage rejected: {}",
                rsp.description.unwrap_or_default()
            );
        }
        rsp.result
            .map(|m| m.message_id)
            .ok_or_else(|| anyhow!("sendMessage ok but no message_id"))
    }

    async fn edit(&self, message_id: i64, text: &str) -> Result<()> {
        let req = EditMessageText {
            chat_id: &self.chat_id,
            message_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let rsp: ApiResponse<serde_json::Value> = self.call("editMessageText", &req).await?;
        if rsp.ok {
            return Ok(());
        }
        let description = rsp.description.unwrap_or_default();
        // Same text as before: the target already shows what we want.
        if description.contains("message is not modified") {
            tracing::debug!(message_id, "edit skipped by telegram: not modified");
            return Ok(());
        }
        bail!("editMessageText rejected: {description}")
    }
}
