//! Telegram bot `sendMessage` client.

use std::time::Duration;

use async_trait::async_trait;
use ciewatch_core::TelegramConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::format::truncate_message;
use crate::retry::retry_with_backoff;
use crate::{Notifier, NotifyError};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Sends messages to one chat through the bot API.
///
/// Use [`TelegramNotifier::new`] in production and
/// [`TelegramNotifier::with_base_url`] to point at a mock server in tests.
pub struct TelegramNotifier {
    client: Client,
    endpoint: Url,
    chat_id: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("endpoint", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig, max_retries: u32) -> Result<Self, NotifyError> {
        Self::with_base_url(config, max_retries, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built, or
    /// [`NotifyError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        config: &TelegramConfig,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ciewatch/0.1")
            .build()?;

        let endpoint = Url::parse(&format!(
            "{}/bot{}/sendMessage",
            base_url.trim_end_matches('/'),
            config.token
        ))
        .map_err(|_| NotifyError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            chat_id: config.chat_id.clone(),
            max_retries,
            backoff_base_ms: BACKOFF_BASE_MS,
        })
    }

    /// Override the first retry delay.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    async fn send_once(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                disable_web_page_preview: true,
            })
            .send()
            .await?;

        let status = response.status();
        let envelope = match response.json::<Envelope>().await {
            Ok(envelope) => Some(envelope),
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => None,
        };

        match envelope {
            Some(Envelope { ok: true, .. }) if status.is_success() => Ok(()),
            Some(Envelope { description, .. }) if status.is_success() => Err(NotifyError::Api(
                description.unwrap_or_else(|| "request rejected".to_string()),
            )),
            other => {
                let (description, retry_after_secs) = match other {
                    Some(Envelope {
                        description,
                        parameters,
                        ..
                    }) => (description, parameters.and_then(|p| p.retry_after)),
                    None => (None, None),
                };
                Err(NotifyError::Status {
                    status: status.as_u16(),
                    description: description.unwrap_or_else(|| status.to_string()),
                    retry_after_secs,
                })
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let text = truncate_message(text);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_once(&text)
        })
        .await?;
        tracing::debug!(chat_id = %self.chat_id, chars = text.chars().count(), "telegram message sent");
        Ok(())
    }
}
