//! Operator notifications: the [`Notifier`] seam, a Telegram bot client and
//! a log-only fallback used when no bot is configured.

pub mod format;
mod retry;
pub mod telegram;

use async_trait::async_trait;
use ciewatch_core::TelegramConfig;
use thiserror::Error;

pub use format::{format_error, format_new_slots};
pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure. The request URL is stripped because it carries the
    /// bot token.
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),

    /// Non-2xx HTTP status from the bot API. `retry_after_secs` is the
    /// flood-control wait Telegram sends with a 429.
    #[error("telegram returned {status}: {description}")]
    Status {
        status: u16,
        description: String,
        retry_after_secs: Option<u64>,
    },

    /// 2xx response whose envelope reported `"ok": false`.
    #[error("telegram api error: {0}")]
    Api(String),

    #[error("invalid telegram base url: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Http(e.without_url())
    }
}

/// Delivers a text message to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the message could not be delivered.
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(text, "notification (no transport configured)");
        Ok(())
    }
}

/// Telegram when configured, the log otherwise.
///
/// # Errors
///
/// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
pub fn build_notifier(
    telegram: Option<&TelegramConfig>,
    max_retries: u32,
) -> Result<Box<dyn Notifier>, NotifyError> {
    match telegram {
        Some(config) => Ok(Box::new(TelegramNotifier::new(config, max_retries)?)),
        None => {
            tracing::warn!("TELEGRAM_TOKEN not set; notifications will only be logged");
            Ok(Box::new(LogNotifier))
        }
    }
}

/// Send `text`, logging instead of propagating a failure.
///
/// Returns whether the message was delivered.
pub async fn notify_best_effort(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.notify(text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "notification failed");
            false
        }
    }
}
