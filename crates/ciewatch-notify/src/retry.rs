//! Retry with exponential back-off and jitter for bot API calls.

use std::future::Future;
use std::time::Duration;

use crate::NotifyError;

/// Network failures, 5xx and 429 are worth another attempt. Anything else
/// (bad token, unknown chat, malformed base URL) will fail the same way again.
pub(crate) fn is_retriable(err: &NotifyError) -> bool {
    match err {
        NotifyError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        NotifyError::Status { status, .. } => *status == 429 || *status >= 500,
        NotifyError::Api(_) | NotifyError::InvalidBaseUrl(_) => false,
    }
}

/// Ceiling on a server-requested flood-control wait.
const MAX_RETRY_AFTER_MS: u64 = 300_000;
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before retry number `attempt` (1-based).
///
/// A 429 carrying `retry_after` waits exactly that long, capped at five
/// minutes. Everything else doubles from `backoff_base_ms`, is capped at
/// 30 s and jittered by ±25 %.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn retry_delay_ms(err: &NotifyError, attempt: u32, backoff_base_ms: u64) -> u64 {
    if let NotifyError::Status {
        status: 429,
        retry_after_secs: Some(secs),
        ..
    } = err
    {
        return secs.saturating_mul(1_000).min(MAX_RETRY_AFTER_MS);
    }
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// retriable errors, sleeping [`retry_delay_ms`] between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NotifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = retry_delay_ms(&err, attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "notification failed; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
