//! Exponential backoff shared by the HTTP providers

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Longest pause between two attempts
const MAX_BACKOFF_SECS: u64 = 60;

/// Outcome of a failed attempt
#[derive(Debug)]
pub(crate) enum Failure {
    /// Worth another attempt (network error, 5xx, 429)
    Transient(Error),
    /// Retrying cannot help (other 4xx, unparseable body)
    Permanent(Error),
}

impl Failure {
    /// Classify a non-success HTTP status
    pub(crate) fn from_status(status: StatusCode, error: Error) -> Self {
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            Failure::Permanent(error)
        } else {
            Failure::Transient(error)
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

/// Run `operation` up to `max_retries + 1` times, sleeping `2^attempt` seconds between attempts
///
/// A `Failure::Permanent` is returned at once.
pub(crate) async fn retry_with_backoff<F, Fut, T>(
    label: &str,
    max_retries: u32,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, Failure>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(Failure::Permanent(e)) => {
                tracing::warn!("{} failed without retry: {}", label, e);
                return Err(e);
            }
            Err(Failure::Transient(e)) => {
                if attempt < max_retries {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt + 1,
                        max_retries.saturating_add(1),
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal(format!("{} failed", label))))
}
