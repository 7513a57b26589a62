//! Retry configuration, backoff calculation, and the async retry executor.
//!
//! Every call to an external embedding or completion provider goes through
//! [`with_retry`]:
//!
//! - [`RetryConfig`]: retry parameters (max retries, backoff, jitter)
//! - [`RetryableError`]: errors that know whether another attempt can help
//! - [`calculate_backoff_delay_with_random`]: exponential backoff with jitter
//! - [`parse_retry_after_header`]: parse a `Retry-After` HTTP header
//!
//! Cancellation is cooperative through a [`CancellationToken`]: it aborts the
//! in-flight attempt and any backoff wait immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default maximum retries (three attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 8_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call (default: 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms (default: 500).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms (default: 8000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (random * 2 - 1) * jitter)`
///
/// `attempt` is zero-based (0 for the first retry). `random` should be a
/// value in `[0.0, 1.0]` from a PRNG; 0.5 yields the un-jittered delay.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn calculate_backoff_delay_with_random(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(max_delay_ms);

    // Maps random [0,1] to [-jitter, +jitter]
    let jitter = 1.0 + (random * 2.0 - 1.0) * jitter_factor;
    let with_jitter = (capped as f64) * jitter;

    with_jitter.round().max(0.0) as u64
}

/// Parse a `Retry-After` HTTP header value.
///
/// The value can be either a number of seconds (`"120"`) or an HTTP-date
/// (`"Thu, 01 Dec 2025 16:00:00 GMT"`). Returns the delay in milliseconds,
/// or `None` if parsing fails.
#[must_use]
pub fn parse_retry_after_header(value: &str) -> Option<u64> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(seconds.saturating_mul(1000));
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let delay_ms = date
            .signed_duration_since(chrono::Utc::now())
            .num_milliseconds();
        return Some(u64::try_from(delay_ms).unwrap_or(0));
    }

    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor
// ─────────────────────────────────────────────────────────────────────────────

/// An error that knows whether retrying the failed operation can help.
pub trait RetryableError: fmt::Display {
    /// Whether another attempt may succeed.
    fn is_retryable(&self) -> bool;

    /// Server-suggested delay before the next attempt, if any.
    fn retry_after_ms(&self) -> Option<u64> {
        None
    }

    /// Short category label for logs and metrics.
    fn category(&self) -> &str {
        "unknown"
    }
}

/// Outcome of a failed [`with_retry`] call.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The cancellation token fired before the operation succeeded.
    Cancelled,
    /// The last attempt failed with a non-retryable error or the retry
    /// budget ran out.
    Failed {
        /// Total number of attempts made (1-based).
        attempts: u32,
        /// The error from the last attempt.
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Unwrap the last error, mapping cancellation through `on_cancel`.
    pub fn into_inner_or(self, on_cancel: impl FnOnce() -> E) -> E {
        match self {
            Self::Cancelled => on_cancel(),
            Self::Failed { source, .. } => source,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Failed { attempts, source } => {
                write!(f, "{source} (after {attempts} attempt(s))")
            }
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cancelled => None,
            Self::Failed { source, .. } => Some(source),
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget in `config` is spent.
///
/// Waits with exponential backoff (honouring `retry_after_ms` when it is
/// larger) between attempts. Cancellation aborts both the in-flight attempt
/// and the backoff wait.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: RetryableError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            r = op() => r,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || attempt >= config.max_retries {
            debug!(attempts = attempt + 1, error = %err, "giving up");
            return Err(RetryError::Failed {
                attempts: attempt + 1,
                source: err,
            });
        }

        let backoff_ms = calculate_backoff_delay_with_random(
            attempt,
            config.base_delay_ms,
            config.max_delay_ms,
            config.jitter_factor,
            rand::random::<f64>(),
        );
        let delay_ms = err
            .retry_after_ms()
            .map_or(backoff_ms, |ra| backoff_ms.max(ra));
        attempt += 1;

        metrics::counter!("provider_retries_total", "category" => err.category().to_string())
            .increment(1);
        warn!(
            attempt,
            max_retries = config.max_retries,
            delay_ms,
            category = err.category(),
            error = %err,
            "provider call failed, retrying"
        );

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
