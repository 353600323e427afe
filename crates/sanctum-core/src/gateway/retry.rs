//! Retry classification and backoff computation.
//!
//! Provides the transient/permanent split and the jittered exponential
//! backoff schedule applied between gateway attempts.

use rand::Rng;
use sanctum_types::models::RetryConfig;
use sanctum_types::TypedError;
use std::time::Duration;

/// Message fragments that mark an otherwise-ambiguous failure as transient.
pub const TRANSIENT_MARKERS: &[&str] = &["network", "timeout", "503", "502"];

/// Upper bound of the random jitter added to each backoff delay (fraction
/// of the computed delay).
pub const MAX_JITTER_RATIO: f64 = 0.10;

/// Whether a classified failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Likely to succeed on a later attempt
    Transient,
    /// Retrying cannot change the outcome
    Permanent,
}

/// Classify a typed error for retry purposes.
///
/// Auth, authorization, and validation failures are always permanent:
/// resending identical credentials or input cannot succeed. Network
/// failures are always transient. Integration and unknown failures fall
/// back to a message scan for transient markers.
pub fn classify_retry(error: &TypedError) -> RetryClass {
    match error {
        TypedError::Auth { .. }
        | TypedError::Authorization { .. }
        | TypedError::Validation { .. } => RetryClass::Permanent,
        TypedError::Network { .. } => RetryClass::Transient,
        TypedError::Integration { message, .. } | TypedError::Unknown { message, .. } => {
            if has_transient_marker(message) {
                RetryClass::Transient
            } else {
                RetryClass::Permanent
            }
        }
    }
}

/// Checks whether the error is worth another attempt.
#[inline]
pub fn is_retryable(error: &TypedError) -> bool {
    classify_retry(error) == RetryClass::Transient
}

fn has_transient_marker(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Delay before the retry following zero-indexed `attempt`.
///
/// Doubles from the base per attempt, clamps at the ceiling, then adds up
/// to [`MAX_JITTER_RATIO`] of random jitter so synchronized clients spread
/// out.
pub fn next_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let capped_ms = backoff_ms(attempt, config);
    let jitter_ms = (capped_ms as f64 * rand::thread_rng().gen_range(0.0..=MAX_JITTER_RATIO)) as u64;
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}

/// The deterministic (pre-jitter) backoff for zero-indexed `attempt`.
pub(crate) fn backoff_ms(attempt: u32, config: &RetryConfig) -> u64 {
    config
        .base_delay_ms
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(config.max_delay_ms)
}
