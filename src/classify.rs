//! # Error Classification
//!
//! Decides whether a failed remote call is worth reissuing.
//!
//! The remote control plane rejects mutations while a prior mutation on the
//! same resource is still settling ("object in operation", "rule change in
//! progress", "at least one rule must remain"). Those rejections are expected
//! races between a serialized workflow and the remote system's own settlement
//! delay, and they clear on their own. Only a small whitelist of such codes
//! is retried; retrying on any error would mask real faults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_DELAY, DEFAULT_RETRY_MAX_ELAPSED, UNKNOWN_ERROR_CODE};
use crate::remote::RemoteError;

/// Outcome of classifying one failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Transient; the same request should be reissued after a delay
    Retryable,
    /// Surface immediately
    Fatal,
}

/// Classify a failed call against a set of retryable codes.
///
/// A pure set-membership test on the machine-readable code. Calls that
/// failed without a parseable code classify as fatal.
#[must_use]
pub fn classify(err: &RemoteError, retryable_codes: &BTreeSet<String>) -> Classification {
    match err.code() {
        Some(code) if retryable_codes.contains(code) => Classification::Retryable,
        _ => Classification::Fatal,
    }
}

/// Retry budget for one mutating call.
///
/// An error is retried only while its code is in `retryable_codes` and the
/// elapsed time is under `max_elapsed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Codes treated as transient conflicts
    pub retryable_codes: BTreeSet<String>,

    /// Hard ceiling on total time spent retrying
    #[serde(with = "crate::duration::compact", default = "default_max_elapsed")]
    pub max_elapsed: Duration,

    /// Fixed delay between attempts
    #[serde(with = "crate::duration::compact", default = "default_delay")]
    pub delay: Duration,
}

fn default_max_elapsed() -> Duration {
    DEFAULT_RETRY_MAX_ELAPSED
}

fn default_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

impl RetryPolicy {
    /// Policy retrying exactly the given conflict codes.
    pub fn conflicts<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retryable_codes: codes.into_iter().map(Into::into).collect(),
            max_elapsed: DEFAULT_RETRY_MAX_ELAPSED,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Policy retrying the given conflict codes plus the remote API's generic
    /// [`UNKNOWN_ERROR_CODE`].
    ///
    /// Some endpoints report an internal hiccup with the generic code where
    /// others would report a concrete conflict. Call sites that have seen
    /// this opt in here; nothing inherits the broad behavior silently.
    pub fn broad<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::conflicts(codes);
        policy
            .retryable_codes
            .insert(UNKNOWN_ERROR_CODE.to_string());
        policy
    }

    /// Policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self::conflicts(Vec::<String>::new())
    }

    /// Replace the retry time ceiling
    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Replace the inter-attempt delay
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_membership() {
        let policy = RetryPolicy::conflicts(["1250", "RULE_CHANGE_IN_PROGRESS"]);

        let conflict = RemoteError::api("1250", "object in operation");
        assert_eq!(
            classify(&conflict, &policy.retryable_codes),
            Classification::Retryable
        );

        let other = RemoteError::api("4004", "quota exceeded");
        assert_eq!(
            classify(&other, &policy.retryable_codes),
            Classification::Fatal
        );
    }

    #[test]
    fn test_classify_without_code_is_fatal() {
        let policy = RetryPolicy::conflicts(["1250"]);
        let err = RemoteError::unclassified("garbled response body");
        assert_eq!(
            classify(&err, &policy.retryable_codes),
            Classification::Fatal
        );
    }

    #[test]
    fn test_broad_policy_retries_unknown_code() {
        let narrow = RetryPolicy::conflicts(["1250"]);
        let broad = RetryPolicy::broad(["1250"]);
        let unknown = RemoteError::api(UNKNOWN_ERROR_CODE, "internal error");

        assert_eq!(
            classify(&unknown, &narrow.retryable_codes),
            Classification::Fatal
        );
        assert_eq!(
            classify(&unknown, &broad.retryable_codes),
            Classification::Retryable
        );
    }

    #[test]
    fn test_none_policy_retries_nothing() {
        let policy = RetryPolicy::none();
        let err = RemoteError::api("1250", "object in operation");
        assert_eq!(
            classify(&err, &policy.retryable_codes),
            Classification::Fatal
        );
    }

    #[test]
    fn test_builders() {
        let policy = RetryPolicy::conflicts(["1250"])
            .with_delay(Duration::from_secs(1))
            .with_max_elapsed(Duration::from_secs(30));
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(policy.max_elapsed, Duration::from_secs(30));
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"retryable_codes": ["1250"]}"#).expect("deserializes");
        assert_eq!(policy.max_elapsed, DEFAULT_RETRY_MAX_ELAPSED);
        assert_eq!(policy.delay, DEFAULT_RETRY_DELAY);

        let policy: RetryPolicy = serde_json::from_str(
            r#"{"retryable_codes": [], "max_elapsed": "2m", "delay": "10s"}"#,
        )
        .expect("deserializes");
        assert_eq!(policy.max_elapsed, Duration::from_secs(120));
        assert_eq!(policy.delay, Duration::from_secs(10));
    }
}
