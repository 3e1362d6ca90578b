//! # Engine Errors
//!
//! Failure taxonomy of the engine. An error is either resolved by retry or
//! returned to the caller unchanged; nothing is swallowed.

use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

use crate::remote::RemoteError;
use crate::status::ResourceStatus;

/// Failure of a single poll or invoke operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The wait budget ran out while the resource was still transitioning.
    ///
    /// Carries the last observed status for diagnostics. The resource is left
    /// exactly as the remote system last reported it; no cleanup is attempted.
    #[error("timed out after {waited:?}; last observed status: {last}")]
    Timeout {
        /// Time spent waiting, including the initial delay
        waited: Duration,
        /// Status observed on the final probe
        last: ResourceStatus,
    },

    /// A probe reported a status outside both the pending and target sets.
    ///
    /// Never retried: an unknown state means either a modeling gap in the
    /// poll spec or an out-of-band change to the resource, and polling
    /// through it would hide both.
    #[error("unexpected status {last}; pending {pending:?}, target {target:?}")]
    UnexpectedState {
        /// The offending status
        last: ResourceStatus,
        /// Codes the wait considered transitional
        pending: BTreeSet<String>,
        /// Codes the wait considered settled
        target: BTreeSet<String>,
    },

    /// A remote call failed fatally, surfaced verbatim.
    ///
    /// Covers probe call failures, mutations rejected with a non-retryable
    /// code, and retryable rejections whose time budget ran out.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl EngineError {
    /// True when the failure was the wait budget running out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
