//! # Resource Status
//!
//! Status model shared by every resource kind: the value a probe returns and
//! the probe trait that resource-specific code implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::remote::RemoteError;

/// Synthetic status code for a resource the remote system does not know about.
///
/// Probes report absence through [`ResourceStatus::missing`] rather than an
/// error, and the poller matches this code against the pending and target
/// sets like any other. Delete-completion waits put it in the target set;
/// creation waits may put it in the pending set to ride out read-after-write
/// lag on the remote side.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Snapshot of one resource's remote status.
///
/// Produced fresh on every probe call; never mutated, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Remote identifier of the resource
    pub id: String,
    /// Machine-readable status code as reported by the remote API
    pub code: String,
    /// False when the remote system answered "no such resource"
    pub exists: bool,
}

impl ResourceStatus {
    /// Status for a resource the remote system reported on
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            exists: true,
        }
    }

    /// Status for a resource the remote system does not know about
    pub fn missing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: NOT_FOUND.to_string(),
            exists: false,
        }
    }

    /// Code used for set-membership checks, mapping absence to [`NOT_FOUND`]
    ///
    /// Probe implementations are free to leave `code` empty when a resource
    /// is gone; membership tests must not depend on that.
    #[must_use]
    pub fn effective_code(&self) -> &str {
        if self.exists {
            &self.code
        } else {
            NOT_FOUND
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exists {
            write!(f, "{} ({})", self.id, self.code)
        } else {
            write!(f, "{} (not found)", self.id)
        }
    }
}

/// Read-only status query for one resource kind.
///
/// Implemented once per resource kind (servers, block storage, network
/// interfaces, access-control rules, public IPs, login keys). A probe
/// failure is a call failure and aborts the wait that issued it; a resource
/// that is simply gone is a successful probe returning
/// [`ResourceStatus::missing`].
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Fetch the current remote status of `id`
    async fn probe(&self, id: &str) -> Result<ResourceStatus, RemoteError>;
}
