//! # Resource Reconciler
//!
//! Reconciliation engine for a cloud-infrastructure control plugin. The
//! plugin's resource layer builds request payloads and flattens responses;
//! this crate owns the hard part in between: submitting mutations against an
//! eventually consistent control plane, polling until the resource settles,
//! retrying transient conflicts, and sequencing multi-step flows such as
//! detach-resize-reattach or stop-respec-start.
//!
//! The engine is stateless and runs inline in the caller's task. Every call
//! blocks that one logical operation until the resource settled, the
//! operation definitively failed, or its time budget ran out. Independent
//! operations can run concurrently from separate tasks; serialization
//! against in-flight mutations on the same resource is the remote system's
//! job, surfaced as the conflict codes a [`RetryPolicy`] whitelists.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use resource_reconciler::remote::RemoteError;
//! use resource_reconciler::{PollSpec, ResourceStatus, RetryPolicy, StatusProbe, Workflow};
//!
//! struct ServerProbe;
//!
//! #[async_trait::async_trait]
//! impl StatusProbe for ServerProbe {
//!     async fn probe(&self, id: &str) -> Result<ResourceStatus, RemoteError> {
//!         // resource-specific status read against the remote API
//!         Ok(ResourceStatus::new(id, "RUNNING"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe: Arc<dyn StatusProbe> = Arc::new(ServerProbe);
//!     let conflicts = RetryPolicy::conflicts(["1250"]);
//!
//!     let mut respec = Workflow::new("respec-server")
//!         .mutate("stop-server", conflicts.clone(), || async {
//!             // submit the pre-built stop request
//!             Ok(())
//!         })
//!         .await_status(
//!             "await-stopped",
//!             Arc::clone(&probe),
//!             "inst-1001",
//!             PollSpec::new(["RUNNING", "STOPPING"], ["STOPPED"])
//!                 .with_timeout(Duration::from_secs(600)),
//!         );
//!     respec.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod constants;
pub mod duration;
pub mod error;
pub mod poll;
pub mod remote;
pub mod retry;
pub mod status;
pub mod workflow;

pub use cache::LookupCache;
pub use classify::{classify, Classification, RetryPolicy};
pub use error::EngineError;
pub use poll::{wait_for_status, PollSpec};
pub use remote::RemoteError;
pub use retry::invoke_with_retry;
pub use status::{ResourceStatus, StatusProbe, NOT_FOUND};
pub use workflow::{Workflow, WorkflowError, WorkflowState};
