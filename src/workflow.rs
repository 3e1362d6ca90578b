//! # Workflows
//!
//! Ordered mutate/await sequences for multi-step resource operations: detach
//! before resize before reattach, stop before respec before start, add new
//! rules before removing old ones.
//!
//! Steps run strictly in declaration order, each settling fully before the
//! next begins. The first failure aborts the remainder and reports the step
//! it occurred in. There is no rollback: a failed sequence leaves the
//! resource in whatever intermediate state the remote system last reached,
//! and the caller builds a fresh workflow against that state.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::classify::RetryPolicy;
use crate::error::EngineError;
use crate::poll::{wait_for_status, PollSpec};
use crate::remote::RemoteError;
use crate::retry::invoke_with_retry;
use crate::status::StatusProbe;

type MutateOp = Box<dyn FnMut() -> BoxFuture<'static, Result<(), RemoteError>> + Send>;

enum Step {
    Mutate {
        label: String,
        policy: RetryPolicy,
        op: MutateOp,
    },
    AwaitStatus {
        label: String,
        probe: Arc<dyn StatusProbe>,
        id: String,
        spec: PollSpec,
    },
}

impl Step {
    fn label(&self) -> &str {
        match self {
            Self::Mutate { label, .. } | Self::AwaitStatus { label, .. } => label,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutate { label, .. } => f.debug_struct("Mutate").field("label", label).finish(),
            Self::AwaitStatus { label, id, .. } => f
                .debug_struct("AwaitStatus")
                .field("label", label)
                .field("id", id)
                .finish(),
        }
    }
}

/// Progress of one workflow instance.
///
/// `Succeeded` and `Failed` are final; a workflow never runs twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    NotStarted,
    Running { step: usize },
    Succeeded,
    Failed { step: usize },
}

/// Failure of a workflow run, tagged with the step it occurred in.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A step failed; later steps never ran
    #[error("workflow '{workflow}' failed at step {index} ({label}): {source}")]
    StepFailed {
        workflow: String,
        index: usize,
        label: String,
        #[source]
        source: EngineError,
    },

    /// The instance already ran to a terminal state
    ///
    /// The remote state has moved since the steps were captured; build a
    /// fresh workflow reflecting it instead of rerunning this one.
    #[error("workflow '{workflow}' already ran (state {state:?}); build a new instance")]
    NotResumable {
        workflow: String,
        state: WorkflowState,
    },
}

impl WorkflowError {
    /// The engine failure behind a step failure, if this is one
    #[must_use]
    pub fn step_source(&self) -> Option<&EngineError> {
        match self {
            Self::StepFailed { source, .. } => Some(source),
            Self::NotResumable { .. } => None,
        }
    }
}

/// Ordered sequence of mutate and await-status steps.
///
/// Built once, run once. Steps execute strictly sequentially with no
/// pipelining; each step is timed by its own policy or spec, and the
/// workflow imposes no aggregate ceiling beyond the sum of its steps'.
pub struct Workflow {
    name: String,
    steps: Vec<Step>,
    state: WorkflowState,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            state: WorkflowState::NotStarted,
        }
    }

    /// Append a mutating step retried under `policy`.
    ///
    /// The op captures its pre-built request; it must be safe to reissue.
    #[must_use]
    pub fn mutate<F, Fut>(mut self, label: impl Into<String>, policy: RetryPolicy, mut op: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        self.steps.push(Step::Mutate {
            label: label.into(),
            policy,
            op: Box::new(move || op().boxed()),
        });
        self
    }

    /// Append a step waiting for `id` to reach `spec`'s target status.
    #[must_use]
    pub fn await_status(
        mut self,
        label: impl Into<String>,
        probe: Arc<dyn StatusProbe>,
        id: impl Into<String>,
        spec: PollSpec,
    ) -> Self {
        self.steps.push(Step::AwaitStatus {
            label: label.into(),
            probe,
            id: id.into(),
            spec,
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in declaration order.
    ///
    /// Returns on the first failing step with the failure verbatim, tagged
    /// with the step index and label. No compensation is attempted for steps
    /// that already completed.
    pub async fn run(&mut self) -> Result<(), WorkflowError> {
        if self.state != WorkflowState::NotStarted {
            return Err(WorkflowError::NotResumable {
                workflow: self.name.clone(),
                state: self.state,
            });
        }

        for index in 0..self.steps.len() {
            self.state = WorkflowState::Running { step: index };
            let step = &mut self.steps[index];
            debug!(workflow = %self.name, index, label = %step.label(), "running step");

            let result = match step {
                Step::Mutate { policy, op, .. } => invoke_with_retry(|| op(), policy).await,
                Step::AwaitStatus {
                    probe, id, spec, ..
                } => wait_for_status(probe.as_ref(), id, spec).await.map(|_| ()),
            };

            if let Err(source) = result {
                self.state = WorkflowState::Failed { step: index };
                return Err(WorkflowError::StepFailed {
                    workflow: self.name.clone(),
                    index,
                    label: self.steps[index].label().to_string(),
                    source,
                });
            }
        }

        self.state = WorkflowState::Succeeded;
        debug!(workflow = %self.name, steps = self.steps.len(), "workflow succeeded");
        Ok(())
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("state", &self.state)
            .finish()
    }
}
