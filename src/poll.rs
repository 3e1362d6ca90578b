//! # Status Polling
//!
//! Waits for a resource to settle into a target status. This is the single
//! wait primitive behind create, delete, attach and respec flows; callers
//! describe the transition with a [`PollSpec`] instead of hand-rolling a
//! sleep loop per resource file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use crate::error::EngineError;
use crate::status::{ResourceStatus, StatusProbe};

/// Description of one awaited status transition.
///
/// `pending` holds the transitional codes the resource may report while the
/// operation settles; `target` holds the codes that count as settled. The two
/// sets must be disjoint. A probe answer outside both sets fails the wait
/// immediately: an unknown state means a modeling gap or an out-of-band
/// change, and polling through it would only hide that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    /// Transitional codes to keep waiting on
    pub pending: BTreeSet<String>,

    /// Codes that count as settled
    pub target: BTreeSet<String>,

    /// Hard ceiling on the whole wait, initial delay included
    #[serde(with = "crate::duration::compact", default = "default_timeout")]
    pub timeout: Duration,

    /// Delay before the first probe
    #[serde(with = "crate::duration::compact", default = "default_initial_delay")]
    pub initial_delay: Duration,

    /// Delay between probes
    #[serde(with = "crate::duration::compact", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_POLL_TIMEOUT
}

fn default_initial_delay() -> Duration {
    DEFAULT_INITIAL_DELAY
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

impl PollSpec {
    /// Spec with the default timing knobs.
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let spec = Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_POLL_TIMEOUT,
            initial_delay: DEFAULT_INITIAL_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        debug_assert!(
            spec.pending.is_disjoint(&spec.target),
            "pending and target status sets must be disjoint"
        );
        spec
    }

    /// Replace the wait ceiling
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the delay before the first probe
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Replace the delay between probes
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Wait until `id` reaches a status in `spec.target`.
///
/// Sleeps `initial_delay`, then probes at `poll_interval` until the reported
/// code lands in the target set. Only the status value is polled: a probe
/// call failure aborts the wait immediately. A code outside both sets fails
/// with [`EngineError::UnexpectedState`] without further probes, and the
/// timeout failure carries the last observed status.
///
/// Dropping the returned future abandons the wait but cannot abort a remote
/// call already in flight.
pub async fn wait_for_status(
    probe: &dyn StatusProbe,
    id: &str,
    spec: &PollSpec,
) -> Result<ResourceStatus, EngineError> {
    let started = Instant::now();

    if !spec.initial_delay.is_zero() {
        sleep(spec.initial_delay).await;
    }

    loop {
        let status = probe.probe(id).await?;
        let code = status.effective_code();

        if spec.target.contains(code) {
            debug!(id, code, "resource settled");
            return Ok(status);
        }

        if !spec.pending.contains(code) {
            return Err(EngineError::UnexpectedState {
                last: status,
                pending: spec.pending.clone(),
                target: spec.target.clone(),
            });
        }

        let waited = started.elapsed();
        if waited >= spec.timeout {
            return Err(EngineError::Timeout {
                waited,
                last: status,
            });
        }

        trace!(id, code, waited_secs = waited.as_secs(), "still pending");
        sleep(spec.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::status::NOT_FOUND;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Probe that replays a scripted sequence of answers, then repeats the
    /// final answer forever.
    struct ScriptedProbe {
        script: Mutex<VecDeque<Result<ResourceStatus, RemoteError>>>,
        repeat: Result<ResourceStatus, RemoteError>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(
            script: Vec<Result<ResourceStatus, RemoteError>>,
            repeat: Result<ResourceStatus, RemoteError>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into()),
                repeat,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusProbe for ScriptedProbe {
        async fn probe(&self, _id: &str) -> Result<ResourceStatus, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.repeat.clone())
        }
    }

    fn quick_spec(pending: &[&str], target: &[&str]) -> PollSpec {
        PollSpec::new(pending.iter().copied(), target.iter().copied())
            .with_initial_delay(Duration::ZERO)
            .with_poll_interval(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_after_pending_states() {
        let pending = || Ok(ResourceStatus::new("inst-1", "CREATING"));
        let probe = ScriptedProbe::new(
            vec![pending(), pending(), pending()],
            Ok(ResourceStatus::new("inst-1", "RUNNING")),
        );
        let spec = quick_spec(&["CREATING"], &["RUNNING"]);

        let started = Instant::now();
        let status = wait_for_status(&probe, "inst-1", &spec).await.expect("settles");

        assert_eq!(status.code, "RUNNING");
        assert_eq!(probe.calls(), 4);
        // Three pending answers mean three poll-interval sleeps.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_runs_before_first_probe() {
        let probe = ScriptedProbe::new(vec![], Ok(ResourceStatus::new("inst-1", "RUNNING")));
        let spec = quick_spec(&["CREATING"], &["RUNNING"]).with_initial_delay(Duration::from_secs(5));

        let started = Instant::now();
        wait_for_status(&probe, "inst-1", &spec).await.expect("settles");

        assert_eq!(probe.calls(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_budget_not_before() {
        let probe = ScriptedProbe::new(vec![], Ok(ResourceStatus::new("inst-1", "CREATING")));
        let spec = quick_spec(&["CREATING"], &["RUNNING"]).with_timeout(Duration::from_secs(3));

        let started = Instant::now();
        let err = wait_for_status(&probe, "inst-1", &spec).await.expect_err("times out");

        match err {
            EngineError::Timeout { waited, last } => {
                assert_eq!(waited, Duration::from_secs(3));
                assert_eq!(last.code, "CREATING");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // Probes at t=0,1,2 ride out the budget; the probe at t=3 trips it.
        assert_eq!(probe.calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_state_fails_fast() {
        let probe = ScriptedProbe::new(vec![], Ok(ResourceStatus::new("inst-1", "ERROR")));
        let spec = quick_spec(&["CREATING"], &["RUNNING"]);

        let started = Instant::now();
        let err = wait_for_status(&probe, "inst-1", &spec).await.expect_err("fails");

        match err {
            EngineError::UnexpectedState { last, .. } => assert_eq!(last.code, "ERROR"),
            other => panic!("expected unexpected-state, got {other:?}"),
        }
        // Fails on the first probe with zero additional sleeps.
        assert_eq!(probe.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_as_target_for_delete_wait() {
        let probe = ScriptedProbe::new(
            vec![Ok(ResourceStatus::new("vol-9", "TERMINATING"))],
            Ok(ResourceStatus::missing("vol-9")),
        );
        let spec = quick_spec(&["TERMINATING"], &[NOT_FOUND]);

        let status = wait_for_status(&probe, "vol-9", &spec).await.expect("settles");
        assert!(!status.exists);
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_in_pending_rides_out_read_lag() {
        let probe = ScriptedProbe::new(
            vec![Ok(ResourceStatus::missing("inst-1"))],
            Ok(ResourceStatus::new("inst-1", "RUNNING")),
        );
        let spec = quick_spec(&[NOT_FOUND, "CREATING"], &["RUNNING"]);

        let status = wait_for_status(&probe, "inst-1", &spec).await.expect("settles");
        assert_eq!(status.code, "RUNNING");
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_aborts_immediately() {
        let probe = ScriptedProbe::new(
            vec![],
            Err(RemoteError::api("5001", "backend unavailable")),
        );
        let spec = quick_spec(&["CREATING"], &["RUNNING"]);

        let started = Instant::now();
        let err = wait_for_status(&probe, "inst-1", &spec).await.expect_err("fails");

        assert_eq!(
            err,
            EngineError::Remote(RemoteError::api("5001", "backend unavailable"))
        );
        assert_eq!(probe.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: PollSpec = serde_json::from_str(
            r#"{"pending": ["CREATING"], "target": ["RUNNING"]}"#,
        )
        .expect("deserializes");
        assert_eq!(spec.timeout, DEFAULT_POLL_TIMEOUT);
        assert_eq!(spec.initial_delay, DEFAULT_INITIAL_DELAY);
        assert_eq!(spec.poll_interval, DEFAULT_POLL_INTERVAL);

        let spec: PollSpec = serde_json::from_str(
            r#"{"pending": [], "target": ["RUNNING"], "timeout": "10m", "initial_delay": "1s", "poll_interval": "2s"}"#,
        )
        .expect("deserializes");
        assert_eq!(spec.timeout, Duration::from_secs(600));
        assert_eq!(spec.initial_delay, Duration::from_secs(1));
        assert_eq!(spec.poll_interval, Duration::from_secs(2));
    }
}
