//! # Retrying Invoker
//!
//! Reissues one mutating call while the remote control plane reports a
//! transient conflict. A rejection with a whitelisted code is slept on and
//! reissued until the policy's time budget runs out; anything else surfaces
//! on the spot.

use std::future::Future;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::classify::{classify, Classification, RetryPolicy};
use crate::error::EngineError;
use crate::remote::RemoteError;

/// Invoke `op`, retrying transient conflicts under `policy`.
///
/// `op` is called at least once and reissued as long as its failure
/// classifies as retryable and the elapsed time is under
/// `policy.max_elapsed`. The request must be safe to reissue; the engine
/// assumes idempotent mutations and does not enforce this.
///
/// The first non-retryable failure, and the first retryable failure past the
/// budget, return as [`EngineError::Remote`] verbatim.
pub async fn invoke_with_retry<T, F, Fut>(mut op: F, policy: &RetryPolicy) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 1;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if classify(&err, &policy.retryable_codes) == Classification::Fatal {
            return Err(EngineError::Remote(err));
        }

        if started.elapsed() >= policy.max_elapsed {
            debug!(attempt, code = ?err.code(), "retry budget exhausted");
            return Err(EngineError::Remote(err));
        }

        debug!(attempt, code = ?err.code(), "transient conflict, reissuing after delay");
        attempt += 1;
        sleep(policy.delay).await;
    }
}
