//! # Constants
//!
//! Shared defaults used throughout the engine.
//!
//! These values represent reasonable defaults and can be overridden per
//! operation through [`PollSpec`](crate::poll::PollSpec) and
//! [`RetryPolicy`](crate::classify::RetryPolicy).

use std::time::Duration;

/// Default delay before the first status probe of a wait
///
/// Mutations are accepted before they are visible to reads; probing
/// immediately after submit mostly burns a request on a stale answer.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Default interval between status probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default ceiling on a single wait-for-status operation
///
/// Server and storage provisioning routinely take minutes; 30 minutes covers
/// the slowest observed operations with headroom.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default delay between attempts of a conflicted mutation
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default ceiling on retrying one conflicted mutation
pub const DEFAULT_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(5 * 60);

/// Code the remote API reports for unclassified internal failures
///
/// Some call sites opt into retrying this code via
/// [`RetryPolicy::broad`](crate::classify::RetryPolicy::broad); it is never
/// retried implicitly.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";
