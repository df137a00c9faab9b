//! Convergence poller
//!
//! Re-reads processor state until the watched attribute moves away from
//! the captured baseline or the attempt budget elapses. Every wait is
//! raced against the caller's cancellation token so a shutdown interrupts
//! the loop within one poll interval.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ControlApi;
use crate::baseline::extract_watched;
use crate::error::{Result, SyncError};
use crate::types::{Baseline, Credential, PollOutcome, PollPolicy, ResourceRef, WatchSpec};

/// Poll until the watched attribute differs from the baseline.
///
/// Returns [`PollOutcome::Converged`] with the new value and the number
/// of attempts taken, or [`PollOutcome::TimedOut`] once `max_attempts`
/// reads have observed no change. A read failure during polling is
/// retried up to `transient_retries` times before surfacing; it counts
/// neither as convergence nor as timeout.
pub async fn await_change<A: ControlApi + ?Sized>(
    api: &A,
    resource: &ResourceRef,
    watch: &WatchSpec,
    baseline: &Baseline,
    credential: &Credential,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<PollOutcome> {
    debug_assert!(policy.max_attempts > 0, "poll budget must be bounded");

    let mut attempts: u32 = 0;
    let mut last_value = baseline.value().to_string();

    while attempts < policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let state = read_with_transient_retry(api, resource, credential, policy, cancel).await?;
        attempts += 1;

        let current = extract_watched(resource, watch, &state)?;
        if current != baseline.value() {
            debug!(
                resource = %resource.id,
                attribute = %watch.attribute,
                value = %current,
                attempts,
                "Convergence observed"
            );
            return Ok(PollOutcome::Converged {
                value: current.to_string(),
                attempts,
            });
        }

        last_value = current.to_string();
        debug!(
            resource = %resource.id,
            attribute = %watch.attribute,
            attempts,
            budget = policy.max_attempts,
            "No change yet, waiting"
        );

        if attempts < policy.max_attempts {
            sleep_or_cancel(policy.poll_interval, cancel).await?;
        }
    }

    Ok(PollOutcome::TimedOut {
        last_value,
        attempts,
    })
}

/// One poll-attempt read, retrying transient failures a fixed number of
/// times before surfacing the error
async fn read_with_transient_retry<A: ControlApi + ?Sized>(
    api: &A,
    resource: &ResourceRef,
    credential: &Credential,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<crate::types::ResourceState> {
    let mut tries: u32 = 0;

    loop {
        match api.read_state(resource, credential).await {
            Ok(state) => return Ok(state),
            Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
            Err(e) if tries < policy.transient_retries => {
                tries += 1;
                warn!(
                    resource = %resource.id,
                    error = %e,
                    retry = tries,
                    retries = policy.transient_retries,
                    "Transient read failure during poll, retrying"
                );
                sleep_or_cancel(policy.transient_retry_delay, cancel).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Sleep that a cancellation interrupts promptly
async fn sleep_or_cancel(duration: std::time::Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
