//! Baseline capture
//!
//! One fresh state read taken before any trigger runs, pinning the
//! watched attribute's value as the comparison point for convergence.

use tracing::debug;

use crate::api::ControlApi;
use crate::error::{Result, SyncError};
use crate::types::{Baseline, Credential, ResourceRef, ResourceState, WatchSpec};

/// Extract the watched attribute from a state read.
///
/// Absence is an `AttributeMissing` error: it indicates a misconfigured
/// watch spec, not a remote fault.
pub fn extract_watched<'a>(
    resource: &ResourceRef,
    watch: &WatchSpec,
    state: &'a ResourceState,
) -> Result<&'a str> {
    state
        .get(&watch.attribute)
        .ok_or_else(|| SyncError::AttributeMissing {
            resource: resource.id.clone(),
            attribute: watch.attribute.clone(),
        })
}

/// Capture the baseline value of the watched attribute.
///
/// Must complete before the trigger is issued; the synchronizer enforces
/// that ordering.
pub async fn capture_baseline<A: ControlApi + ?Sized>(
    api: &A,
    resource: &ResourceRef,
    watch: &WatchSpec,
    credential: &Credential,
) -> Result<Baseline> {
    let state = api.read_state(resource, credential).await?;
    let value = extract_watched(resource, watch, &state)?;

    debug!(
        resource = %resource.id,
        attribute = %watch.attribute,
        value = %value,
        "Captured baseline"
    );

    Ok(Baseline::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_present_attribute() {
        let resource = ResourceRef::new("proc-1");
        let watch = WatchSpec::new("last_tms");
        let state: ResourceState = [("last_tms".to_string(), "100".to_string())]
            .into_iter()
            .collect();

        assert_eq!(extract_watched(&resource, &watch, &state).unwrap(), "100");
    }

    #[test]
    fn extract_missing_attribute_is_distinct_error() {
        let resource = ResourceRef::new("proc-1");
        let watch = WatchSpec::new("last_tms");
        let state = ResourceState::default();

        match extract_watched(&resource, &watch, &state) {
            Err(SyncError::AttributeMissing {
                resource,
                attribute,
            }) => {
                assert_eq!(resource, "proc-1");
                assert_eq!(attribute, "last_tms");
            }
            other => panic!("expected AttributeMissing, got {other:?}"),
        }
    }
}
