//! Control-plane abstraction
//!
//! The synchronizer core is wire-agnostic: everything it needs from the
//! remote control API goes through [`ControlApi`]. The HTTP implementation
//! lives in [`crate::client`]; tests inject fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ActionAck, Credential, CredentialsInput, DesiredAction, ResourceRef, ResourceState,
};

/// Remote control API for a dataflow processor.
///
/// Every call carries the credential by reference; implementations must
/// not cache state reads — the convergence poller depends on each read
/// being fresh.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Exchange raw credentials for a bearer token.
    ///
    /// Fails with `Auth` on bad credentials, network failure, or any
    /// non-2xx response. Never retries internally; retry policy belongs
    /// to the caller.
    async fn acquire_token(&self, credentials: &CredentialsInput) -> Result<Credential>;

    /// Fetch the current observable state of a processor.
    async fn read_state(
        &self,
        resource: &ResourceRef,
        credential: &Credential,
    ) -> Result<ResourceState>;

    /// Issue a state-changing command against a processor.
    ///
    /// Acceptance is fire-and-forget with respect to convergence: a
    /// successful ack confirms the command only, not that the observable
    /// attributes have changed yet.
    async fn apply_action(
        &self,
        resource: &ResourceRef,
        action: DesiredAction,
        credential: &Credential,
    ) -> Result<ActionAck>;
}
