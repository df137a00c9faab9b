//! Trigger-and-converge synchronizer
//!
//! Sequences baseline capture strictly before the trigger, then hands
//! control to the convergence poller. The ordering is structural: the
//! three phases are chained `.await`s inside one future, so there is no
//! code path where the trigger's remote effect can land before the
//! baseline read has returned. Relying on the incidental scheduling of
//! sibling tasks for this ordering is exactly the race this type exists
//! to close.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ControlApi;
use crate::baseline::capture_baseline;
use crate::client::HttpControlApi;
use crate::error::Result;
use crate::poll::await_change;
use crate::session::SessionProvider;
use crate::types::{
    ControlApiConfig, CredentialsInput, DesiredAction, PollOutcome, PollPolicy, ResourceRef,
    WatchSpec,
};

/// Orchestrates one "trigger, then converge" sequence per call.
///
/// Holds no per-operation state: each call's baseline and outcome are
/// private to that call, so one synchronizer may serve many concurrent
/// operations against distinct resources.
///
/// # Example
///
/// ```rust,no_run
/// use dataflow_sync::{
///     ControlApiConfig, CredentialsInput, DesiredAction, PollPolicy, ResourceRef, Synchronizer,
///     WatchSpec,
/// };
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sync = Synchronizer::over_http(
///     ControlApiConfig {
///         base_url: "https://cluster.example.com:9443/flow-api".into(),
///         ..Default::default()
///     },
///     CredentialsInput {
///         username: "operator".into(),
///         password: "secret".into(),
///     },
/// )?;
///
/// let _outcome = sync
///     .trigger_and_converge(
///         &ResourceRef::new("processor-id"),
///         &WatchSpec::new("last_tms"),
///         DesiredAction::Run,
///         &PollPolicy::default(),
///         &CancellationToken::new(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Synchronizer<A: ControlApi + ?Sized> {
    api: Arc<A>,
    session: SessionProvider<A>,
}

impl Synchronizer<HttpControlApi> {
    /// Synchronizer over the HTTP control API
    pub fn over_http(config: ControlApiConfig, credentials: CredentialsInput) -> Result<Self> {
        let api = Arc::new(HttpControlApi::new(config)?);
        Ok(Self::new(api, credentials))
    }
}

impl<A: ControlApi + ?Sized> Synchronizer<A> {
    pub fn new(api: Arc<A>, credentials: CredentialsInput) -> Self {
        let session = SessionProvider::new(Arc::clone(&api), credentials);
        Self { api, session }
    }

    /// Trigger an action and wait until the watched attribute changes.
    ///
    /// Step order is strict: (a) capture the baseline, (b) issue the
    /// trigger, (c) poll for convergence. A failure in (a) or (b) aborts
    /// immediately with that error and no poll attempt is made; the
    /// captured baseline is dropped with the call. `TimedOut` is a
    /// normal outcome, never conflated with a poll-phase error.
    pub async fn trigger_and_converge(
        &self,
        resource: &ResourceRef,
        watch: &WatchSpec,
        action: DesiredAction,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        // Credential resolution first: a rejected login fails the
        // operation before any resource read happens
        let credential = self.session.current().await?;

        // (a) baseline capture, completed and held before the trigger
        let baseline = capture_baseline(&*self.api, resource, watch, &credential).await?;

        // (b) trigger
        let ack = self
            .api
            .apply_action(resource, action, &credential)
            .await?;
        info!(
            resource = %resource.id,
            action = %action,
            run_status = %ack.run_status,
            "Action accepted, awaiting convergence"
        );

        // (c) convergence poll
        let outcome = await_change(
            &*self.api,
            resource,
            watch,
            &baseline,
            &credential,
            policy,
            cancel,
        )
        .await?;

        debug!(resource = %resource.id, outcome = ?outcome, "Synchronization finished");
        Ok(outcome)
    }
}
