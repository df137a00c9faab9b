//! Session provider for the control API
//!
//! Holds the current bearer token and refreshes it under a single-writer
//! discipline: one refresh in flight at a time, concurrent callers that
//! find a stale-but-valid token simply reuse it.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::ControlApi;
use crate::error::Result;
use crate::types::{Credential, CredentialsInput};

/// Acquires and caches the control API credential
pub struct SessionProvider<A: ControlApi + ?Sized> {
    api: Arc<A>,
    credentials: CredentialsInput,
    current: Mutex<Option<Credential>>,
}

impl<A: ControlApi + ?Sized> SessionProvider<A> {
    pub fn new(api: Arc<A>, credentials: CredentialsInput) -> Self {
        Self {
            api,
            credentials,
            current: Mutex::new(None),
        }
    }

    /// The current credential, acquiring or refreshing it if needed.
    ///
    /// The mutex serializes refreshes; a caller that loses the race to a
    /// concurrent refresh observes the fresh token instead of issuing a
    /// second token request. Acquisition failures surface as `Auth`
    /// without internal retry.
    pub async fn current(&self) -> Result<Credential> {
        let mut slot = self.current.lock().await;

        if let Some(credential) = slot.as_ref() {
            if !credential.is_expired() {
                return Ok(credential.clone());
            }
            debug!("Cached credential expired, refreshing");
        }

        let credential = self.api.acquire_token(&self.credentials).await?;
        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential; the next call acquires a fresh one
    pub async fn invalidate(&self) {
        let mut slot = self.current.lock().await;
        *slot = None;
    }
}
