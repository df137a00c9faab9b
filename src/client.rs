//! HTTP implementation of the control API
//!
//! Targets a NiFi-style REST control plane: bearer tokens from
//! `/access/token`, component state from `/processors/{id}/state`, and
//! run-state changes via a revisioned PUT to
//! `/processors/{id}/run-status`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::api::ControlApi;
use crate::error::{Result, SyncError};
use crate::types::{
    ActionAck, ControlApiConfig, Credential, CredentialsInput, DesiredAction, ResourceRef,
    ResourceState,
};

/// HTTP client for the processor control API
///
/// # Example
///
/// ```rust,no_run
/// use dataflow_sync::{ControlApiConfig, HttpControlApi};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = HttpControlApi::new(ControlApiConfig {
///     base_url: "https://cluster.example.com:9443/flow-api".into(),
///     ..Default::default()
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct HttpControlApi {
    config: ControlApiConfig,
    client: Client,
}

impl HttpControlApi {
    /// Create a new control API client
    pub fn new(config: ControlApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn processor_url(&self, resource: &ResourceRef) -> String {
        format!(
            "{}/processors/{}",
            self.config.base_url,
            urlencoding::encode(&resource.id)
        )
    }

    /// Fetch the processor entity, primarily for its current revision
    async fn get_processor(
        &self,
        resource: &ResourceRef,
        credential: &Credential,
    ) -> Result<ProcessorEntity> {
        let response = self
            .client
            .get(self.processor_url(resource))
            .bearer_auth(credential.token())
            .send()
            .await?;

        handle_response(response, resource).await
    }
}

#[async_trait]
impl ControlApi for HttpControlApi {
    async fn acquire_token(&self, credentials: &CredentialsInput) -> Result<Credential> {
        let url = format!("{}/access/token", self.config.base_url);
        debug!(username = %credentials.username, "Requesting access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SyncError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        // The token endpoint returns the bearer token as plain text
        let token = response
            .text()
            .await
            .map_err(|e| SyncError::Auth(format!("failed to read token body: {e}")))?;

        let ttl = self.config.token_ttl_secs.map(Duration::from_secs);
        Ok(Credential::new(token.trim(), ttl))
    }

    async fn read_state(
        &self,
        resource: &ResourceRef,
        credential: &Credential,
    ) -> Result<ResourceState> {
        let url = format!("{}/state", self.processor_url(resource));

        // Always a fresh remote read; the poller depends on this
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await?;

        let body: ProcessorStateResponse = handle_response(response, resource).await?;

        debug!(
            resource = %resource.id,
            entries = body.component_state.entry_count(),
            "Read processor state"
        );

        Ok(body.component_state.into_resource_state())
    }

    async fn apply_action(
        &self,
        resource: &ResourceRef,
        action: DesiredAction,
        credential: &Credential,
    ) -> Result<ActionAck> {
        // The run-status endpoint requires the component's current revision
        let entity = self.get_processor(resource, credential).await?;

        let url = format!("{}/run-status", self.processor_url(resource));
        let request = RunStatusRequest {
            revision: entity.revision,
            state: action.wire_value().to_string(),
            disconnected_node_acknowledged: false,
        };

        debug!(resource = %resource.id, action = %action, "Submitting run-status change");

        let response = self
            .client
            .put(&url)
            .json(&request)
            .bearer_auth(credential.token())
            .send()
            .await?;

        let entity: ProcessorEntity = handle_response(response, resource).await?;

        Ok(ActionAck {
            run_status: entity
                .component
                .and_then(|c| c.state)
                .unwrap_or_else(|| action.wire_value().to_string()),
            revision_version: entity.revision.version,
        })
    }
}

/// Classify a non-2xx response into the error taxonomy, or deserialize
/// the body on success
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    resource: &ResourceRef,
) -> Result<T> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Auth(format!("{}: {body}", status.as_u16())));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(resource.id.clone()));
    }

    if status == StatusCode::CONFLICT {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Conflict(body));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Transport(format!(
            "HTTP {}: {body}",
            status.as_u16()
        )));
    }

    Ok(response.json().await?)
}

// ==================== Wire types ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorStateResponse {
    component_state: ComponentState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentState {
    #[serde(default)]
    local_state: Option<StateMap>,
    #[serde(default)]
    cluster_state: Option<StateMap>,
}

impl ComponentState {
    fn entry_count(&self) -> usize {
        self.local_state.as_ref().map_or(0, |s| s.state.len())
            + self.cluster_state.as_ref().map_or(0, |s| s.state.len())
    }

    /// Flatten local and cluster scopes into one attribute map.
    /// Cluster entries win when a key appears in both scopes.
    fn into_resource_state(self) -> ResourceState {
        self.local_state
            .into_iter()
            .chain(self.cluster_state)
            .flat_map(|scope| scope.state)
            .map(|entry| (entry.key, entry.value))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct StateMap {
    #[serde(default)]
    state: Vec<StateEntry>,
}

#[derive(Debug, Deserialize)]
struct StateEntry {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorEntity {
    revision: Revision,
    #[serde(default)]
    component: Option<ProcessorComponent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    version: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessorComponent {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunStatusRequest {
    revision: Revision,
    state: String,
    disconnected_node_acknowledged: bool,
}
