//! Types for the control API and the synchronizer

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Client configuration
///
/// All connection parameters are explicit values passed in by the host;
/// the crate holds no process-wide configuration.
#[derive(Debug, Clone)]
pub struct ControlApiConfig {
    /// Base URL for the control API (e.g., `https://cluster:9443/flow-api`)
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Assumed token lifetime in seconds; `None` means the token is
    /// treated as valid until the remote rejects it
    pub token_ttl_secs: Option<u64>,
}

impl Default for ControlApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            token_ttl_secs: None,
        }
    }
}

/// Raw credentials submitted to the token endpoint
#[derive(Clone)]
pub struct CredentialsInput {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsInput")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token for the control API
///
/// Treated as a capability value: the token is never logged and the
/// `Debug` impl redacts it. Passed by reference to every remote call.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Option<Instant>,
}

impl Credential {
    pub fn new(token: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            token: token.into(),
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    /// The raw bearer token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the token's assumed lifetime has elapsed
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Identifies one remote processor
///
/// The base endpoint lives in [`ControlApiConfig`]; the id is opaque to
/// this crate. Immutable for the lifetime of one synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: String,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Observable state of a remote processor
///
/// A flat attribute map. The shape is not assumed complete or stable;
/// callers read only the attributes they declare interest in.
#[derive(Debug, Clone, Default)]
pub struct ResourceState {
    attributes: HashMap<String, String>,
}

impl ResourceState {
    pub fn new(attributes: HashMap<String, String>) -> Self {
        Self { attributes }
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<(String, String)> for ResourceState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// The attribute observed for convergence
///
/// Comparison is raw string inequality; no semantic parsing of the
/// watched value is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    pub attribute: String,
}

impl WatchSpec {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

/// The watched attribute's value captured before the trigger
///
/// Captured exactly once, immutable, private to one synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    value: String,
}

impl Baseline {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// State-changing command supported by the remote processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredAction {
    /// Start the processor (wire value `RUNNING`)
    Run,
    /// Stop the processor (wire value `STOPPED`)
    Halt,
}

impl DesiredAction {
    pub fn wire_value(&self) -> &'static str {
        match self {
            DesiredAction::Run => "RUNNING",
            DesiredAction::Halt => "STOPPED",
        }
    }
}

impl std::fmt::Display for DesiredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// Acknowledgment of an accepted run-state command
///
/// Acceptance confirms the command only; it says nothing about whether
/// the processor's observable attributes have changed yet.
#[derive(Debug, Clone)]
pub struct ActionAck {
    /// Run status declared by the remote after accepting the command
    pub run_status: String,
    /// Component revision after the update
    pub revision_version: i64,
}

/// Bounds and pacing for the convergence poll
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Sleep between poll attempts
    pub poll_interval: Duration,
    /// Maximum number of state reads before giving up.
    /// The budget is mandatory; unbounded polling is a defect.
    pub max_attempts: u32,
    /// Additional tries after a failed read within one attempt
    pub transient_retries: u32,
    /// Sleep before each transient retry
    pub transient_retry_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_attempts: 40,
            transient_retries: 2,
            transient_retry_delay: Duration::from_secs(1),
        }
    }
}

/// Result of one convergence wait
///
/// Both variants are normal outcomes; failures surface as
/// [`SyncError`](crate::SyncError) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The watched attribute moved away from the baseline
    Converged { value: String, attempts: u32 },
    /// The attempt budget elapsed with the watched attribute unchanged
    TimedOut { last_value: String, attempts: u32 },
}
