//! Trigger-and-wait synchronizer for remote dataflow processors
//!
//! Coordinates a stateful processor reachable only through an
//! authenticated HTTP control API: capture the current value of one
//! watched attribute, trigger a run-state change, then poll until the
//! attribute moves away from its baseline or a bounded attempt budget
//! elapses.
//!
//! # Example
//!
//! ```rust,no_run
//! use dataflow_sync::{
//!     ControlApiConfig, CredentialsInput, DesiredAction, PollOutcome, PollPolicy, ResourceRef,
//!     Synchronizer, WatchSpec,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sync = Synchronizer::over_http(
//!     ControlApiConfig {
//!         base_url: "https://cluster.example.com:9443/flow-api".into(),
//!         ..Default::default()
//!     },
//!     CredentialsInput {
//!         username: "operator".into(),
//!         password: "secret".into(),
//!     },
//! )?;
//!
//! let cancel = CancellationToken::new();
//! let outcome = sync
//!     .trigger_and_converge(
//!         &ResourceRef::new("processor-id"),
//!         &WatchSpec::new("last_tms"),
//!         DesiredAction::Run,
//!         &PollPolicy::default(),
//!         &cancel,
//!     )
//!     .await?;
//!
//! match outcome {
//!     PollOutcome::Converged { value, attempts } => {
//!         println!("updated to {value} after {attempts} reads");
//!     }
//!     PollOutcome::TimedOut { last_value, attempts } => {
//!         println!("still {last_value} after {attempts} reads");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod baseline;
pub mod client;
pub mod error;
pub mod poll;
pub mod session;
pub mod sync;
pub mod types;

// Re-export main types
pub use api::ControlApi;
pub use baseline::capture_baseline;
pub use client::HttpControlApi;
pub use error::{Result, SyncError};
pub use poll::await_change;
pub use session::SessionProvider;
pub use sync::Synchronizer;
pub use types::*;
