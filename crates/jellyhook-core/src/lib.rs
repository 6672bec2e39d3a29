//! Core infrastructure for jellyhook.
//!
//! Holds the pieces every inbound request passes through before a refresh
//! reaches the media server: settings, the admission gate (allowlist and
//! per-source rate limiting) and the coalescing refresh scheduler.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod allowlist;
pub mod app;
pub mod prelude;
pub mod rate_limit;
pub mod scheduler;
pub mod settings;

// Re-export commonly used types
pub use admission::{AdmissionLayer, AdmissionPipeline};
pub use allowlist::AllowlistSpec;
pub use app::{App, AppState, ClientAddrMode, VERSION};
pub use scheduler::{EnqueueOutcome, RefreshScheduler};
pub use settings::Settings;

// vim: ts=4
