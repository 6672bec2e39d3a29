//! jellyhook relays Radarr and Sonarr notifications to Jellyfin.
//!
//! # Features
//!
//! - Webhook endpoints for Radarr and Sonarr
//! - Library selection by id or by collection type
//! - Coalescing of refresh bursts per Jellyfin server
//!     - debounce, reset by every request
//!     - max-wait ceiling since the first request of a burst
//! - Admission control
//!     - network allowlist
//!     - per-source rate limit

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and adapter traits
pub use jellyhook_types::error;
pub use jellyhook_types::media_adapter;
pub use jellyhook_types::types;

// Feature crate re-exports
pub use jellyhook_core::admission;
pub use jellyhook_core::scheduler;
pub use jellyhook_core::settings;
pub use jellyhook_webhook as webhook;

// Local modules
pub mod app;
pub mod prelude;
pub mod routes;
pub mod webserver;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
