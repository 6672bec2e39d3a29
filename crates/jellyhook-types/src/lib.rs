//! Shared types, adapter traits, and the error type for jellyhook.
//!
//! Everything the admission, scheduling and webhook crates agree on lives
//! here so that media server adapters only depend on this crate.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod media_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
