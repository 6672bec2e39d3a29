//! Rate Limiting
//!
//! Per-source sliding-window admission counter and the client address
//! extraction it keys on.

mod extractors;
mod limiter;

pub use extractors::extract_client_ip;
pub use limiter::{RateLimiter, WINDOW};

// vim: ts=4
