//! Admission gate
//!
//! Every webhook and library request passes the allowlist first and the
//! rate limiter second, so traffic rejected by the allowlist never spends
//! rate-limit budget.

mod middleware;

use std::net::IpAddr;
use std::time::Instant;

use crate::allowlist::AllowlistSpec;
use crate::prelude::*;
use crate::rate_limit::{RateLimiter, WINDOW};
use crate::settings::Settings;

pub use middleware::{AdmissionLayer, AdmissionService};

#[derive(Debug)]
pub struct AdmissionPipeline {
	/// Parsed allowlist, or the configuration error it produced
	allowlist: Result<AllowlistSpec, String>,
	limiter: RateLimiter,
	limit_per_minute: u32,
}

impl AdmissionPipeline {
	pub fn new(allowlist: ClResult<AllowlistSpec>, limit_per_minute: u32) -> Self {
		Self {
			allowlist: allowlist.map_err(|err| err.to_string()),
			limiter: RateLimiter::new(),
			limit_per_minute,
		}
	}

	/// Build from settings. An invalid allowlist is logged here and reported
	/// on every gated request, it never falls back to "unrestricted".
	pub fn from_settings(settings: &Settings) -> Self {
		let allowlist = AllowlistSpec::parse(&settings.allowlist);
		match &allowlist {
			Ok(spec) if spec.is_empty() => info!("Allowlist: disabled"),
			Ok(spec) => info!("Allowlist: {} entries", spec.len()),
			Err(err) => error!("Allowlist configuration error, gated requests will fail: {}", err),
		}
		if settings.rate_limit_per_minute > 0 {
			info!("Rate limit: {} requests per minute per source", settings.rate_limit_per_minute);
		}
		Self::new(allowlist, settings.rate_limit_per_minute)
	}

	/// Decide whether a caller may proceed
	pub fn admit(&self, client_addr: Option<IpAddr>) -> ClResult<()> {
		let allowlist = self.allowlist.as_ref().map_err(|msg| Error::InvalidConfig(msg.clone()))?;
		if !allowlist.permits(client_addr) {
			return Err(Error::Forbidden);
		}

		let source = client_addr.map_or_else(|| "unknown".to_string(), |addr| addr.to_string());
		if !self.limiter.check(&source, self.limit_per_minute) {
			return Err(Error::RateLimited { retry_after: WINDOW });
		}

		Ok(())
	}

	/// Drop rate-limit state for idle sources
	pub fn sweep(&self) -> usize {
		self.limiter.sweep(Instant::now())
	}

	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}
}


// vim: ts=4
