//! App state type

use std::sync::Arc;

use jellyhook_types::media_adapter::MediaServerAdapter;

use crate::admission::AdmissionPipeline;
use crate::scheduler::RefreshScheduler;
use crate::settings::Settings;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the caller address of an inbound request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAddrMode {
	/// TCP peer address
	Direct,
	/// Forwarding headers set by a reverse proxy, falling back to the peer
	Proxy,
}

impl ClientAddrMode {
	pub fn from_settings(settings: &Settings) -> Self {
		if settings.trust_proxy_headers { ClientAddrMode::Proxy } else { ClientAddrMode::Direct }
	}
}

pub struct AppState {
	pub settings: Settings,
	pub scheduler: Arc<RefreshScheduler>,
	pub admission: Arc<AdmissionPipeline>,
	pub media_adapter: Arc<dyn MediaServerAdapter>,
}

impl AppState {
	/// Default target from `JELLYFIN_URL` / `JELLYFIN_API_KEY`
	pub fn default_url(&self) -> Option<&str> {
		self.settings.jellyfin_url.as_deref()
	}

	pub fn default_api_key(&self) -> Option<&str> {
		self.settings.jellyfin_api_key.as_deref()
	}
}

pub type App = Arc<AppState>;

// vim: ts=4
