//! App builder - constructs and runs the jellyhook application

use std::sync::Arc;

use axum::Router;

use crate::prelude::*;
use crate::{routes, webserver};
pub use jellyhook_core::app::{App, AppState, ClientAddrMode, VERSION};
use jellyhook_core::admission::AdmissionPipeline;
use jellyhook_core::rate_limit::WINDOW;
use jellyhook_core::scheduler::RefreshScheduler;
use jellyhook_core::settings::{self, Settings};
use jellyhook_types::media_adapter::{MediaServerAdapter, RefreshSink};

pub struct AppBuilder {
	settings: Settings,
	media_adapter: Option<Arc<dyn MediaServerAdapter>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		let filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings::log_level_from_env()));
		// Several builders may exist in one process (tests), only the first installs
		let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();

		AppBuilder { settings: Settings::default(), media_adapter: None }
	}

	// Opts
	pub fn settings(&mut self, settings: Settings) -> &mut Self {
		self.settings = settings;
		self
	}

	// Adapters
	pub fn media_adapter(&mut self, media_adapter: Arc<dyn MediaServerAdapter>) -> &mut Self {
		self.media_adapter = Some(media_adapter);
		self
	}

	/// Create the app state, start the background tasks and assemble the router.
	///
	/// Must be called inside a tokio runtime.
	pub fn build(self) -> ClResult<(App, Router)> {
		let Some(media_adapter) = self.media_adapter else {
			error!("FATAL: No media adapter configured");
			return Err(Error::Internal("No media adapter configured".to_string()));
		};
		let settings = self.settings;

		info!(
			debounce = ?settings.refresh_debounce,
			max_wait = ?settings.refresh_max_wait,
			timeout = ?settings.refresh_timeout,
			log_level = %settings.log_level,
			"Refresh buffering {}",
			if settings.refresh_debounce.is_zero() { "disabled" } else { "enabled" }
		);
		if settings.jellyfin_url.is_some() && settings.jellyfin_api_key.is_some() {
			info!("Default Jellyfin target configured");
		}

		let sink: Arc<dyn RefreshSink> = media_adapter.clone();
		let scheduler = RefreshScheduler::new(sink, settings.refresh_timeout);
		let admission = Arc::new(AdmissionPipeline::from_settings(&settings));

		let app: App = Arc::new(AppState { settings, scheduler, admission, media_adapter });

		// Start scheduler
		app.scheduler.start();

		// Periodically forget rate-limit windows of idle sources
		if app.settings.rate_limit_per_minute > 0 {
			let admission = app.admission.clone();
			tokio::spawn(async move {
				loop {
					tokio::time::sleep(WINDOW).await;
					let removed = admission.sweep();
					if removed > 0 {
						debug!("Rate limiter: dropped {} idle sources", removed);
					}
				}
			});
		}

		let router = routes::init(app.clone());
		Ok((app, router))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("jellyhook V{}", VERSION);

		let listen = self.settings.listen.clone();
		let (app, router) = self.build()?;

		let res = webserver::serve(&listen, router).await;

		let pending = app.scheduler.pending();
		if pending > 0 {
			warn!("Shutting down with {} pending refreshes, they are dropped", pending);
		}
		app.scheduler.shutdown();

		res
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
