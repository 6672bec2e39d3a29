use std::process::ExitCode;
use std::sync::Arc;

use jellyhook::settings::Settings;
use jellyhook::AppBuilder;
use jellyhook_media_adapter_jellyfin::JellyfinAdapter;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	let mut builder = AppBuilder::new();

	let settings = match Settings::from_env() {
		Ok(settings) => settings,
		Err(e) => {
			error!("FATAL: {}", e);
			return ExitCode::FAILURE;
		}
	};
	let jellyfin = match JellyfinAdapter::new() {
		Ok(adapter) => adapter,
		Err(e) => {
			error!("FATAL: Cannot create Jellyfin client: {}", e);
			return ExitCode::FAILURE;
		}
	};

	builder.settings(settings).media_adapter(Arc::new(jellyfin));
	if let Err(e) = builder.run().await {
		error!("FATAL: {}", e);
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}

// vim: ts=4
