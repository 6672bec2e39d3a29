use axum::{
	middleware,
	routing::{get, post},
	Json, Router,
};
use serde_json::{json, Value};

use crate::prelude::*;
use crate::webhook;
use crate::webserver;
use jellyhook_core::admission::AdmissionLayer;
use jellyhook_core::app::ClientAddrMode;

async fn get_health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

pub fn init(app: App) -> Router {
	let mode = ClientAddrMode::from_settings(&app.settings);

	// Everything that can reach Jellyfin passes the allowlist and the rate limiter
	let gated_router = Router::new()
		.route("/radarr-webhook", post(webhook::post_radarr))
		.route("/sonarr-webhook", post(webhook::post_sonarr))
		.route("/libraries", get(webhook::get_libraries))
		.route_layer(AdmissionLayer::new(app.admission.clone(), mode));

	Router::new()
		.route("/health", get(get_health))
		.merge(gated_router)
		.layer(middleware::from_fn(webserver::log_request))
		.with_state(app)
}

// vim: ts=4
