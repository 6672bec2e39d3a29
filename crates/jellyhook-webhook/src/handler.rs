//! Webhook HTTP handlers

use std::collections::HashMap;

use axum::{
	body::Bytes,
	extract::{Query, State},
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::headers::{libraries_target, parse_collection_types, parse_library_ids, webhook_target};
use crate::prelude::*;
use crate::select::{
	resolve_collection_types, select_library_ids_by_collection, unknown_types_error,
};
use jellyhook_types::types::merge_ids;

const FOLDERS_LISTED: &str = "Jellyfin virtual folders listed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
	Radarr,
	Sonarr,
}

impl Source {
	fn as_str(self) -> &'static str {
		match self {
			Source::Radarr => "radarr",
			Source::Sonarr => "sonarr",
		}
	}
}

/// Parse a body leniently. Anything but a JSON object becomes `{}`.
fn parse_payload(body: &[u8]) -> Value {
	match serde_json::from_slice::<Value>(body) {
		Ok(value @ Value::Object(_)) => value,
		_ => Value::Object(serde_json::Map::new()),
	}
}

/// Printable value at `path`, `-` when absent
fn field(payload: &Value, path: &[&str]) -> String {
	let value = path.iter().try_fold(payload, |value, key| value.get(key));
	match value {
		Some(Value::String(s)) if !s.is_empty() => s.clone(),
		Some(Value::Null | Value::String(_)) | None => "-".into(),
		Some(other) => other.to_string(),
	}
}

/// First non-empty of `relativePath` / `path` under `file_key`
fn file_path(payload: &Value, file_key: &str) -> String {
	let relative = field(payload, &[file_key, "relativePath"]);
	if relative == "-" { field(payload, &[file_key, "path"]) } else { relative }
}

fn is_test_event(payload: &Value) -> bool {
	payload.get("eventType").and_then(Value::as_str).is_some_and(|t| t.eq_ignore_ascii_case("test"))
}

fn log_event(source: Source, payload: &Value) {
	match source {
		Source::Radarr => info!(
			event_type = %field(payload, &["eventType"]),
			title = %field(payload, &["movie", "title"]),
			year = %field(payload, &["movie", "year"]),
			path = %file_path(payload, "movieFile"),
			"Radarr event"
		),
		Source::Sonarr => info!(
			event_type = %field(payload, &["eventType"]),
			series = %field(payload, &["series", "title"]),
			episode_path = %file_path(payload, "episodeFile"),
			"Sonarr event"
		),
	}
}

/// POST /radarr-webhook
pub async fn post_radarr(
	State(app): State<App>,
	headers: HeaderMap,
	body: Bytes,
) -> ClResult<Response> {
	handle_event(&app, Source::Radarr, &headers, &parse_payload(&body)).await
}

/// POST /sonarr-webhook
pub async fn post_sonarr(
	State(app): State<App>,
	headers: HeaderMap,
	body: Bytes,
) -> ClResult<Response> {
	handle_event(&app, Source::Sonarr, &headers, &parse_payload(&body)).await
}

async fn handle_event(
	app: &App,
	source: Source,
	headers: &HeaderMap,
	payload: &Value,
) -> ClResult<Response> {
	log_event(source, payload);

	let target = webhook_target(app, headers).inspect_err(|err| {
		warn!(source = source.as_str(), "Rejecting webhook: {}", err);
	})?;
	let library_ids = parse_library_ids(headers);
	let collection_types = parse_collection_types(headers);

	if is_test_event(payload) {
		return handle_test_event(app, source, &target, &collection_types).await;
	}

	let resolved = if collection_types.is_empty() {
		Vec::new()
	} else {
		resolve_collection_types(app.media_adapter.as_ref(), &target, &collection_types).await?
	};
	let scope = RefreshScope::from_ids(merge_ids([library_ids, resolved]));

	info!(
		source = source.as_str(),
		event_type = %field(payload, &["eventType"]),
		endpoint = %target,
		targets = %scope,
		collection_types = %collection_types.join(", "),
		"Refresh request"
	);

	let outcome = app
		.scheduler
		.enqueue(target, scope, app.settings.refresh_debounce, app.settings.refresh_max_wait)
		.await?;
	Ok(outcome.into_response())
}

/// Connectivity check sent from the Radarr/Sonarr settings page. Never refreshes.
async fn handle_test_event(
	app: &App,
	source: Source,
	target: &TargetKey,
	collection_types: &[String],
) -> ClResult<Response> {
	let ping = app.media_adapter.ping(target).await.inspect_err(|err| {
		warn!(
			source = source.as_str(), endpoint = %target,
			"Test event: Jellyfin not reachable: {}", err
		);
	})?;
	info!(source = source.as_str(), endpoint = %target, "Test event: Jellyfin reachable");

	let folders = app.media_adapter.virtual_folders(target).await?;
	if !collection_types.is_empty() {
		let selection = select_library_ids_by_collection(&folders, collection_types);
		if !selection.missing.is_empty() {
			return Err(unknown_types_error(&selection));
		}
		info!(
			source = source.as_str(),
			collection_types = %collection_types.join(", "),
			resolved = %selection.ids.join(", "),
			"Test event: collection types resolved"
		);
	}

	Ok((StatusCode::OK, format!("{}; {}", ping, FOLDERS_LISTED)).into_response())
}

/// GET /libraries
///
/// Lists the libraries of a Jellyfin server so operators can look up ids and
/// collection types for the webhook headers.
pub async fn get_libraries(
	State(app): State<App>,
	headers: HeaderMap,
	Query(query): Query<HashMap<String, String>>,
) -> ClResult<Response> {
	let target = libraries_target(&app, &headers, &query)?;
	let folders = app.media_adapter.virtual_folders(&target).await?;

	let body = serde_json::to_string_pretty(&serde_json::json!({ "libraries": folders }))?;
	Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}


// vim: ts=4
