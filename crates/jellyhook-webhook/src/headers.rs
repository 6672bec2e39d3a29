//! Request header parsing and credential resolution

use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::prelude::*;

pub const HEADER_URL: &str = "x-jellyfin-url";
pub const HEADER_API_KEY: &str = "x-jellyfin-api-key";
pub const HEADER_LIBRARY_IDS: &str = "x-jellyfin-library-ids";
pub const HEADER_COLLECTION_TYPES: &str = "x-jellyfin-collection-types";

/// Non-empty header value
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|h| h.to_str().ok()).map(str::trim).filter(|s| !s.is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
	raw.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Library ids from `X-Jellyfin-Library-Ids`
pub fn parse_library_ids(headers: &HeaderMap) -> Vec<Box<str>> {
	header_str(headers, HEADER_LIBRARY_IDS)
		.map(|raw| split_list(raw).map(Box::from).collect())
		.unwrap_or_default()
}

/// Lower-cased collection types from `X-Jellyfin-Collection-Types`
pub fn parse_collection_types(headers: &HeaderMap) -> Vec<String> {
	header_str(headers, HEADER_COLLECTION_TYPES)
		.map(|raw| split_list(raw).map(str::to_lowercase).collect())
		.unwrap_or_default()
}

fn resolve(
	url: Option<&str>,
	api_key: Option<&str>,
	url_hint: &str,
	api_key_hint: &str,
) -> ClResult<TargetKey> {
	match (url, api_key) {
		(Some(url), Some(api_key)) => Ok(TargetKey::new(url, api_key)),
		(url, api_key) => {
			let mut missing = Vec::new();
			if url.is_none() {
				missing.push(url_hint);
			}
			if api_key.is_none() {
				missing.push(api_key_hint);
			}
			Err(Error::MissingCredentials(missing.join(", ")))
		}
	}
}

/// Target of a webhook: headers first, then the configured defaults
pub fn webhook_target(app: &App, headers: &HeaderMap) -> ClResult<TargetKey> {
	resolve(
		header_str(headers, HEADER_URL).or(app.default_url()),
		header_str(headers, HEADER_API_KEY).or(app.default_api_key()),
		"X-Jellyfin-Url or JELLYFIN_URL",
		"X-Jellyfin-Api-Key or JELLYFIN_API_KEY",
	)
}

/// Target of a library listing: headers, then `url` / `api_key` query
/// parameters, then the configured defaults
pub fn libraries_target(
	app: &App,
	headers: &HeaderMap,
	query: &HashMap<String, String>,
) -> ClResult<TargetKey> {
	let query_str = |name: &str| query.get(name).map(|s| s.trim()).filter(|s| !s.is_empty());

	resolve(
		header_str(headers, HEADER_URL).or_else(|| query_str("url")).or(app.default_url()),
		header_str(headers, HEADER_API_KEY)
			.or_else(|| query_str("api_key"))
			.or(app.default_api_key()),
		"X-Jellyfin-Url header, url query param, or JELLYFIN_URL",
		"X-Jellyfin-Api-Key header, api_key query param, or JELLYFIN_API_KEY",
	)
}


// vim: ts=4
