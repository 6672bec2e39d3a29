//! Jellyfin media server adapter
//!
//! Talks to the Jellyfin HTTP API with the `X-Emby-Token` header:
//!
//! - `GET /System/Info` - reachability and API key check
//! - `GET /Library/VirtualFolders` - library listing
//! - `POST /Library/Refresh` - full library scan
//! - `POST /Items/{id}/Refresh?Recursive=true` - scan of a single library

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use jellyhook::media_adapter::{MediaServerAdapter, RefreshSink, VirtualFolder};
use jellyhook::prelude::*;

const TOKEN_HEADER: &str = "X-Emby-Token";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Status and collected body of a Jellyfin response
struct Reply {
	status: StatusCode,
	body: Bytes,
}

/// Build `{base}/{segments...}?{query}` for a target
fn endpoint(target: &TargetKey, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, String> {
	let mut url = Url::parse(target.base_url()).map_err(|e| format!("invalid URL: {}", e))?;
	url.path_segments_mut()
		.map_err(|()| "invalid URL: cannot be a base".to_string())?
		.pop_if_empty()
		.extend(segments);
	if !query.is_empty() {
		url.query_pairs_mut().extend_pairs(query);
	}
	Ok(url)
}

/// Parse a `VirtualFolders` response. A single object counts as a one-element list.
fn parse_folders(body: &[u8]) -> Option<Vec<VirtualFolder>> {
	let list = match serde_json::from_slice::<Value>(body).ok()? {
		value @ Value::Object(_) => Value::Array(vec![value]),
		value @ Value::Array(_) => value,
		_ => return None,
	};
	let mut folders: Vec<VirtualFolder> = serde_json::from_value(list).ok()?;
	folders.sort_by_cached_key(|folder| {
		(
			folder.name.as_deref().unwrap_or_default().to_lowercase(),
			folder.item_id.clone().unwrap_or_default(),
		)
	});
	Some(folders)
}

#[derive(Debug)]
pub struct JellyfinAdapter {
	client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl JellyfinAdapter {
	pub fn new() -> ClResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| Error::Internal(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);

		Ok(Self { client })
	}

	/// Send one request and collect the response, bounded by `timeout`
	async fn send(
		&self,
		method: Method,
		url: &Url,
		api_key: Option<&str>,
		timeout: Duration,
	) -> Result<Reply, String> {
		let mut builder = hyper::Request::builder().method(method).uri(url.as_str());
		if let Some(api_key) = api_key {
			builder = builder.header(TOKEN_HEADER, api_key);
		}
		let request = builder.body(Full::new(Bytes::new())).map_err(|e| e.to_string())?;

		let exchange = async {
			let response = self.client.request(request).await.map_err(|e| e.to_string())?;
			let status = response.status();
			let body = response.into_body().collect().await.map_err(|e| e.to_string())?.to_bytes();
			Ok(Reply { status, body })
		};
		match tokio::time::timeout(timeout, exchange).await {
			Ok(res) => res,
			Err(_) => Err(format!("no response within {}s", timeout.as_secs())),
		}
	}

	async fn refresh_library(&self, target: &TargetKey, id: &str) -> Result<(), String> {
		let reply = match endpoint(target, &["Items", id, "Refresh"], &[("Recursive", "true")]) {
			Ok(url) => self.send(Method::POST, &url, Some(&*target.api_key), REFRESH_TIMEOUT).await,
			Err(err) => Err(err),
		};
		match reply {
			Ok(reply) if reply.status == StatusCode::NO_CONTENT => {
				info!(endpoint = %target, library_id = %id, "Triggered Jellyfin library refresh");
				Ok(())
			}
			Ok(reply) => {
				warn!(
					endpoint = %target, library_id = %id, status = reply.status.as_u16(),
					"Jellyfin library refresh failed"
				);
				Err(format!("{} (status {})", id, reply.status.as_u16()))
			}
			Err(err) => {
				warn!(endpoint = %target, library_id = %id, "Jellyfin library refresh failed: {}", err);
				Err(format!("{} (error)", id))
			}
		}
	}

	async fn refresh_all(&self, target: &TargetKey) -> ClResult<Box<str>> {
		let reply = match endpoint(target, &["Library", "Refresh"], &[]) {
			Ok(url) => self.send(Method::POST, &url, Some(&*target.api_key), REFRESH_TIMEOUT).await,
			Err(err) => Err(err),
		};
		match reply {
			Ok(reply) if reply.status == StatusCode::NO_CONTENT => {
				Ok("Triggered Jellyfin refresh".into())
			}
			Ok(reply) => {
				warn!(endpoint = %target, status = reply.status.as_u16(), "Jellyfin refresh failed");
				Err(Error::RefreshFailed(format!(
					"Failed to trigger Jellyfin ({})",
					reply.status.as_u16()
				)))
			}
			Err(err) => {
				warn!(endpoint = %target, "Jellyfin refresh request failed: {}", err);
				Err(Error::Unreachable(format!("Failed to trigger Jellyfin: {}", err)))
			}
		}
	}
}

#[async_trait]
impl RefreshSink for JellyfinAdapter {
	async fn refresh(&self, target: &TargetKey, scope: &RefreshScope) -> ClResult<Box<str>> {
		let Some(ids) = scope.ids() else {
			return self.refresh_all(target).await;
		};

		let mut failures = Vec::new();
		for id in ids {
			if let Err(failure) = self.refresh_library(target, id).await {
				failures.push(failure);
			}
		}
		if !failures.is_empty() {
			return Err(Error::RefreshFailed(format!(
				"Failed to refresh libraries: {}",
				failures.join(", ")
			)));
		}
		Ok("Triggered Jellyfin refresh for selected libraries".into())
	}
}

#[async_trait]
impl MediaServerAdapter for JellyfinAdapter {
	async fn ping(&self, target: &TargetKey) -> ClResult<Box<str>> {
		let unreachable = |err: String| {
			warn!(endpoint = %target, "Jellyfin ping failed: {}", err);
			Error::Unreachable(format!("Failed to reach Jellyfin: {}", err))
		};

		// The server root answers without a token, so this only checks the host
		let root = endpoint(target, &[], &[]).map_err(unreachable)?;
		self.send(Method::GET, &root, None, LOOKUP_TIMEOUT).await.map_err(unreachable)?;

		let info_url = endpoint(target, &["System", "Info"], &[]).map_err(unreachable)?;
		let reply = self
			.send(Method::GET, &info_url, Some(&*target.api_key), LOOKUP_TIMEOUT)
			.await
			.map_err(unreachable)?;

		match reply.status {
			StatusCode::OK => Ok("Jellyfin connection and API key OK".into()),
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
				warn!(endpoint = %target, status = reply.status.as_u16(), "Jellyfin API key rejected");
				Err(Error::Unauthorized(format!(
					"Jellyfin API key rejected (status {})",
					reply.status.as_u16()
				)))
			}
			status => {
				warn!(endpoint = %target, status = status.as_u16(), "Jellyfin /System/Info failed");
				Err(Error::Unreachable(format!(
					"Failed to reach Jellyfin (status {})",
					status.as_u16()
				)))
			}
		}
	}

	async fn virtual_folders(&self, target: &TargetKey) -> ClResult<Vec<VirtualFolder>> {
		let unreachable = |err: String| {
			warn!(endpoint = %target, "Jellyfin virtual folders request failed: {}", err);
			Error::Unreachable(format!("Failed to fetch Jellyfin virtual folders: {}", err))
		};

		let url = endpoint(target, &["Library", "VirtualFolders"], &[("api_key", &*target.api_key)])
			.map_err(unreachable)?;
		let reply = self
			.send(Method::GET, &url, Some(&*target.api_key), LOOKUP_TIMEOUT)
			.await
			.map_err(unreachable)?;

		match reply.status {
			StatusCode::OK => {}
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
				warn!(
					endpoint = %target, status = reply.status.as_u16(),
					"Jellyfin virtual folders request failed"
				);
				return Err(Error::Unauthorized(format!(
					"Jellyfin API key rejected for virtual folders (status {})",
					reply.status.as_u16()
				)));
			}
			status => {
				warn!(endpoint = %target, status = status.as_u16(), "Jellyfin virtual folders request failed");
				return Err(Error::Unreachable(format!(
					"Failed to fetch Jellyfin virtual folders (status {})",
					status.as_u16()
				)));
			}
		}

		let Some(folders) = parse_folders(&reply.body) else {
			warn!(endpoint = %target, "Jellyfin virtual folders response is not valid JSON");
			return Err(Error::Unreachable(
				"Failed to parse Jellyfin virtual folders response".into(),
			));
		};

		info!(endpoint = %target, count = folders.len(), "Jellyfin virtual folders");
		for folder in &folders {
			let locations = if folder.locations.is_empty() {
				"-".to_string()
			} else {
				folder.locations.join(", ")
			};
			debug!(
				name = folder.name.as_deref().unwrap_or("-"),
				item_id = folder.item_id.as_deref().unwrap_or("-"),
				collection_type = folder.collection_type.as_deref().unwrap_or("-"),
				locations = %locations,
				"Virtual folder"
			);
		}

		Ok(folders)
	}
}


// vim: ts=4
