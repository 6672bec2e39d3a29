//! Common test utilities and helpers
//!
//! A fake Jellyfin adapter that records refreshes, and helpers to drive the
//! assembled router without a network listener.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use parking_lot::Mutex;
use tower::ServiceExt;

use jellyhook::error::{ClResult, Error};
use jellyhook::media_adapter::{MediaServerAdapter, RefreshSink, VirtualFolder};
use jellyhook::settings::Settings;
use jellyhook::types::{RefreshScope, TargetKey};
use jellyhook::{App, AppBuilder};

pub const JF_URL: &str = "http://jellyfin:8096";
pub const JF_KEY: &str = "secret";

#[derive(Debug, Default)]
pub struct FakeJellyfin {
	pub folders: Vec<VirtualFolder>,
	pub reject_key: bool,
	pub fail_folders: bool,
	pub fail_refresh: bool,
	pub refreshes: Mutex<Vec<(TargetKey, RefreshScope)>>,
	pub pings: Mutex<usize>,
}

impl FakeJellyfin {
	pub fn with_libraries() -> Self {
		Self {
			folders: vec![
				folder("Kids", Some("m2"), Some("movies"), &["/kids"]),
				folder("Movies", Some("m1"), Some("movies"), &["/movies"]),
				folder("Music", None, Some("music"), &[]),
				folder("Shows", Some("s1"), Some("tvshows"), &["/tv"]),
			],
			..Self::default()
		}
	}

	pub fn refreshes(&self) -> Vec<(TargetKey, RefreshScope)> {
		self.refreshes.lock().clone()
	}
}

pub fn folder(
	name: &str,
	item_id: Option<&str>,
	kind: Option<&str>,
	locations: &[&str],
) -> VirtualFolder {
	VirtualFolder {
		name: Some(name.into()),
		item_id: item_id.map(Into::into),
		collection_type: kind.map(Into::into),
		locations: locations.iter().map(|l| Box::from(*l)).collect(),
	}
}

#[async_trait]
impl RefreshSink for FakeJellyfin {
	async fn refresh(&self, target: &TargetKey, scope: &RefreshScope) -> ClResult<Box<str>> {
		self.refreshes.lock().push((target.clone(), scope.clone()));
		if self.fail_refresh {
			return Err(Error::RefreshFailed("Failed to trigger Jellyfin (500)".into()));
		}
		Ok(if scope.is_all() {
			"Triggered Jellyfin refresh".into()
		} else {
			"Triggered Jellyfin refresh for selected libraries".into()
		})
	}
}

#[async_trait]
impl MediaServerAdapter for FakeJellyfin {
	async fn ping(&self, _target: &TargetKey) -> ClResult<Box<str>> {
		*self.pings.lock() += 1;
		if self.reject_key {
			return Err(Error::Unauthorized("Jellyfin API key rejected (status 401)".into()));
		}
		Ok("Jellyfin connection and API key OK".into())
	}

	async fn virtual_folders(&self, _target: &TargetKey) -> ClResult<Vec<VirtualFolder>> {
		if self.fail_folders {
			return Err(Error::Unreachable(
				"Failed to fetch Jellyfin virtual folders (status 500)".into(),
			));
		}
		Ok(self.folders.clone())
	}
}

/// Short buffering so tests can wait for the dispatcher
pub fn settings() -> Settings {
	Settings {
		refresh_debounce: Duration::from_millis(50),
		refresh_max_wait: Duration::from_millis(200),
		..Settings::default()
	}
}

pub fn build(settings: Settings, jellyfin: &Arc<FakeJellyfin>) -> (App, Router) {
	let mut builder = AppBuilder::new();
	builder.settings(settings).media_adapter(jellyfin.clone());
	builder.build().unwrap()
}

/// Wait long enough for any buffered refresh to be dispatched
pub async fn settle() {
	tokio::time::sleep(Duration::from_millis(300)).await;
}

pub struct TestRequest {
	builder: axum::http::request::Builder,
	peer: SocketAddr,
	body: Body,
}

impl TestRequest {
	pub fn post(uri: &str) -> Self {
		Self::new("POST", uri)
	}

	pub fn get(uri: &str) -> Self {
		Self::new("GET", uri)
	}

	fn new(method: &str, uri: &str) -> Self {
		Self {
			builder: Request::builder().method(method).uri(uri),
			peer: "10.0.0.1:40000".parse().unwrap(),
			body: Body::empty(),
		}
	}

	pub fn peer(mut self, peer: &str) -> Self {
		self.peer = peer.parse().unwrap();
		self
	}

	pub fn header(mut self, name: &str, value: &str) -> Self {
		self.builder = self.builder.header(name, value);
		self
	}

	/// Jellyfin credentials headers for the fake server
	pub fn credentials(self) -> Self {
		self.header("X-Jellyfin-Url", JF_URL).header("X-Jellyfin-Api-Key", JF_KEY)
	}

	pub fn json(mut self, body: &serde_json::Value) -> Self {
		self.builder = self.builder.header("content-type", "application/json");
		self.body = Body::from(body.to_string());
		self
	}

	pub fn body(mut self, body: &str) -> Self {
		self.body = Body::from(body.to_string());
		self
	}

	pub async fn send(self, router: &Router) -> Response {
		let mut req = self.builder.body(self.body).unwrap();
		req.extensions_mut().insert(ConnectInfo(self.peer));
		router.clone().oneshot(req).await.unwrap()
	}
}

pub async fn body_string(res: Response) -> String {
	let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn target() -> TargetKey {
	TargetKey::new(JF_URL, JF_KEY)
}

// vim: ts=4
