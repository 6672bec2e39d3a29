//! Admission Middleware
//!
//! Tower middleware layer for applying the admission gate to Axum routes.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use hyper::Request;
use tower::{Layer, Service};

use super::AdmissionPipeline;
use crate::app::ClientAddrMode;
use crate::prelude::*;
use crate::rate_limit::extract_client_ip;

/// Admission middleware layer
#[derive(Clone)]
pub struct AdmissionLayer {
	pipeline: Arc<AdmissionPipeline>,
	mode: ClientAddrMode,
}

impl AdmissionLayer {
	pub fn new(pipeline: Arc<AdmissionPipeline>, mode: ClientAddrMode) -> Self {
		Self { pipeline, mode }
	}
}

impl<S> Layer<S> for AdmissionLayer {
	type Service = AdmissionService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		AdmissionService { inner, pipeline: self.pipeline.clone(), mode: self.mode }
	}
}

/// Admission middleware service
#[derive(Clone)]
pub struct AdmissionService<S> {
	inner: S,
	pipeline: Arc<AdmissionPipeline>,
	mode: ClientAddrMode,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
where
	S: Service<Request<Body>, Response = axum::response::Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let pipeline = self.pipeline.clone();
		let mode = self.mode;
		let mut inner = self.inner.clone();

		Box::pin(async move {
			let client_ip = extract_client_ip(&req, mode);

			if let Err(err) = pipeline.admit(client_ip) {
				let client = client_ip.map_or_else(|| "-".to_string(), |ip| ip.to_string());
				let path = req.uri().path();
				if err.is_admission_denial() {
					warn!(client = %client, path = %path, "Request rejected: {}", err);
				} else {
					error!(client = %client, path = %path, "Request rejected: {}", err);
				}
				return Ok(err.into_response());
			}

			inner.call(req).await
		})
	}
}


// vim: ts=4
