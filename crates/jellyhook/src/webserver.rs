//! HTTP server and request logging

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;

use crate::prelude::*;

/// Paths polled by health checkers, not worth a log line each
const QUIET_PATHS: &[&str] = &["/health"];

/// Log one `REQ` / `RES` line pair per request
pub async fn log_request(req: Request, next: Next) -> Response {
	if QUIET_PATHS.contains(&req.uri().path()) {
		return next.run(req).await;
	}

	let start = Instant::now();
	let peer_addr = req
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map_or_else(|| "-".to_string(), |ci| ci.0.to_string());
	info!("REQ [{}] {} {}", &peer_addr, req.method(), req.uri().path());

	let res = next.run(req).await;

	let status = res.status();
	if status.is_client_error() || status.is_server_error() {
		warn!("RES: {} tm:{:?}", &status, start.elapsed().as_millis());
	} else {
		info!("RES: {} tm:{:?}", &status, start.elapsed().as_millis());
	}
	res
}

/// Serve `router` on `listen` until Ctrl-C or SIGTERM
pub async fn serve(listen: &str, router: Router) -> ClResult<()> {
	let listener = TcpListener::bind(listen).await.map_err(|e| {
		error!("FATAL: Cannot listen on {}: {}", listen, e);
		e
	})?;
	info!("Listening on HTTP {}", listen);

	axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	info!("Server stopped");
	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			error!("Cannot listen for Ctrl-C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut sig) => {
				sig.recv().await;
			}
			Err(e) => {
				error!("Cannot listen for SIGTERM: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
	info!("Shutdown signal received");
}

// vim: ts=4
