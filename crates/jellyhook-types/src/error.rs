//! Error type shared by every jellyhook crate.
//!
//! Each variant maps to exactly one HTTP status, so the same value can be
//! logged by the dispatcher or returned to a webhook caller unchanged.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	// Request errors
	/// Required Jellyfin URL / API key not supplied by headers or defaults
	MissingCredentials(String),
	ValidationError(String),

	// Admission
	/// Operator misconfiguration (allowlist entry, numeric setting)
	InvalidConfig(String),
	Forbidden,
	RateLimited {
		retry_after: Duration,
	},

	// Downstream (sink) failures
	/// Downstream host could not be reached or answered unexpectedly
	Unreachable(String),
	/// Downstream rejected the API key
	Unauthorized(String),
	/// Downstream accepted the connection but the refresh failed
	RefreshFailed(String),
	Timeout(Duration),

	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// HTTP status this error is reported with
	pub fn status(&self) -> StatusCode {
		match self {
			Error::MissingCredentials(_) | Error::ValidationError(_) => StatusCode::BAD_REQUEST,
			Error::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Forbidden => StatusCode::FORBIDDEN,
			Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
			Error::Unreachable(_) => StatusCode::BAD_GATEWAY,
			Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			Error::RefreshFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
			Error::Internal(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// True for expected admission rejections (not worth an error-level log)
	pub fn is_admission_denial(&self) -> bool {
		matches!(self, Error::Forbidden | Error::RateLimited { .. })
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::MissingCredentials(missing) => write!(f, "Missing credentials: {}", missing),
			Error::ValidationError(msg)
			| Error::InvalidConfig(msg)
			| Error::Unreachable(msg)
			| Error::Unauthorized(msg)
			| Error::RefreshFailed(msg)
			| Error::Internal(msg) => write!(f, "{}", msg),
			Error::Forbidden => write!(f, "Forbidden"),
			Error::RateLimited { .. } => write!(f, "Rate limit exceeded"),
			Error::Timeout(after) => write!(f, "Jellyfin did not respond within {:?}", after),
			Error::Io(err) => write!(f, "I/O error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Internal(format!("JSON error: {}", err))
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		let mut response = (status, self.to_string()).into_response();

		if let Error::RateLimited { retry_after } = self {
			if let Ok(val) = HeaderValue::from_str(&retry_after.as_secs().to_string()) {
				response.headers_mut().insert(header::RETRY_AFTER, val);
			}
		}

		response
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::InvalidConfig("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
		assert_eq!(
			Error::RateLimited { retry_after: Duration::from_secs(60) }.status(),
			StatusCode::TOO_MANY_REQUESTS
		);
		assert_eq!(Error::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
		assert_eq!(Error::Unreachable("x".into()).status(), StatusCode::BAD_GATEWAY);
		assert_eq!(Error::MissingCredentials("x".into()).status(), StatusCode::BAD_REQUEST);
	}

	#[test]
	fn test_rate_limited_response_has_retry_after() {
		let response = Error::RateLimited { retry_after: Duration::from_secs(60) }.into_response();
		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
	}

	#[test]
	fn test_admission_denials() {
		assert!(Error::Forbidden.is_admission_denial());
		assert!(!Error::InvalidConfig("bad".into()).is_admission_denial());
	}
}

// vim: ts=4
