//! Client Address Extraction
//!
//! Resolves the caller address used by both the allowlist and the rate
//! limiter.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use hyper::Request;

use crate::app::ClientAddrMode;

/// Extract client IP from request based on ClientAddrMode
///
/// - Direct mode: Use peer IP from ConnectInfo
/// - Proxy mode: Check forwarding headers first
pub fn extract_client_ip<B>(req: &Request<B>, mode: ClientAddrMode) -> Option<IpAddr> {
	let ip = match mode {
		ClientAddrMode::Direct => peer_ip(req),
		ClientAddrMode::Proxy => extract_from_xff(req)
			.or_else(|| extract_from_x_real_ip(req))
			.or_else(|| extract_from_forwarded(req))
			.or_else(|| peer_ip(req)),
	};
	// Dual-stack listeners report IPv4 callers as ::ffff:a.b.c.d
	ip.map(|ip| ip.to_canonical())
}

fn peer_ip<B>(req: &Request<B>) -> Option<IpAddr> {
	req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0.ip())
}

/// Extract IP from X-Forwarded-For header
fn extract_from_xff<B>(req: &Request<B>) -> Option<IpAddr> {
	req.headers()
		.get("x-forwarded-for")
		.and_then(|h| h.to_str().ok())
		.and_then(|s| {
			// Leftmost entry is the original client
			s.split(',').next().map(str::trim).and_then(|ip| ip.parse().ok())
		})
}

/// Extract IP from X-Real-IP header
fn extract_from_x_real_ip<B>(req: &Request<B>) -> Option<IpAddr> {
	req.headers()
		.get("x-real-ip")
		.and_then(|h| h.to_str().ok())
		.and_then(|s| s.trim().parse().ok())
}

/// Extract IP from Forwarded header (RFC 7239)
fn extract_from_forwarded<B>(req: &Request<B>) -> Option<IpAddr> {
	req.headers().get("forwarded").and_then(|h| h.to_str().ok()).and_then(|s| {
		// "for=192.0.2.60;proto=http" or "for=\"[2001:db8::1]:4711\"", first hop only
		s.split(',').next()?.split(';').find_map(|part| {
			let (key, value) = part.trim().split_once('=')?;
			if !key.eq_ignore_ascii_case("for") {
				return None;
			}
			let value = value.trim_matches('"');
			if let Some(bracketed) = value.strip_prefix('[') {
				return bracketed.split(']').next()?.parse().ok();
			}
			value.parse().ok().or_else(|| value.parse::<SocketAddr>().ok().map(|sa| sa.ip()))
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{Ipv4Addr, Ipv6Addr};

	fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request<()> {
		let mut builder = Request::builder().uri("/radarr-webhook");
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		let mut req = builder.body(()).unwrap();
		if let Some(peer) = peer {
			let addr: SocketAddr = peer.parse().unwrap();
			req.extensions_mut().insert(ConnectInfo(addr));
		}
		req
	}

	#[test]
	fn test_direct_ignores_headers() {
		let req = request(&[("x-forwarded-for", "1.2.3.4")], Some("10.0.0.5:5555"));
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Direct),
			Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
		);
	}

	#[test]
	fn test_direct_without_peer() {
		let req = request(&[], None);
		assert_eq!(extract_client_ip(&req, ClientAddrMode::Direct), None);
	}

	#[test]
	fn test_proxy_prefers_leftmost_xff() {
		let req = request(
			&[("x-forwarded-for", "1.2.3.4, 10.0.0.1"), ("x-real-ip", "5.6.7.8")],
			Some("10.0.0.5:5555"),
		);
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Proxy),
			Some(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)))
		);
	}

	#[test]
	fn test_proxy_falls_back_in_order() {
		let req = request(&[("x-real-ip", " 5.6.7.8 ")], Some("10.0.0.5:5555"));
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Proxy),
			Some(IpAddr::V4(Ipv4Addr::new(5, 6, 7, 8)))
		);

		let req = request(&[("forwarded", "proto=http;For=\"[2001:db8::1]:4711\"")], None);
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Proxy),
			Some(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)))
		);

		let req = request(&[("x-forwarded-for", "garbage")], Some("10.0.0.5:5555"));
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Proxy),
			Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
		);
	}

	#[test]
	fn test_mapped_ipv4_is_canonicalized() {
		let req = request(&[], Some("[::ffff:192.168.1.9]:80"));
		assert_eq!(
			extract_client_ip(&req, ClientAddrMode::Direct),
			Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)))
		);
	}
}

// vim: ts=4
