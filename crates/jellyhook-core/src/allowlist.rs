//! Network allowlist for webhook callers

use std::net::IpAddr;

use ipnetwork::IpNetwork;

use crate::prelude::*;

/// Ordered list of IPv4/IPv6 ranges. Empty means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowlistSpec {
	networks: Vec<IpNetwork>,
}

impl AllowlistSpec {
	/// Parse a comma-separated list of CIDR ranges and bare addresses.
	///
	/// Host bits in a CIDR are accepted (`10.0.0.7/8` covers `10.0.0.0/8`).
	pub fn parse(raw: &str) -> ClResult<Self> {
		let mut networks = Vec::new();
		for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
			let network = if entry.contains('/') {
				entry.parse::<IpNetwork>().ok()
			} else {
				entry.parse::<IpAddr>().ok().map(IpNetwork::from)
			};
			let Some(network) = network else {
				return Err(Error::InvalidConfig(format!("Invalid allowlist entry: {}", entry)));
			};
			networks.push(network);
		}
		Ok(Self { networks })
	}

	pub fn is_empty(&self) -> bool {
		self.networks.is_empty()
	}

	pub fn len(&self) -> usize {
		self.networks.len()
	}

	/// Whether a caller may pass. Unknown callers only pass an empty list.
	pub fn permits(&self, addr: Option<IpAddr>) -> bool {
		if self.networks.is_empty() {
			return true;
		}
		let Some(addr) = addr else {
			return false;
		};
		let addr = addr.to_canonical();
		self.networks.iter().any(|network| network.contains(addr))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ip(s: &str) -> Option<IpAddr> {
		Some(s.parse().unwrap())
	}

	#[test]
	fn test_empty_permits_everyone() {
		let spec = AllowlistSpec::parse(" , ").unwrap();
		assert!(spec.is_empty());
		assert!(spec.permits(ip("8.8.8.8")));
		assert!(spec.permits(None));
	}

	#[test]
	fn test_ranges_and_hosts() {
		let spec = AllowlistSpec::parse("10.0.0.0/8, 192.168.1.5 ,fd00::/8").unwrap();
		assert_eq!(spec.len(), 3);
		assert!(spec.permits(ip("10.20.30.40")));
		assert!(spec.permits(ip("192.168.1.5")));
		assert!(!spec.permits(ip("192.168.1.6")));
		assert!(spec.permits(ip("fd12::1")));
		assert!(!spec.permits(ip("2001:db8::1")));
		assert!(!spec.permits(None));
	}

	#[test]
	fn test_host_bits_accepted() {
		let spec = AllowlistSpec::parse("10.1.2.3/8").unwrap();
		assert!(spec.permits(ip("10.200.0.1")));
		assert!(!spec.permits(ip("11.0.0.1")));
	}

	#[test]
	fn test_invalid_entry_is_config_error() {
		let res = AllowlistSpec::parse("10.0.0.0/8, not-an-ip");
		assert!(
			matches!(res, Err(Error::InvalidConfig(msg)) if msg == "Invalid allowlist entry: not-an-ip")
		);
		assert!(AllowlistSpec::parse("10.0.0.0/33").is_err());
	}
}

// vim: ts=4
