//! Process settings, resolved once at startup from the environment.
//!
//! Empty variables mean "use the default". Negative numbers are clamped to
//! zero (which disables the feature they control), anything that does not
//! parse is reported as a configuration error instead of being ignored.

use std::time::Duration;

use crate::prelude::*;

pub const ENV_DEBOUNCE: &str = "JELLYFIN_NOTIFIER_REFRESH_DEBOUNCE_SECONDS";
pub const ENV_MAX_WAIT: &str = "JELLYFIN_NOTIFIER_REFRESH_MAX_WAIT_SECONDS";
pub const ENV_REFRESH_TIMEOUT: &str = "JELLYFIN_NOTIFIER_REFRESH_TIMEOUT_SECONDS";
pub const ENV_RATE_LIMIT: &str = "JELLYFIN_NOTIFIER_RATE_LIMIT_PER_MINUTE";
pub const ENV_ALLOWLIST: &str = "JELLYFIN_NOTIFIER_ALLOWLIST";
pub const ENV_TRUST_PROXY_HEADERS: &str = "JELLYFIN_NOTIFIER_TRUST_PROXY_HEADERS";
pub const ENV_PORT: &str = "JELLYFIN_NOTIFIER_PORT";
pub const ENV_LISTEN: &str = "JELLYFIN_NOTIFIER_LISTEN";
pub const ENV_JELLYFIN_URL: &str = "JELLYFIN_URL";
pub const ENV_JELLYFIN_API_KEY: &str = "JELLYFIN_API_KEY";
pub const ENV_LOG_LEVEL: &str = "JELLYFIN_NOTIFIER_LOG_LEVEL";
pub const ENV_LOG_LEVEL_SHORT: &str = "JELLYHOOK_LOG_LEVEL";

const DEFAULT_PORT: u16 = 5001;

#[derive(Debug, Clone)]
pub struct Settings {
	/// Listen address of the HTTP server
	pub listen: Box<str>,
	/// Quiet period after the last request before a refresh fires. Zero disables buffering.
	pub refresh_debounce: Duration,
	/// Upper bound on the delay since the first buffered request. Zero disables the cap.
	pub refresh_max_wait: Duration,
	/// Bound on one refresh call. Zero means unbounded.
	pub refresh_timeout: Duration,
	/// Admitted requests per source per minute. Zero disables limiting.
	pub rate_limit_per_minute: u32,
	/// Raw comma-separated allowlist, parsed by the admission pipeline
	pub allowlist: Box<str>,
	pub trust_proxy_headers: bool,
	pub jellyfin_url: Option<Box<str>>,
	pub jellyfin_api_key: Option<Box<str>>,
	pub log_level: Box<str>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			listen: format!("0.0.0.0:{}", DEFAULT_PORT).into(),
			refresh_debounce: Duration::from_secs(10),
			refresh_max_wait: Duration::from_secs(60),
			refresh_timeout: Duration::from_secs(30),
			rate_limit_per_minute: 0,
			allowlist: "".into(),
			trust_proxy_headers: false,
			jellyfin_url: None,
			jellyfin_api_key: None,
			log_level: "info".into(),
		}
	}
}

impl Settings {
	/// Read settings from the process environment
	pub fn from_env() -> ClResult<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Read settings through an arbitrary variable lookup
	pub fn from_lookup<F>(lookup: F) -> ClResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let mut settings = Self::default();

		if let Some(raw) = var(ENV_DEBOUNCE) {
			settings.refresh_debounce = parse_seconds(ENV_DEBOUNCE, &raw)?;
		}
		if let Some(raw) = var(ENV_MAX_WAIT) {
			settings.refresh_max_wait = parse_seconds(ENV_MAX_WAIT, &raw)?;
		}
		if let Some(raw) = var(ENV_REFRESH_TIMEOUT) {
			settings.refresh_timeout = parse_seconds(ENV_REFRESH_TIMEOUT, &raw)?;
		}
		if let Some(raw) = var(ENV_RATE_LIMIT) {
			let limit = parse_non_negative(ENV_RATE_LIMIT, &raw)?;
			settings.rate_limit_per_minute = u32::try_from(limit).unwrap_or(u32::MAX);
		}
		if let Some(raw) = var(ENV_ALLOWLIST) {
			settings.allowlist = raw.into();
		}
		if let Some(raw) = var(ENV_TRUST_PROXY_HEADERS) {
			settings.trust_proxy_headers = parse_bool(&raw).ok_or_else(|| {
				Error::InvalidConfig(format!(
					"Invalid value for {}: {} (expected true/false)",
					ENV_TRUST_PROXY_HEADERS, raw
				))
			})?;
		}

		if let Some(listen) = var(ENV_LISTEN) {
			settings.listen = listen.into();
		} else if let Some((name, raw)) =
			var(ENV_PORT).map(|raw| (ENV_PORT, raw)).or_else(|| var("PORT").map(|raw| ("PORT", raw)))
		{
			let port: u16 = raw.parse().map_err(|_| {
				Error::InvalidConfig(format!("Invalid value for {}: {}", name, raw))
			})?;
			settings.listen = format!("0.0.0.0:{}", port).into();
		}

		settings.jellyfin_url = var(ENV_JELLYFIN_URL).map(Into::into);
		settings.jellyfin_api_key = var(ENV_JELLYFIN_API_KEY).map(Into::into);
		if let Some(level) = var(ENV_LOG_LEVEL_SHORT).or_else(|| var(ENV_LOG_LEVEL)) {
			settings.log_level = normalize_log_level(&level).into();
		}

		Ok(settings)
	}
}

/// Log filter directive from the environment, used before settings are loaded
pub fn log_level_from_env() -> String {
	[ENV_LOG_LEVEL_SHORT, ENV_LOG_LEVEL]
		.iter()
		.filter_map(|name| std::env::var(name).ok())
		.map(|v| v.trim().to_string())
		.find(|v| !v.is_empty())
		.map_or_else(|| "info".to_string(), |v| normalize_log_level(&v))
}

/// Accepts the usual level spellings (`INFO`, `warning`, `critical`) as well as
/// full filter directives such as `jellyhook_core=debug`.
fn normalize_log_level(raw: &str) -> String {
	match raw.to_ascii_lowercase().as_str() {
		"warning" => "warn".to_string(),
		"critical" | "fatal" => "error".to_string(),
		_ if raw.contains('=') => raw.to_string(),
		lower => lower.to_string(),
	}
}

fn parse_non_negative(name: &str, raw: &str) -> ClResult<u64> {
	let value: i64 = raw
		.parse()
		.map_err(|_| Error::InvalidConfig(format!("Invalid value for {}: {}", name, raw)))?;
	Ok(u64::try_from(value).unwrap_or(0))
}

fn parse_seconds(name: &str, raw: &str) -> ClResult<Duration> {
	parse_non_negative(name, raw).map(Duration::from_secs)
}

/// Parse a boolean in any of the common env-style spellings
pub fn parse_bool(raw: &str) -> Option<bool> {
	match raw.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn settings_from(vars: &[(&str, &str)]) -> ClResult<Settings> {
		let vars: HashMap<String, String> =
			vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
		Settings::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let settings = settings_from(&[]).unwrap();
		assert_eq!(&*settings.listen, "0.0.0.0:5001");
		assert_eq!(settings.refresh_debounce, Duration::from_secs(10));
		assert_eq!(settings.refresh_max_wait, Duration::from_secs(60));
		assert_eq!(settings.refresh_timeout, Duration::from_secs(30));
		assert_eq!(settings.rate_limit_per_minute, 0);
		assert!(settings.allowlist.is_empty());
		assert!(!settings.trust_proxy_headers);
		assert!(settings.jellyfin_url.is_none());
		assert_eq!(&*settings.log_level, "info");
	}

	#[test]
	fn test_negative_values_clamp_to_zero() {
		let settings = settings_from(&[
			(ENV_DEBOUNCE, "-5"),
			(ENV_MAX_WAIT, "-1"),
			(ENV_RATE_LIMIT, "-10"),
		])
		.unwrap();
		assert_eq!(settings.refresh_debounce, Duration::ZERO);
		assert_eq!(settings.refresh_max_wait, Duration::ZERO);
		assert_eq!(settings.rate_limit_per_minute, 0);
	}

	#[test]
	fn test_malformed_number_is_config_error() {
		let res = settings_from(&[(ENV_DEBOUNCE, "soon")]);
		assert!(matches!(res, Err(Error::InvalidConfig(msg)) if msg.contains(ENV_DEBOUNCE)));

		let res = settings_from(&[(ENV_RATE_LIMIT, "1.5")]);
		assert!(matches!(res, Err(Error::InvalidConfig(_))));
	}

	#[test]
	fn test_empty_values_use_defaults() {
		let settings = settings_from(&[(ENV_DEBOUNCE, "  "), (ENV_JELLYFIN_URL, "")]).unwrap();
		assert_eq!(settings.refresh_debounce, Duration::from_secs(10));
		assert!(settings.jellyfin_url.is_none());
	}

	#[test]
	fn test_listen_address() {
		let settings = settings_from(&[("PORT", "8080")]).unwrap();
		assert_eq!(&*settings.listen, "0.0.0.0:8080");

		let settings = settings_from(&[("PORT", "8080"), (ENV_PORT, "9090")]).unwrap();
		assert_eq!(&*settings.listen, "0.0.0.0:9090");

		let settings = settings_from(&[(ENV_PORT, "9090"), (ENV_LISTEN, "127.0.0.1:7000")]).unwrap();
		assert_eq!(&*settings.listen, "127.0.0.1:7000");

		assert!(settings_from(&[(ENV_PORT, "http")]).is_err());
	}

	#[test]
	fn test_flags_and_credentials() {
		let settings = settings_from(&[
			(ENV_TRUST_PROXY_HEADERS, "Yes"),
			(ENV_JELLYFIN_URL, "http://jellyfin:8096"),
			(ENV_JELLYFIN_API_KEY, "k"),
			(ENV_ALLOWLIST, "10.0.0.0/8, 192.168.1.5"),
			(ENV_LOG_LEVEL, "WARNING"),
		])
		.unwrap();
		assert!(settings.trust_proxy_headers);
		assert_eq!(settings.jellyfin_url.as_deref(), Some("http://jellyfin:8096"));
		assert_eq!(settings.jellyfin_api_key.as_deref(), Some("k"));
		assert_eq!(&*settings.allowlist, "10.0.0.0/8, 192.168.1.5");
		assert_eq!(&*settings.log_level, "warn");

		assert!(settings_from(&[(ENV_TRUST_PROXY_HEADERS, "maybe")]).is_err());
	}
}

// vim: ts=4
