//! Sliding Window Rate Limiter
//!
//! Counts admitted requests per source over the trailing minute. Rejected
//! requests are not recorded, so a client that keeps hammering is let back in
//! as soon as its oldest admitted request leaves the window.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::prelude::*;

/// Length of the sliding window
pub const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
pub struct RateLimiter {
	/// Admission timestamps per source, oldest first
	windows: Mutex<HashMap<Box<str>, VecDeque<Instant>>>,
}

/// Drop timestamps that are no longer inside the window ending at `now`
fn trim(window: &mut VecDeque<Instant>, now: Instant) {
	let Some(cutoff) = now.checked_sub(WINDOW) else {
		return;
	};
	while window.front().is_some_and(|ts| *ts <= cutoff) {
		window.pop_front();
	}
}

impl RateLimiter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Check (and on success record) one request from `source`.
	///
	/// A limit of 0 disables limiting.
	pub fn check(&self, source: &str, limit_per_minute: u32) -> bool {
		self.check_at(source, limit_per_minute, Instant::now())
	}

	/// Same as [`check`](Self::check) with an explicit clock
	pub fn check_at(&self, source: &str, limit_per_minute: u32, now: Instant) -> bool {
		if limit_per_minute == 0 {
			return true;
		}

		let mut windows = self.windows.lock();
		let window = windows.entry(source.into()).or_default();
		trim(window, now);

		if window.len() >= limit_per_minute as usize {
			return false;
		}
		window.push_back(now);
		true
	}

	/// Forget sources that have nothing left in the window. Returns the number removed.
	pub fn sweep(&self, now: Instant) -> usize {
		let mut windows = self.windows.lock();
		let before = windows.len();
		windows.retain(|_, window| {
			trim(window, now);
			!window.is_empty()
		});
		let removed = before - windows.len();
		if removed > 0 {
			debug!("Rate limiter swept {} idle sources, {} tracked", removed, windows.len());
		}
		removed
	}

	/// Number of sources currently tracked
	pub fn tracked(&self) -> usize {
		self.windows.lock().len()
	}
}


// vim: ts=4
