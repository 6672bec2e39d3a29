//! Refresh scheduler. Coalesces bursts of refresh requests per target and
//! dispatches them from a background task.
//!
//! Each target has at most one pending bucket. Enqueues merge into it and push
//! its deadline out by the debounce interval, capped at `first_seen + max_wait`.
//! The dispatcher always claims the earliest due bucket whose target has no
//! refresh in flight, so refreshes of one target never overlap while a slow
//! target cannot hold up the others.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use jellyhook_types::media_adapter::RefreshSink;

use crate::prelude::*;

/// Result of handing a refresh request to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
	/// Buffered, the dispatcher will run it later
	Queued,
	/// Buffering disabled, the refresh already ran with this result message
	Refreshed(Box<str>),
}

impl IntoResponse for EnqueueOutcome {
	fn into_response(self) -> Response {
		match self {
			EnqueueOutcome::Queued => (StatusCode::ACCEPTED, "Refresh queued").into_response(),
			EnqueueOutcome::Refreshed(msg) => (StatusCode::OK, msg.to_string()).into_response(),
		}
	}
}

#[derive(Debug)]
struct Bucket {
	scope: RefreshScope,
	scheduled_at: Instant,
	first_seen_at: Instant,
}

#[derive(Debug, Default)]
struct Pending {
	buckets: HashMap<TargetKey, Bucket>,
	/// Ordered by deadline, ties broken by target
	index: BTreeSet<(Instant, TargetKey)>,
	in_flight: HashSet<TargetKey>,
}

enum Claim {
	Ready(TargetKey, Bucket),
	Wait(Instant),
	Idle,
}

/// Deadline used when `now + debounce` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn schedule_time(
	now: Instant,
	first_seen: Instant,
	debounce: Duration,
	max_wait: Duration,
) -> Instant {
	let candidate = now
		.checked_add(debounce)
		.or_else(|| now.checked_add(FAR_FUTURE))
		.unwrap_or(now);
	if max_wait.is_zero() {
		return candidate;
	}
	// A max-wait past the representable range is no cap at all
	match first_seen.checked_add(max_wait) {
		Some(cap) => candidate.min(cap),
		None => candidate,
	}
}

// RefreshScheduler
#[derive(Clone)]
pub struct RefreshScheduler {
	sink: Arc<dyn RefreshSink>,
	refresh_timeout: Duration,
	pending: Arc<Mutex<Pending>>,
	notify_schedule: Arc<Notify>,
	stopped: Arc<AtomicBool>,
}

impl RefreshScheduler {
	/// `refresh_timeout` bounds every sink call, zero leaves it unbounded
	pub fn new(sink: Arc<dyn RefreshSink>, refresh_timeout: Duration) -> Arc<Self> {
		Arc::new(Self {
			sink,
			refresh_timeout,
			pending: Arc::new(Mutex::new(Pending::default())),
			notify_schedule: Arc::new(Notify::new()),
			stopped: Arc::new(AtomicBool::new(false)),
		})
	}

	/// Spawn the dispatcher task
	pub fn start(&self) {
		let schedule = self.clone();
		tokio::spawn(async move {
			debug!("Refresh dispatcher started");
			loop {
				if schedule.stopped.load(Ordering::Acquire) {
					break;
				}
				match schedule.claim_next(Instant::now()) {
					Claim::Ready(target, bucket) => schedule.spawn_dispatch(target, bucket),
					Claim::Wait(due) => {
						tokio::select! {
							() = tokio::time::sleep_until(due) => (),
							() = schedule.notify_schedule.notified() => (),
						};
					}
					Claim::Idle => schedule.notify_schedule.notified().await,
				}
			}
			debug!("Refresh dispatcher stopped");
		});
	}

	/// Stop the dispatcher. Pending buckets are dropped with the scheduler and
	/// later buffered enqueues are refused.
	pub fn shutdown(&self) {
		self.stopped.store(true, Ordering::Release);
		self.notify_schedule.notify_one();
	}

	/// Number of buckets waiting for dispatch
	pub fn pending(&self) -> usize {
		self.pending.lock().buckets.len()
	}

	/// Request a refresh of `scope` on `target`.
	///
	/// With a zero debounce the refresh runs right away and its result is
	/// returned. Otherwise the request is merged into the target's bucket and
	/// `Queued` is returned without waiting for the dispatcher. Buffered
	/// requests fail with `Error::Internal` once the scheduler is shut down.
	pub async fn enqueue(
		&self,
		target: TargetKey,
		scope: RefreshScope,
		debounce: Duration,
		max_wait: Duration,
	) -> ClResult<EnqueueOutcome> {
		if debounce.is_zero() {
			info!(endpoint = %target, scope = %scope, "Refreshing without buffering");
			return match self.run_sink(&target, &scope).await {
				Ok(msg) => {
					info!(endpoint = %target, scope = %scope, "Refresh completed: {}", msg);
					Ok(EnqueueOutcome::Refreshed(msg))
				}
				Err(err) => {
					warn!(
						endpoint = %target, scope = %scope, status = err.status().as_u16(),
						"Refresh failed: {}", err
					);
					Err(err)
				}
			};
		}

		if self.stopped.load(Ordering::Acquire) {
			warn!(endpoint = %target, scope = %scope, "Refresh dropped, scheduler is shut down");
			return Err(Error::Internal("Refresh scheduler is shut down".into()));
		}

		info!(
			endpoint = %target, scope = %scope, debounce = ?debounce, max_wait = ?max_wait,
			"Refresh queued"
		);
		let now = Instant::now();
		{
			let mut pending = self.pending.lock();
			let pending = &mut *pending;
			let scheduled_at = if let Some(bucket) = pending.buckets.get_mut(&target) {
				pending.index.remove(&(bucket.scheduled_at, target.clone()));
				bucket.scope.merge(scope);
				bucket.scheduled_at = schedule_time(now, bucket.first_seen_at, debounce, max_wait);
				bucket.scheduled_at
			} else {
				let scheduled_at = schedule_time(now, now, debounce, max_wait);
				pending
					.buckets
					.insert(target.clone(), Bucket { scope, scheduled_at, first_seen_at: now });
				scheduled_at
			};
			pending.index.insert((scheduled_at, target));
		}
		self.notify_schedule.notify_one();

		Ok(EnqueueOutcome::Queued)
	}

	/// Remove and return the earliest due bucket whose target is idle
	fn claim_next(&self, now: Instant) -> Claim {
		let mut pending = self.pending.lock();
		let pending = &mut *pending;

		let next = pending.index.iter().find(|(_, target)| !pending.in_flight.contains(target)).cloned();
		let Some((due, target)) = next else {
			return Claim::Idle;
		};
		if due > now {
			return Claim::Wait(due);
		}

		pending.index.remove(&(due, target.clone()));
		let Some(bucket) = pending.buckets.remove(&target) else {
			error!(endpoint = %target, "Scheduled refresh without a pending bucket");
			return Claim::Wait(now);
		};
		pending.in_flight.insert(target.clone());
		Claim::Ready(target, bucket)
	}

	fn spawn_dispatch(&self, target: TargetKey, bucket: Bucket) {
		let schedule = self.clone();
		tokio::spawn(async move {
			let waited = bucket.first_seen_at.elapsed();
			debug!(endpoint = %target, scope = %bucket.scope, waited = ?waited, "Dispatching refresh");

			match schedule.run_sink(&target, &bucket.scope).await {
				Ok(msg) => {
					info!(endpoint = %target, scope = %bucket.scope, "Refresh completed: {}", msg);
				}
				Err(err) => {
					// Not retried, the next webhook for this target creates a new bucket
					error!(
						endpoint = %target, scope = %bucket.scope, status = err.status().as_u16(),
						"Refresh failed: {}", err
					);
				}
			}

			schedule.pending.lock().in_flight.remove(&target);
			schedule.notify_schedule.notify_one();
		});
	}

	async fn run_sink(&self, target: &TargetKey, scope: &RefreshScope) -> ClResult<Box<str>> {
		if self.refresh_timeout.is_zero() {
			return self.sink.refresh(target, scope).await;
		}
		match tokio::time::timeout(self.refresh_timeout, self.sink.refresh(target, scope)).await {
			Ok(res) => res,
			Err(_) => Err(Error::Timeout(self.refresh_timeout)),
		}
	}
}


// vim: ts=4
