// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Debounced batching of flag evaluation events.
//!
//! [`TrackingDebouncer`] listens on the [`crate::EventBus`] for
//! `flag-evaluation-succeeded` events and queues them. The first event queued
//! while idle arms a single flush after the quiet interval; later events join
//! the same pending flush without resetting the timer. When the timer fires
//! the queue is swapped for an empty one and sent as one
//! `POST /evaluations/track`.
//!
//! Delivery is best-effort and at most once: a failed batch is logged and
//! dropped, never retried or re-queued.
//!
//! Timers go through the [`Scheduler`] trait so the state machine can be
//! driven by a virtual clock in tests.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::error::{FecusioError, HandlerError, Result};
use crate::event_bus::EventHandler;
use crate::events::{FecusioEvent, FlagEvaluationSucceededData};
use crate::transport::EvaluationTransport;

/// Runs a task once after a delay.
pub trait Scheduler: Send + Sync + 'static {
	fn after(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// [`Scheduler`] that spawns a sleeping task on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
	handle: Handle,
}

impl TokioScheduler {
	pub fn new(handle: Handle) -> Self {
		Self { handle }
	}

	/// Uses the runtime the caller is running on.
	pub fn try_current() -> Result<Self> {
		Handle::try_current()
			.map(Self::new)
			.map_err(|_| FecusioError::NoRuntime)
	}
}

impl Scheduler for TokioScheduler {
	fn after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
		self.handle.spawn(async move {
			tokio::time::sleep(delay).await;
			task.await;
		});
	}
}

#[derive(Debug, Default)]
struct QueueState {
	queue: Vec<FlagEvaluationSucceededData>,
	/// Epoch of the pending flush timer; `None` while idle.
	armed: Option<u64>,
	next_epoch: u64,
}

struct DebouncerInner {
	interval: Duration,
	transport: Arc<dyn EvaluationTransport>,
	scheduler: Arc<dyn Scheduler>,
	state: Mutex<QueueState>,
}

impl DebouncerInner {
	async fn flush_armed(&self, epoch: u64) {
		let events = {
			let mut state = self.state.lock();
			if state.armed != Some(epoch) {
				// Superseded by a manual flush.
				return;
			}
			state.armed = None;
			std::mem::take(&mut state.queue)
		};
		self.send(events).await;
	}

	async fn flush_now(&self) {
		let events = {
			let mut state = self.state.lock();
			state.armed = None;
			std::mem::take(&mut state.queue)
		};
		self.send(events).await;
	}

	async fn send(&self, events: Vec<FlagEvaluationSucceededData>) {
		if events.is_empty() {
			debug!("Tracking flush found an empty queue");
			return;
		}

		let count = events.len();
		match self.transport.send_tracking(&events).await {
			Ok(()) => debug!(count, "Flushed tracking batch"),
			Err(e) => error!(error = %e, count, "Failed to flush tracking batch, dropping events"),
		}
	}
}

/// Batches flag evaluation events into debounced `/evaluations/track` calls.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TrackingDebouncer {
	inner: Arc<DebouncerInner>,
}

impl TrackingDebouncer {
	pub fn new(
		transport: Arc<dyn EvaluationTransport>,
		scheduler: Arc<dyn Scheduler>,
		interval: Duration,
	) -> Self {
		Self {
			inner: Arc::new(DebouncerInner {
				interval,
				transport,
				scheduler,
				state: Mutex::new(QueueState::default()),
			}),
		}
	}

	/// Queues an event, arming the flush timer if idle.
	pub fn record(&self, event: FlagEvaluationSucceededData) {
		let arm = {
			let mut state = self.inner.state.lock();
			state.queue.push(event);
			if state.armed.is_some() {
				None
			} else {
				let epoch = state.next_epoch;
				state.next_epoch = state.next_epoch.wrapping_add(1);
				state.armed = Some(epoch);
				Some(epoch)
			}
		};

		if let Some(epoch) = arm {
			debug!(
				interval_ms = self.inner.interval.as_millis() as u64,
				"Armed tracking flush"
			);
			let inner = Arc::clone(&self.inner);
			self
				.inner
				.scheduler
				.after(self.inner.interval, Box::pin(async move {
					inner.flush_armed(epoch).await;
				}));
		}
	}

	/// Sends everything queued right now and returns to idle.
	///
	/// A timer armed earlier still fires but finds nothing to send.
	pub async fn flush(&self) {
		self.inner.flush_now().await;
	}

	/// Number of events waiting for the next flush.
	pub fn pending(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	/// True while a flush timer is pending.
	pub fn is_armed(&self) -> bool {
		self.inner.state.lock().armed.is_some()
	}
}

impl EventHandler for TrackingDebouncer {
	fn handle(&self, event: &FecusioEvent) -> std::result::Result<(), HandlerError> {
		if let FecusioEvent::FlagEvaluationSucceeded(data) = event {
			self.record(data.clone());
		}
		Ok(())
	}
}

impl std::fmt::Debug for TrackingDebouncer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("TrackingDebouncer")
			.field("interval", &self.inner.interval)
			.field("pending", &state.queue.len())
			.field("armed", &state.armed.is_some())
			.finish()
	}
}
