// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Synchronous event dispatch with per-handler failure isolation.
//!
//! Handlers run in registration order on the caller's thread. A handler that
//! returns an error or panics is logged and skipped; the remaining handlers
//! still receive the event and the caller never observes the failure.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::HandlerError;
use crate::events::FecusioEvent;

/// Receives events dispatched by the client.
///
/// Handlers are called synchronously on the evaluation path, so they should
/// be fast. Queue expensive work (HTTP requests) instead of doing it inline.
pub trait EventHandler: Send + Sync + 'static {
	fn handle(&self, event: &FecusioEvent) -> Result<(), HandlerError>;
}

/// Type alias for a shared event handler.
///
/// The bus compares handlers by `Arc` identity, so register clones of the
/// same `SharedEventHandler` to avoid duplicates.
pub type SharedEventHandler = Arc<dyn EventHandler>;

struct FnHandler<F>(F);

impl<F> EventHandler for FnHandler<F>
where
	F: Fn(&FecusioEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
{
	fn handle(&self, event: &FecusioEvent) -> Result<(), HandlerError> {
		(self.0)(event)
	}
}

/// Wraps a closure as a [`SharedEventHandler`].
pub fn handler_fn<F>(f: F) -> SharedEventHandler
where
	F: Fn(&FecusioEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
{
	Arc::new(FnHandler(f))
}

fn same_handler(a: &SharedEventHandler, b: &SharedEventHandler) -> bool {
	Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.as_str()
	} else {
		"unknown panic"
	}
}

/// Ordered list of event handlers.
#[derive(Default)]
pub struct EventBus {
	handlers: RwLock<Vec<SharedEventHandler>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a handler.
	///
	/// Returns `false` without registering if this exact handler (same `Arc`)
	/// is already present. Distinct handlers with identical behaviour are
	/// both registered.
	pub fn add_listener(&self, handler: SharedEventHandler) -> bool {
		let mut handlers = self.handlers.write();
		if handlers.iter().any(|h| same_handler(h, &handler)) {
			return false;
		}
		handlers.push(handler);
		true
	}

	/// Dispatches an event to every handler in registration order.
	pub fn dispatch(&self, event: &FecusioEvent) {
		// Snapshot so handlers may register listeners without deadlocking.
		let handlers = self.handlers.read().clone();

		for (index, handler) in handlers.iter().enumerate() {
			match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					warn!(
						event_type = event.event_type(),
						handler_index = index,
						error = %e,
						"Event handler failed"
					);
				}
				Err(payload) => {
					warn!(
						event_type = event.event_type(),
						handler_index = index,
						panic = panic_message(payload.as_ref()),
						"Event handler panicked"
					);
				}
			}
		}
	}

	/// Returns the number of registered handlers.
	pub fn len(&self) -> usize {
		self.handlers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.read().is_empty()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("handlers", &self.len())
			.finish()
	}
}
