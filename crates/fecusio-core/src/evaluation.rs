// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Immutable snapshot of resolved flags for one identity context.

use std::sync::Arc;

use crate::event_bus::EventBus;
use crate::events::FecusioEvent;
use crate::model::{EvaluationMeta, EvaluationResponse, FlagMap};

/// Resolved flag states for one identity context.
///
/// Cloning is cheap; clones share the same flag map. When bound to an
/// [`EventBus`] and carrying response metadata, every
/// [`is_feature_enabled`](Self::is_feature_enabled) call dispatches a
/// `flag-evaluation-succeeded` event before returning.
#[derive(Debug, Clone)]
pub struct Evaluation {
	flags: Arc<FlagMap>,
	meta: Option<Arc<EvaluationMeta>>,
	dispatcher: Option<Arc<EventBus>>,
	fallback: bool,
}

impl Evaluation {
	/// Creates an evaluation from an `/evaluate` response.
	pub fn new(response: EvaluationResponse) -> Self {
		Self {
			flags: Arc::new(response.data.flags),
			meta: response.meta.map(Arc::new),
			dispatcher: None,
			fallback: false,
		}
	}

	/// Creates a fallback evaluation from configured default flags.
	///
	/// Fallback evaluations have no metadata and so never emit tracking events.
	pub fn from_defaults(flags: FlagMap) -> Self {
		Self {
			flags: Arc::new(flags),
			meta: None,
			dispatcher: None,
			fallback: true,
		}
	}

	/// Binds this evaluation to an event dispatcher.
	pub fn with_dispatcher(mut self, dispatcher: Arc<EventBus>) -> Self {
		self.dispatcher = Some(dispatcher);
		self
	}

	/// Returns whether `flag_key` is enabled.
	///
	/// Unknown, empty, and disabled keys all resolve to `false`.
	pub fn is_feature_enabled(&self, flag_key: &str) -> bool {
		let enabled = !flag_key.is_empty()
			&& self
				.flags
				.get(flag_key)
				.map(|state| state.enabled)
				.unwrap_or(false);

		if let (Some(dispatcher), Some(meta)) = (&self.dispatcher, &self.meta) {
			dispatcher.dispatch(&FecusioEvent::flag_succeeded(
				meta.environment_id.as_str(),
				flag_key,
				enabled,
			));
		}

		enabled
	}

	/// Returns a copy of every flag in this evaluation. Emits no events.
	pub fn get_all_flags(&self) -> FlagMap {
		self.flags.as_ref().clone()
	}

	/// Tracking metadata from the response, if any.
	pub fn meta(&self) -> Option<&EvaluationMeta> {
		self.meta.as_deref()
	}

	/// True when this evaluation was built from default flags after a failed fetch.
	pub fn is_fallback(&self) -> bool {
		self.fallback
	}
}
