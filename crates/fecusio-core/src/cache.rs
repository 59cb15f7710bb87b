// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory cache of evaluations keyed by identity context.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::evaluation::Evaluation;
use crate::event_bus::EventBus;

/// Maps cache keys (see [`crate::derive_cache_key`]) to evaluations.
///
/// There is no TTL, size bound, or eviction. Entries live until [`clear`]
/// or until a later `put` for the same key replaces them.
///
/// [`clear`]: EvaluationCache::clear
#[derive(Debug, Default)]
pub struct EvaluationCache {
	entries: HashMap<String, Evaluation>,
}

impl EvaluationCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&Evaluation> {
		self.entries.get(key)
	}

	/// Stores an evaluation, replacing any existing entry for `key`.
	pub fn put(&mut self, key: impl Into<String>, evaluation: Evaluation) {
		self.entries.insert(key.into(), evaluation);
	}

	/// Binds every entry to `dispatcher` and drops fallback entries.
	///
	/// Used when a pre-populated cache is handed to a client, so that reads
	/// from those entries are tracked like freshly fetched ones.
	pub(crate) fn bind_all(&mut self, dispatcher: &Arc<EventBus>) {
		let before = self.entries.len();
		self.entries.retain(|_, evaluation| !evaluation.is_fallback());
		let dropped = before - self.entries.len();
		if dropped > 0 {
			debug!(dropped, "Dropped fallback evaluations from injected cache");
		}

		for evaluation in self.entries.values_mut() {
			*evaluation = evaluation.clone().with_dispatcher(Arc::clone(dispatcher));
		}
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
