// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory transport and scheduler doubles for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::error::{FecusioError, Result};
use crate::events::FlagEvaluationSucceededData;
use crate::identity::IdentityReference;
use crate::model::{EvaluationData, EvaluationMeta, EvaluationResponse, FlagMap, FlagState};
use crate::tracking::Scheduler;
use crate::transport::EvaluationTransport;

/// Transport returning scripted `/evaluate` results and recording tracking batches.
#[derive(Default)]
pub(crate) struct MockTransport {
	responses: Mutex<VecDeque<Result<EvaluationResponse>>>,
	fetches: Mutex<Vec<Option<Vec<IdentityReference>>>>,
	batches: Mutex<Vec<Vec<FlagEvaluationSucceededData>>>,
	fail_tracking: AtomicBool,
}

impl MockTransport {
	pub(crate) fn push_response(&self, response: EvaluationResponse) {
		self.responses.lock().push_back(Ok(response));
	}

	pub(crate) fn push_failure(&self, error: FecusioError) {
		self.responses.lock().push_back(Err(error));
	}

	pub(crate) fn fetches(&self) -> Vec<Option<Vec<IdentityReference>>> {
		self.fetches.lock().clone()
	}

	pub(crate) fn fetch_count(&self) -> usize {
		self.fetches.lock().len()
	}

	pub(crate) fn batches(&self) -> Vec<Vec<FlagEvaluationSucceededData>> {
		self.batches.lock().clone()
	}

	pub(crate) fn set_fail_tracking(&self, fail: bool) {
		self.fail_tracking.store(fail, Ordering::SeqCst);
	}
}

#[async_trait]
impl EvaluationTransport for MockTransport {
	async fn fetch_evaluation(
		&self,
		identities: Option<&[IdentityReference]>,
	) -> Result<EvaluationResponse> {
		self.fetches.lock().push(identities.map(<[_]>::to_vec));
		self
			.responses
			.lock()
			.pop_front()
			.unwrap_or_else(|| Err(FecusioError::InvalidResponse("no scripted response".to_string())))
	}

	async fn send_tracking(&self, events: &[FlagEvaluationSucceededData]) -> Result<()> {
		if self.fail_tracking.load(Ordering::SeqCst) {
			return Err(FecusioError::ServerError {
				status: 500,
				message: "mock failure".to_string(),
			});
		}
		self.batches.lock().push(events.to_vec());
		Ok(())
	}
}

/// Collects scheduled tasks so tests decide when timers fire.
#[derive(Default)]
pub(crate) struct ManualScheduler {
	tasks: Mutex<Vec<(Duration, BoxFuture<'static, ()>)>>,
}

impl ManualScheduler {
	pub(crate) fn scheduled(&self) -> Vec<Duration> {
		self.tasks.lock().iter().map(|(delay, _)| *delay).collect()
	}

	pub(crate) fn take_tasks(&self) -> Vec<(Duration, BoxFuture<'static, ()>)> {
		std::mem::take(&mut *self.tasks.lock())
	}

	pub(crate) async fn fire_all(&self) {
		for (_, task) in self.take_tasks() {
			task.await;
		}
	}
}

impl Scheduler for ManualScheduler {
	fn after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
		self.tasks.lock().push((delay, task));
	}
}

pub(crate) fn flag_event(flag: &str) -> FlagEvaluationSucceededData {
	FlagEvaluationSucceededData {
		environment_id: "env_1".to_string(),
		flag_key: flag.to_string(),
		enabled: true,
		timestamp: chrono::Utc::now(),
	}
}

/// Response with the given flags and tracking metadata for `env_1`.
pub(crate) fn response_with(flags: &[(&str, bool)]) -> EvaluationResponse {
	EvaluationResponse {
		data: EvaluationData {
			flags: flags
				.iter()
				.map(|(key, enabled)| (key.to_string(), FlagState { enabled: *enabled }))
				.collect::<FlagMap>(),
		},
		meta: Some(EvaluationMeta {
			organization_id: "org_1".to_string(),
			workspace_id: "ws_1".to_string(),
			environment_id: "env_1".to_string(),
		}),
	}
}
