// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Events emitted by the client.
//!
//! # Events
//!
//! - `config-evaluation-succeeded` - a fetch from `/evaluate` succeeded
//! - `config-evaluation-failed` - a fetch failed and default flags were used
//! - `flag-evaluation-succeeded` - a flag was read from an [`crate::Evaluation`]
//!
//! Flag evaluation events are what the tracking debouncer batches and posts
//! to `/evaluations/track`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::EvaluationResponse;

/// Events dispatched through the [`crate::EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum FecusioEvent {
	#[serde(rename = "config-evaluation-succeeded")]
	ConfigEvaluationSucceeded(ConfigEvaluationSucceededData),

	#[serde(rename = "config-evaluation-failed")]
	ConfigEvaluationFailed(ConfigEvaluationFailedData),

	#[serde(rename = "flag-evaluation-succeeded")]
	FlagEvaluationSucceeded(FlagEvaluationSucceededData),
}

impl FecusioEvent {
	/// Returns the event type name as a string.
	pub fn event_type(&self) -> &'static str {
		match self {
			FecusioEvent::ConfigEvaluationSucceeded(_) => "config-evaluation-succeeded",
			FecusioEvent::ConfigEvaluationFailed(_) => "config-evaluation-failed",
			FecusioEvent::FlagEvaluationSucceeded(_) => "flag-evaluation-succeeded",
		}
	}

	pub fn config_succeeded(response: EvaluationResponse) -> Self {
		FecusioEvent::ConfigEvaluationSucceeded(ConfigEvaluationSucceededData { response })
	}

	pub fn config_failed(error: impl Into<String>) -> Self {
		FecusioEvent::ConfigEvaluationFailed(ConfigEvaluationFailedData {
			error: error.into(),
		})
	}

	pub fn flag_succeeded(
		environment_id: impl Into<String>,
		flag_key: impl Into<String>,
		enabled: bool,
	) -> Self {
		FecusioEvent::FlagEvaluationSucceeded(FlagEvaluationSucceededData {
			environment_id: environment_id.into(),
			flag_key: flag_key.into(),
			enabled,
			timestamp: Utc::now(),
		})
	}
}

/// Payload of `config-evaluation-succeeded`: the raw `/evaluate` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEvaluationSucceededData {
	pub response: EvaluationResponse,
}

/// Payload of `config-evaluation-failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEvaluationFailedData {
	/// Rendered transport error.
	pub error: String,
}

/// Payload of `flag-evaluation-succeeded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEvaluationSucceededData {
	pub environment_id: String,
	pub flag_key: String,
	pub enabled: bool,
	pub timestamp: DateTime<Utc>,
}
