// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the `/evaluate` endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::identity::IdentityReference;

/// Map of flag key to resolved state.
pub type FlagMap = HashMap<String, FlagState>;

/// Resolved state of a single flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
	#[serde(default)]
	pub enabled: bool,
}

impl FlagState {
	pub fn enabled() -> Self {
		Self { enabled: true }
	}

	pub fn disabled() -> Self {
		Self { enabled: false }
	}
}

/// Attribution metadata returned alongside evaluated flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationMeta {
	pub organization_id: String,
	pub workspace_id: String,
	pub environment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationData {
	#[serde(default)]
	pub flags: FlagMap,
}

/// Response body of `POST /evaluate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
	pub data: EvaluationData,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub meta: Option<EvaluationMeta>,
}

/// Request body of `POST /evaluate`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub identities: Option<&'a [IdentityReference]>,
}
