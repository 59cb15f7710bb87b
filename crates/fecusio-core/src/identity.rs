// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity references and cache key derivation.
//!
//! An identity context is an ordered list of [`IdentityReference`]s describing
//! who or what flags are evaluated for. Each context maps to exactly one cache
//! key via [`derive_cache_key`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cache key used when no identity context is supplied at all.
pub const DEFAULT_CACHE_KEY: &str = "default";

/// A single entry of an identity context.
///
/// Serialized as either a bare string or a `{"type": ..., "key": ...}` object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentityReference {
	/// A bare identifier such as `"user-1"`.
	Id(String),

	/// A typed identifier such as `{"type": "user", "key": "42"}`.
	Typed {
		#[serde(rename = "type")]
		kind: String,
		key: String,
	},
}

impl IdentityReference {
	/// Creates a bare identifier reference.
	pub fn id(id: impl Into<String>) -> Self {
		IdentityReference::Id(id.into())
	}

	/// Creates a typed `{type, key}` reference.
	pub fn typed(kind: impl Into<String>, key: impl Into<String>) -> Self {
		IdentityReference::Typed {
			kind: kind.into(),
			key: key.into(),
		}
	}
}

impl fmt::Display for IdentityReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IdentityReference::Id(id) => write!(f, "{id}"),
			IdentityReference::Typed { kind, key } => write!(f, "{kind}-{key}"),
		}
	}
}

impl From<&str> for IdentityReference {
	fn from(id: &str) -> Self {
		IdentityReference::Id(id.to_string())
	}
}

impl From<String> for IdentityReference {
	fn from(id: String) -> Self {
		IdentityReference::Id(id)
	}
}

/// Derives the cache key for an identity context.
///
/// `None` maps to [`DEFAULT_CACHE_KEY`]. Otherwise the references are rendered
/// in their given order and joined with `,`, so an empty context yields `""`.
/// Order is significant: `[a, b]` and `[b, a]` produce different keys.
pub fn derive_cache_key(identities: Option<&[IdentityReference]>) -> String {
	match identities {
		None => DEFAULT_CACHE_KEY.to_string(),
		Some(identities) => identities
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(","),
	}
}
