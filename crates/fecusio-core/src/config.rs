// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration primitives: defaults, credential, and URL validation.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{FecusioError, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://core.fecusio.com/v1/";

/// Default timeout for `/evaluate` and `/evaluations/track` requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Quiet interval between the first tracked flag read and the batched flush.
pub const DEFAULT_TRACKING_INTERVAL: Duration = Duration::from_millis(2000);

/// Environment variable holding the environment key.
pub const ENV_ENVIRONMENT_KEY: &str = "FECUSIO_ENVIRONMENT_KEY";
/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "FECUSIO_BASE_URL";
/// Environment variable overriding the request timeout, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "FECUSIO_TIMEOUT_MS";

const REDACTED: &str = "[REDACTED]";

/// Environment credential sent as `X-Environment-Key`.
///
/// `Debug` and `Display` never print the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvironmentKey(String);

impl EnvironmentKey {
	/// Validates and wraps an environment key.
	///
	/// The key must be non-empty and contain only visible ASCII so it can be
	/// sent as an HTTP header value.
	pub fn parse(key: impl Into<String>) -> Result<Self> {
		let key = key.into();
		if key.trim().is_empty() {
			return Err(FecusioError::InvalidEnvironmentKey(
				"environment key must not be empty".to_string(),
			));
		}
		if !key.chars().all(|c| c.is_ascii_graphic()) {
			return Err(FecusioError::InvalidEnvironmentKey(
				"environment key must contain only visible ASCII characters".to_string(),
			));
		}
		Ok(Self(key))
	}

	/// Returns the raw key. Do not log the result.
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for EnvironmentKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("EnvironmentKey").field(&REDACTED).finish()
	}
}

impl fmt::Display for EnvironmentKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

/// Parses a base URL, requiring an absolute `http` or `https` URL.
pub fn parse_base_url(url: &str) -> Result<Url> {
	let parsed = Url::parse(url).map_err(|e| FecusioError::InvalidBaseUrl(format!("{url}: {e}")))?;
	match parsed.scheme() {
		"http" | "https" => Ok(parsed),
		scheme => Err(FecusioError::InvalidBaseUrl(format!(
			"{url}: unsupported scheme '{scheme}'"
		))),
	}
}

/// Appends `path` to `base`, tolerating a trailing slash on the base.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url> {
	let joined = format!(
		"{}/{}",
		base.as_str().trim_end_matches('/'),
		path.trim_start_matches('/')
	);
	Url::parse(&joined).map_err(|e| FecusioError::InvalidBaseUrl(format!("{joined}: {e}")))
}
