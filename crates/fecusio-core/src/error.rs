// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Fecusio SDK.

use thiserror::Error;

/// Fecusio SDK errors.
///
/// Only configuration errors are ever returned to callers of the client.
/// Transport failures are recovered inside [`crate::FecusioClient`].
#[derive(Debug, Error)]
pub enum FecusioError {
	/// Environment key is missing or malformed.
	#[error("invalid environment key: {0}")]
	InvalidEnvironmentKey(String),

	/// Base URL is missing or invalid.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	/// No tokio runtime was available to schedule tracking flushes.
	#[error("no tokio runtime available; build the client inside a runtime or supply a scheduler")]
	NoRuntime,

	/// HTTP request failed (connect error, timeout, body read).
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned a non-success response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Response body did not have the expected shape.
	#[error("invalid response: {0}")]
	InvalidResponse(String),
}

impl FecusioError {
	/// Returns true for errors raised while configuring the client.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			FecusioError::InvalidEnvironmentKey(_)
				| FecusioError::InvalidBaseUrl(_)
				| FecusioError::NoRuntime
		)
	}
}

/// Result type alias for Fecusio operations.
pub type Result<T> = std::result::Result<T, FecusioError>;

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
