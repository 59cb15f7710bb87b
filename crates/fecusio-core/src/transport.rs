// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport to the Fecusio API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use tracing::debug;

use crate::config::{endpoint_url, EnvironmentKey};
use crate::error::{FecusioError, Result};
use crate::events::FlagEvaluationSucceededData;
use crate::identity::IdentityReference;
use crate::model::{EvaluateRequest, EvaluationResponse};

/// Header carrying the environment credential.
pub const ENVIRONMENT_KEY_HEADER: &str = "X-Environment-Key";

/// Network collaborator used by the client.
///
/// Implemented by [`HttpTransport`]; tests substitute in-memory doubles.
#[async_trait]
pub trait EvaluationTransport: Send + Sync + 'static {
	/// `POST /evaluate` for the given identity context.
	async fn fetch_evaluation(
		&self,
		identities: Option<&[IdentityReference]>,
	) -> Result<EvaluationResponse>;

	/// `POST /evaluations/track` with a batch of flag evaluation events.
	async fn send_tracking(&self, events: &[FlagEvaluationSucceededData]) -> Result<()>;
}

#[derive(Serialize)]
#[serde(tag = "type", rename = "flag-evaluation-succeeded")]
struct TrackedEvent<'a> {
	payload: &'a FlagEvaluationSucceededData,
}

#[derive(Serialize)]
struct TrackRequest<'a> {
	events: Vec<TrackedEvent<'a>>,
}

/// [`EvaluationTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: Client,
	evaluate_url: Url,
	track_url: Url,
}

impl HttpTransport {
	/// Builds a transport sending the credential and JSON headers on every request.
	pub fn new(base_url: &Url, environment_key: &EnvironmentKey, timeout: Duration) -> Result<Self> {
		let mut key = HeaderValue::from_str(environment_key.expose()).map_err(|_| {
			FecusioError::InvalidEnvironmentKey("not a valid header value".to_string())
		})?;
		key.set_sensitive(true);

		let mut headers = HeaderMap::new();
		headers.insert(ENVIRONMENT_KEY_HEADER, key);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = Client::builder()
			.user_agent(user_agent())
			.default_headers(headers)
			.timeout(timeout)
			.build()?;

		Ok(Self {
			client,
			evaluate_url: endpoint_url(base_url, "evaluate")?,
			track_url: endpoint_url(base_url, "evaluations/track")?,
		})
	}

	async fn check_status(response: Response) -> Result<Response> {
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let message = response.text().await.unwrap_or_default();
		Err(FecusioError::ServerError {
			status: status.as_u16(),
			message,
		})
	}
}

#[async_trait]
impl EvaluationTransport for HttpTransport {
	async fn fetch_evaluation(
		&self,
		identities: Option<&[IdentityReference]>,
	) -> Result<EvaluationResponse> {
		debug!(url = %self.evaluate_url, "Fetching evaluation");

		let response = self
			.client
			.post(self.evaluate_url.clone())
			.json(&EvaluateRequest { identities })
			.send()
			.await?;
		let body = Self::check_status(response).await?.bytes().await?;

		serde_json::from_slice(&body).map_err(|e| FecusioError::InvalidResponse(e.to_string()))
	}

	async fn send_tracking(&self, events: &[FlagEvaluationSucceededData]) -> Result<()> {
		debug!(url = %self.track_url, count = events.len(), "Sending tracking batch");

		let body = TrackRequest {
			events: events.iter().map(|payload| TrackedEvent { payload }).collect(),
		};
		let response = self
			.client
			.post(self.track_url.clone())
			.json(&body)
			.send()
			.await?;
		Self::check_status(response).await?;
		Ok(())
	}
}

/// User-Agent sent with every request: `fecusio-core/{version}`.
pub fn user_agent() -> String {
	format!("fecusio-core/{}", env!("CARGO_PKG_VERSION"))
}
