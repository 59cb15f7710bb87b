// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use fecusio_core::config::parse_base_url;
use fecusio_core::{
	EnvironmentKey, EvaluationTransport, FecusioError, FlagEvaluationSucceededData, HttpTransport,
	IdentityReference,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer, timeout: Duration) -> HttpTransport {
	let base_url = parse_base_url(&format!("{}/v1/", server.uri())).unwrap();
	let key = EnvironmentKey::parse("env_test_key").unwrap();
	HttpTransport::new(&base_url, &key, timeout).unwrap()
}

#[tokio::test]
async fn evaluate_posts_identities_with_credential_headers() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluate"))
		.and(header("X-Environment-Key", "env_test_key"))
		.and(header("Content-Type", "application/json"))
		.and(header("Accept", "application/json"))
		.and(body_json(json!({
			"identities": ["user-1", {"type": "org", "key": "acme"}]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": {"flags": {"beta": {"enabled": true}}},
			"meta": {"organization_id": "org_1", "workspace_id": "ws_1", "environment_id": "env_1"}
		})))
		.expect(1)
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let identities = vec![
		IdentityReference::id("user-1"),
		IdentityReference::typed("org", "acme"),
	];
	let response = transport.fetch_evaluation(Some(&identities)).await.unwrap();

	assert!(response.data.flags["beta"].enabled);
	assert_eq!(response.meta.unwrap().environment_id, "env_1");
}

#[tokio::test]
async fn evaluate_omits_absent_identities() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluate"))
		.and(body_json(json!({})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"flags": {}}})))
		.expect(1)
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let response = transport.fetch_evaluation(None).await.unwrap();

	assert!(response.data.flags.is_empty());
	assert!(response.meta.is_none());
}

#[tokio::test]
async fn non_success_status_is_server_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluate"))
		.respond_with(ResponseTemplate::new(401).set_body_string("invalid environment key"))
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let err = transport.fetch_evaluation(None).await.unwrap_err();

	match err {
		FecusioError::ServerError { status, message } => {
			assert_eq!(status, 401);
			assert_eq!(message, "invalid environment key");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluate"))
		.respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let err = transport.fetch_evaluation(None).await.unwrap_err();

	assert!(matches!(err, FecusioError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_response_times_out() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluate"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({"data": {"flags": {}}}))
				.set_delay(Duration::from_millis(500)),
		)
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_millis(50));
	let err = transport.fetch_evaluation(None).await.unwrap_err();

	assert!(matches!(err, FecusioError::RequestFailed(_)));
}

#[tokio::test]
async fn tracking_posts_tagged_events() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluations/track"))
		.and(header("X-Environment-Key", "env_test_key"))
		.respond_with(ResponseTemplate::new(202))
		.expect(1)
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let events = vec![
		FlagEvaluationSucceededData {
			environment_id: "env_1".to_string(),
			flag_key: "beta".to_string(),
			enabled: true,
			timestamp: chrono::Utc::now(),
		},
		FlagEvaluationSucceededData {
			environment_id: "env_1".to_string(),
			flag_key: "gamma".to_string(),
			enabled: false,
			timestamp: chrono::Utc::now(),
		},
	];
	transport.send_tracking(&events).await.unwrap();

	let requests = server.received_requests().await.unwrap();
	let body: serde_json::Value = requests[0].body_json().unwrap();
	let sent = body["events"].as_array().unwrap();
	assert_eq!(sent.len(), 2);
	assert_eq!(sent[0]["type"], "flag-evaluation-succeeded");
	assert_eq!(sent[0]["payload"]["flag_key"], "beta");
	assert_eq!(sent[1]["payload"]["flag_key"], "gamma");
	assert_eq!(sent[1]["payload"]["enabled"], false);
}

#[tokio::test]
async fn tracking_failure_is_reported() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/evaluations/track"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;

	let transport = transport_for(&server, Duration::from_secs(5));
	let err = transport.send_tracking(&[]).await.unwrap_err();

	assert!(matches!(err, FecusioError::ServerError { status: 500, .. }));
}
