// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature flags Rust SDK for Fecusio.
//!
//! This crate fetches flag states for an identity context from the Fecusio
//! evaluation service, caches them per context, and reports which flags were
//! read back to the service in debounced batches.
//!
//! # Features
//!
//! - **Per-context caching**: one cached [`Evaluation`] per identity context
//! - **Graceful degradation**: fetch failures fall back to default flags
//! - **Event bus**: observe config and flag evaluation events
//! - **Usage tracking**: flag reads are batched into one request per quiet interval
//!
//! # Example
//!
//! ```ignore
//! use fecusio_core::{FecusioClient, IdentityReference};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FecusioClient::builder()
//!         .environment_key("env_live_xxx")
//!         .default_flag("new_checkout", false)
//!         .build()?;
//!
//!     let evaluation = client
//!         .evaluate(
//!             Some(vec![
//!                 IdentityReference::id("user-1"),
//!                 IdentityReference::typed("org", "acme"),
//!             ]),
//!             false,
//!         )
//!         .await;
//!
//!     if evaluation.is_feature_enabled("new_checkout") {
//!         // ...
//!     }
//!
//!     client.flush_tracking().await;
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
pub mod config;
mod error;
mod evaluation;
mod event_bus;
pub mod events;
mod identity;
pub mod model;
mod tracking;
mod transport;

#[cfg(test)]
mod testing;

pub use cache::EvaluationCache;
pub use client::{FecusioClient, FecusioClientBuilder};
pub use config::EnvironmentKey;
pub use error::{FecusioError, HandlerError, Result};
pub use evaluation::Evaluation;
pub use event_bus::{handler_fn, EventBus, EventHandler, SharedEventHandler};
pub use events::{
	ConfigEvaluationFailedData, ConfigEvaluationSucceededData, FecusioEvent,
	FlagEvaluationSucceededData,
};
pub use identity::{derive_cache_key, IdentityReference, DEFAULT_CACHE_KEY};
pub use model::{EvaluationMeta, EvaluationResponse, FlagMap, FlagState};
pub use tracking::{Scheduler, TokioScheduler, TrackingDebouncer};
pub use transport::{EvaluationTransport, HttpTransport, ENVIRONMENT_KEY_HEADER};
