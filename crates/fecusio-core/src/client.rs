// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Fecusio client: cache lookup, remote fetch, fallback, and events.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::EvaluationCache;
use crate::config::{
	parse_base_url, EnvironmentKey, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_TRACKING_INTERVAL,
	ENV_BASE_URL, ENV_ENVIRONMENT_KEY, ENV_TIMEOUT_MS,
};
use crate::error::{FecusioError, Result};
use crate::evaluation::Evaluation;
use crate::event_bus::{EventBus, SharedEventHandler};
use crate::events::FecusioEvent;
use crate::identity::{derive_cache_key, IdentityReference};
use crate::model::{EvaluationResponse, FlagMap, FlagState};
use crate::tracking::{Scheduler, TokioScheduler, TrackingDebouncer};
use crate::transport::{EvaluationTransport, HttpTransport};

/// Result of one `/evaluate` round trip.
pub(crate) enum FetchOutcome {
	Success {
		evaluation: Evaluation,
		response: EvaluationResponse,
	},
	Failure(FecusioError),
}

/// Feature flag client.
///
/// Evaluations are cached per identity context for the lifetime of the
/// client. Fetch failures never surface to callers; they fall back to the
/// configured default flags and are reported as `config-evaluation-failed`
/// events.
pub struct FecusioClient {
	transport: Arc<dyn EvaluationTransport>,
	cache: Mutex<EvaluationCache>,
	bus: Arc<EventBus>,
	tracker: TrackingDebouncer,
	default_flags: FlagMap,
	default_identities: RwLock<Option<Vec<IdentityReference>>>,
}

impl FecusioClient {
	pub fn builder() -> FecusioClientBuilder {
		FecusioClientBuilder::default()
	}

	/// Evaluates flags for an identity context.
	///
	/// `None` uses the configured default identities. Unless `fresh` is set,
	/// a cached evaluation for the same context is returned without any
	/// network call or event. Never fails: on fetch failure an uncached
	/// evaluation of the default flags is returned.
	pub async fn evaluate(
		&self,
		identities: Option<Vec<IdentityReference>>,
		fresh: bool,
	) -> Evaluation {
		let identities = match identities {
			Some(identities) => Some(identities),
			None => self.default_identities.read().clone(),
		};
		let cache_key = derive_cache_key(identities.as_deref());

		if !fresh {
			let cached = self.cache.lock().get(&cache_key).cloned();
			if let Some(evaluation) = cached {
				debug!(cache_key = %cache_key, "Evaluation cache hit");
				return evaluation;
			}
		}

		match self.fetch(identities.as_deref()).await {
			FetchOutcome::Success {
				evaluation,
				response,
			} => {
				self.cache.lock().put(cache_key.as_str(), evaluation.clone());
				debug!(cache_key = %cache_key, fresh, "Stored fetched evaluation");
				self.bus.dispatch(&FecusioEvent::config_succeeded(response));
				evaluation
			}
			FetchOutcome::Failure(error) => {
				warn!(cache_key = %cache_key, error = %error, "Evaluation fetch failed, using default flags");
				self.bus.dispatch(&FecusioEvent::config_failed(error.to_string()));
				self.fallback()
			}
		}
	}

	pub(crate) async fn fetch(&self, identities: Option<&[IdentityReference]>) -> FetchOutcome {
		match self.transport.fetch_evaluation(identities).await {
			Ok(response) => FetchOutcome::Success {
				evaluation: Evaluation::new(response.clone()).with_dispatcher(Arc::clone(&self.bus)),
				response,
			},
			Err(error) => FetchOutcome::Failure(error),
		}
	}

	/// Evaluation of the default flags, bound to the event bus but never cached.
	pub(crate) fn fallback(&self) -> Evaluation {
		Evaluation::from_defaults(self.default_flags.clone()).with_dispatcher(Arc::clone(&self.bus))
	}

	/// Replaces the identities used when `evaluate` is called with `None`.
	pub fn set_default_identities(&self, identities: Option<Vec<IdentityReference>>) {
		*self.default_identities.write() = identities;
	}

	pub fn default_identities(&self) -> Option<Vec<IdentityReference>> {
		self.default_identities.read().clone()
	}

	/// Drops every cached evaluation.
	pub fn clear_cache(&self) {
		self.cache.lock().clear();
	}

	/// Number of cached evaluations.
	pub fn cache_size(&self) -> usize {
		self.cache.lock().len()
	}

	/// Registers an additional event handler.
	///
	/// Returns `false` if this exact handler is already registered.
	pub fn add_event_listener(&self, handler: SharedEventHandler) -> bool {
		self.bus.add_listener(handler)
	}

	/// Sends pending tracking events immediately.
	pub async fn flush_tracking(&self) {
		self.tracker.flush().await;
	}

	/// Number of tracking events waiting for the next flush.
	pub fn pending_tracking_events(&self) -> usize {
		self.tracker.pending()
	}
}

impl std::fmt::Debug for FecusioClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FecusioClient")
			.field("cache_size", &self.cache_size())
			.field("bus", &self.bus)
			.field("tracker", &self.tracker)
			.finish_non_exhaustive()
	}
}

/// Builder for [`FecusioClient`].
pub struct FecusioClientBuilder {
	environment_key: Option<String>,
	default_flags: FlagMap,
	default_identities: Option<Vec<IdentityReference>>,
	base_url: Option<String>,
	timeout: Duration,
	tracking_interval: Duration,
	event_handler: Option<SharedEventHandler>,
	transport: Option<Arc<dyn EvaluationTransport>>,
	scheduler: Option<Arc<dyn Scheduler>>,
	cache: Option<EvaluationCache>,
}

impl Default for FecusioClientBuilder {
	fn default() -> Self {
		Self {
			environment_key: None,
			default_flags: FlagMap::new(),
			default_identities: None,
			base_url: None,
			timeout: DEFAULT_TIMEOUT,
			tracking_interval: DEFAULT_TRACKING_INTERVAL,
			event_handler: None,
			transport: None,
			scheduler: None,
			cache: None,
		}
	}
}

impl FecusioClientBuilder {
	/// Seeds a builder from `FECUSIO_ENVIRONMENT_KEY`, `FECUSIO_BASE_URL`,
	/// and `FECUSIO_TIMEOUT_MS`. Unset variables keep the defaults.
	pub fn from_env() -> Self {
		let mut builder = Self::default();
		if let Ok(key) = std::env::var(ENV_ENVIRONMENT_KEY) {
			builder.environment_key = Some(key);
		}
		if let Ok(url) = std::env::var(ENV_BASE_URL) {
			builder.base_url = Some(url);
		}
		if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
			match raw.parse::<u64>() {
				Ok(ms) => builder.timeout = Duration::from_millis(ms),
				Err(_) => warn!(var = ENV_TIMEOUT_MS, value = %raw, "Ignoring invalid timeout"),
			}
		}
		builder
	}

	/// Sets the environment key sent as `X-Environment-Key`. Required.
	pub fn environment_key(mut self, key: impl Into<String>) -> Self {
		self.environment_key = Some(key.into());
		self
	}

	/// Sets the flags returned when a fetch fails.
	pub fn default_flags(mut self, flags: FlagMap) -> Self {
		self.default_flags = flags;
		self
	}

	/// Adds a single default flag.
	pub fn default_flag(mut self, key: impl Into<String>, enabled: bool) -> Self {
		self.default_flags.insert(key.into(), FlagState { enabled });
		self
	}

	pub fn default_identities(mut self, identities: Vec<IdentityReference>) -> Self {
		self.default_identities = Some(identities);
		self
	}

	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Sets the quiet interval before a tracking batch is flushed.
	pub fn tracking_interval(mut self, interval: Duration) -> Self {
		self.tracking_interval = interval;
		self
	}

	/// Registers a handler alongside the built-in tracker.
	pub fn event_handler(mut self, handler: SharedEventHandler) -> Self {
		self.event_handler = Some(handler);
		self
	}

	/// Replaces the HTTP transport.
	pub fn transport(mut self, transport: Arc<dyn EvaluationTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Replaces the tokio timer used for tracking flushes.
	pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
		self.scheduler = Some(scheduler);
		self
	}

	/// Starts the client with a pre-populated cache.
	///
	/// Entries are bound to the client's event bus on `build()`. Fallback
	/// evaluations are discarded since they are never cached.
	pub fn cache(mut self, cache: EvaluationCache) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Validates the configuration and builds the client.
	///
	/// Without an explicit scheduler this must be called inside a tokio runtime.
	pub fn build(self) -> Result<FecusioClient> {
		let environment_key = self.environment_key.ok_or_else(|| {
			FecusioError::InvalidEnvironmentKey("environment key is required".to_string())
		})?;
		let environment_key = EnvironmentKey::parse(environment_key)?;
		let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

		let transport: Arc<dyn EvaluationTransport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(&base_url, &environment_key, self.timeout)?),
		};
		let scheduler: Arc<dyn Scheduler> = match self.scheduler {
			Some(scheduler) => scheduler,
			None => Arc::new(TokioScheduler::try_current()?),
		};

		let bus = Arc::new(EventBus::new());
		let tracker = TrackingDebouncer::new(Arc::clone(&transport), scheduler, self.tracking_interval);
		bus.add_listener(Arc::new(tracker.clone()));
		if let Some(handler) = self.event_handler {
			bus.add_listener(handler);
		}

		info!(
			base_url = %base_url,
			timeout_ms = self.timeout.as_millis() as u64,
			default_flags = self.default_flags.len(),
			"Fecusio client initialized"
		);

		let mut cache = self.cache.unwrap_or_default();
		cache.bind_all(&bus);

		Ok(FecusioClient {
			transport,
			cache: Mutex::new(cache),
			bus,
			tracker,
			default_flags: self.default_flags,
			default_identities: RwLock::new(self.default_identities),
		})
	}
}
