//! Resilient client for the BCRA statistics and debtor-registry APIs.
//!
//! Every fetch runs the same pipeline: typed memory cache, circuit breaker,
//! rate limiter, HTTPS request with a browser-equivalent header set, bounded
//! retry with linear backoff, and (for the statistics endpoints) a durable
//! fallback store consulted once the live path is exhausted. Failures are
//! cached under a short TTL so a struggling upstream is not hammered.
//!
//! The transport sits behind [`BcraGateway`] so the whole pipeline can be
//! exercised against a mock.

pub mod debtors;
pub mod request;
pub mod types;

use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::fallback::{self, FallbackStore, RedisFallback};
use crate::cache::{CacheLookup, MemoryCache, TtlPolicy};
use crate::config::{PipelineConfig, ServiceConfig};
use crate::error::FetchError;
use crate::logging::LogThrottle;
use crate::metrics;
use crate::resilience::{CircuitBreaker, CircuitState, UpstreamGate};

pub use types::{
    ChequeResponse, DebtHistoryResponse, DebtResponse, MonetaryResponse, MonetaryVariable,
};

/// One warning per interval when the upstream is failing repeatedly.
const FAILURE_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Raw reply from the upstream, before status mapping and parsing.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Transport seam for the upstream API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BcraGateway: Send + Sync {
    async fn execute(&self, path: &str) -> Result<HttpReply, FetchError>;
}

/// Production transport over reqwest.
pub struct ReqwestGateway {
    client: reqwest::Client,
    host: String,
    headers: reqwest::header::HeaderMap,
}

impl ReqwestGateway {
    pub fn new(config: &ServiceConfig, pipeline: &PipelineConfig) -> Result<Self, FetchError> {
        let headers = request::browser_headers(&config.bcra_host, &config.public_base_url)?;
        // The upstream's certificate chain fails strict validation from some
        // networks, hence the configurable escape hatch.
        let client = reqwest::Client::builder()
            .timeout(pipeline.request_timeout)
            .connect_timeout(pipeline.connect_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            host: config.bcra_host.clone(),
            headers,
        })
    }
}

#[async_trait]
impl BcraGateway for ReqwestGateway {
    async fn execute(&self, path: &str) -> Result<HttpReply, FetchError> {
        let url = format!("https://{}{}", self.host, path);
        debug!(%url, "upstream request");
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

/// Cache key for the statistics endpoints.
///
/// Series keys carry the full query shape so different windows of the same
/// variable never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatsKey {
    Listing,
    Series {
        variable_id: u32,
        desde: Option<NaiveDate>,
        hasta: Option<NaiveDate>,
        offset: u32,
        limit: u32,
    },
}

impl StatsKey {
    fn path(&self) -> String {
        match self {
            StatsKey::Listing => request::monetarias_path(),
            StatsKey::Series {
                variable_id,
                desde,
                hasta,
                offset,
                limit,
            } => request::series_path(*variable_id, *desde, *hasta, *offset, *limit),
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            StatsKey::Listing => "monetarias",
            StatsKey::Series { .. } => "monetarias_series",
        }
    }

    /// Durable-store key. All windows of a variable share one fallback
    /// payload (the warm job writes the canonical three-month window).
    fn fallback_key(&self) -> String {
        match self {
            StatsKey::Listing => fallback::KEY_MONETARIAS.to_string(),
            StatsKey::Series { variable_id, .. } => fallback::series_key(*variable_id),
        }
    }
}

fn validate_series_params(variable_id: u32, limit: u32) -> Result<(), FetchError> {
    if variable_id == 0 {
        return Err(FetchError::InvalidParameter(
            "Invalid variable ID".to_string(),
        ));
    }
    if limit == 0 || limit > request::MAX_SERIES_LIMIT {
        return Err(FetchError::InvalidParameter("Invalid limit".to_string()));
    }
    Ok(())
}

fn outcome_label(err: &FetchError) -> &'static str {
    match err {
        FetchError::Unauthorized => "unauthorized",
        FetchError::NotFound => "not_found",
        FetchError::Parse(_) => "parse_error",
        FetchError::Network(_) => "network_error",
        FetchError::CircuitOpen => "circuit_open",
        FetchError::InvalidParameter(_) => "invalid_parameter",
        FetchError::FallbackUnavailable(_) => "fallback_error",
    }
}

/// Shared, cloneable-by-`Arc` client holding every pipeline stage.
pub struct BcraClient {
    gateway: Arc<dyn BcraGateway>,
    gate: UpstreamGate,
    breaker: CircuitBreaker,
    fallback: Option<Arc<dyn FallbackStore>>,
    stats_cache: MemoryCache<StatsKey, MonetaryResponse>,
    debt_cache: MemoryCache<String, DebtResponse>,
    history_cache: MemoryCache<String, DebtHistoryResponse>,
    cheque_cache: MemoryCache<String, ChequeResponse>,
    failure_throttle: Mutex<LogThrottle>,
    pipeline: PipelineConfig,
}

impl BcraClient {
    /// Build the production client. Connects the fallback store when a
    /// Redis URL is configured; on connection failure the client degrades
    /// to live-only operation rather than refusing to start.
    pub async fn new(config: &ServiceConfig, pipeline: PipelineConfig) -> Result<Self, FetchError> {
        let gateway: Arc<dyn BcraGateway> = Arc::new(ReqwestGateway::new(config, &pipeline)?);

        let fallback: Option<Arc<dyn FallbackStore>> = match &config.redis_url {
            Some(url) => match RedisFallback::connect(url).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e, "fallback store unavailable, continuing without it");
                    None
                }
            },
            None => None,
        };

        Ok(Self::assemble(gateway, fallback, pipeline))
    }

    /// Build a client over a custom transport and fallback store.
    pub fn with_gateway(
        gateway: Arc<dyn BcraGateway>,
        fallback: Option<Arc<dyn FallbackStore>>,
        pipeline: PipelineConfig,
    ) -> Self {
        Self::assemble(gateway, fallback, pipeline)
    }

    fn assemble(
        gateway: Arc<dyn BcraGateway>,
        fallback: Option<Arc<dyn FallbackStore>>,
        pipeline: PipelineConfig,
    ) -> Self {
        let policy = TtlPolicy::daily(pipeline.cache_ttl, pipeline.error_cache_ttl);
        Self {
            gateway,
            gate: UpstreamGate::new(pipeline.rate_limit_max, pipeline.rate_limit_window),
            breaker: CircuitBreaker::new(pipeline.breaker_threshold, pipeline.breaker_reset),
            fallback,
            stats_cache: MemoryCache::new(policy),
            debt_cache: MemoryCache::new(policy),
            history_cache: MemoryCache::new(policy),
            cheque_cache: MemoryCache::new(policy),
            failure_throttle: Mutex::new(LogThrottle::new(FAILURE_LOG_INTERVAL)),
            pipeline,
        }
    }

    /// Full monetary-variables listing (one row per variable, latest value).
    pub async fn monetary_variables(&self) -> Result<MonetaryResponse, FetchError> {
        self.fetch_stats(StatsKey::Listing).await
    }

    /// Time series for one variable over an optional date window.
    ///
    /// `limit` follows the upstream contract: defaults to 1000, hard cap
    /// 3000; anything outside is rejected before touching the network.
    pub async fn variable_time_series(
        &self,
        variable_id: u32,
        desde: Option<NaiveDate>,
        hasta: Option<NaiveDate>,
        offset: u32,
        limit: u32,
    ) -> Result<MonetaryResponse, FetchError> {
        validate_series_params(variable_id, limit)?;
        self.fetch_stats(StatsKey::Series {
            variable_id,
            desde,
            hasta,
            offset,
            limit,
        })
        .await
    }

    async fn fetch_stats(&self, key: StatsKey) -> Result<MonetaryResponse, FetchError> {
        let path = key.path();
        let endpoint = key.endpoint();
        let fallback_key = key.fallback_key();
        self.fetch_cached(
            "stats",
            &self.stats_cache,
            key,
            endpoint,
            &path,
            Some(fallback_key),
        )
        .await
    }

    /// Cache-first fetch shared by every typed operation.
    ///
    /// On a stale entry the pipeline runs once (with its internal retries);
    /// terminal failures consult the fallback store when a key is given,
    /// and are otherwise written back as short-TTL error entries. Breaker
    /// refusals are never cached, the breaker itself already fails fast.
    async fn fetch_cached<K, T>(
        &self,
        cache_name: &'static str,
        cache: &MemoryCache<K, T>,
        key: K,
        endpoint: &'static str,
        path: &str,
        fallback_key: Option<String>,
    ) -> Result<T, FetchError>
    where
        K: Eq + Hash + Clone,
        T: Clone + DeserializeOwned,
    {
        match cache.lookup(&key) {
            CacheLookup::Fresh(value) => {
                metrics::record_cache_event(cache_name, "hit");
                return Ok(value);
            }
            CacheLookup::FreshError(err) => {
                metrics::record_cache_event(cache_name, "error_hit");
                return Err(err);
            }
            CacheLookup::Stale => {
                metrics::record_cache_event(cache_name, "miss");
            }
        }

        match self.run_pipeline::<T>(endpoint, path).await {
            Ok(value) => {
                cache.store_ok(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                if let Some(fb_key) = fallback_key {
                    if let Some(value) = self.fallback_lookup::<T>(&fb_key).await {
                        return Ok(value);
                    }
                }
                if !matches!(err, FetchError::CircuitOpen) {
                    cache.store_err(key, err.clone());
                }
                Err(err)
            }
        }
    }

    /// One pipeline run: bounded retry around [`Self::attempt`].
    ///
    /// Retries cover transport and parse failures only. A 401 counts
    /// against the breaker and surfaces immediately; 404 and breaker
    /// refusals surface immediately without a breaker penalty. An
    /// exhausted retry sequence counts as a single breaker failure.
    async fn run_pipeline<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<T, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt::<T>(endpoint, path).await {
                Ok(value) => {
                    self.breaker.record_success();
                    metrics::set_circuit_state(self.breaker.state());
                    metrics::record_upstream(endpoint, "success");
                    return Ok(value);
                }
                Err(FetchError::CircuitOpen) => {
                    metrics::record_upstream(endpoint, "circuit_open");
                    return Err(FetchError::CircuitOpen);
                }
                Err(FetchError::Unauthorized) => {
                    error!(endpoint, "upstream rejected request with 401");
                    metrics::record_upstream(endpoint, "unauthorized");
                    self.note_breaker_failure(endpoint);
                    return Err(FetchError::Unauthorized);
                }
                Err(err) if err.is_retryable() && attempt < self.pipeline.max_retries => {
                    metrics::record_retry(endpoint);
                    self.warn_throttled(endpoint, &err, attempt);
                    // Linear backoff: 1s after the first failure, then 2s.
                    let delay = self.pipeline.retry_delay * (attempt + 1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    metrics::record_upstream(endpoint, outcome_label(&err));
                    if err.is_breaker_failure() {
                        self.note_breaker_failure(endpoint);
                    }
                    self.warn_throttled(endpoint, &err, attempt);
                    return Err(err);
                }
            }
        }
    }

    /// One upstream attempt: breaker check, rate-limit admission, request,
    /// status mapping, JSON parse.
    async fn attempt<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<T, FetchError> {
        if self.breaker.is_open() {
            return Err(FetchError::CircuitOpen);
        }
        self.gate.acquire().await;

        let started = Instant::now();
        let reply = self.gateway.execute(path).await;
        metrics::record_upstream_latency(endpoint, started.elapsed().as_secs_f64());
        let reply = reply?;

        match reply.status {
            401 => Err(FetchError::Unauthorized),
            404 => Err(FetchError::NotFound),
            s if !(200..300).contains(&s) => Err(FetchError::Network(format!(
                "BCRA API returned HTTP {}",
                s
            ))),
            _ => serde_json::from_str(&reply.body).map_err(FetchError::from),
        }
    }

    async fn fallback_lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.fallback.as_ref()?;
        match store.get_raw(key).await {
            Ok(Some(body)) => match serde_json::from_str(&body) {
                Ok(value) => {
                    metrics::record_fallback_read("hit");
                    info!(key, "serving fallback payload after upstream failure");
                    Some(value)
                }
                Err(e) => {
                    metrics::record_fallback_read("error");
                    error!(key, error = %e, "fallback payload failed to decode");
                    None
                }
            },
            Ok(None) => {
                metrics::record_fallback_read("miss");
                None
            }
            Err(e) => {
                metrics::record_fallback_read("error");
                error!(key, error = %e, "fallback store read failed");
                None
            }
        }
    }

    /// Persist a payload to the fallback store. Used by the warm job; the
    /// request path never writes here.
    pub(crate) async fn mirror_to_fallback<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), FetchError> {
        let store = self.fallback.as_ref().ok_or_else(|| {
            FetchError::FallbackUnavailable("no fallback store configured".to_string())
        })?;
        let body = serde_json::to_string(value)?;
        store.put_raw(key, &body).await
    }

    fn note_breaker_failure(&self, endpoint: &str) {
        let was_open = self.breaker.state() == CircuitState::Open;
        self.breaker.record_failure();
        let state = self.breaker.state();
        if state == CircuitState::Open && !was_open {
            metrics::record_breaker_trip(endpoint);
        }
        metrics::set_circuit_state(state);
    }

    fn warn_throttled(&self, endpoint: &str, err: &FetchError, attempt: u32) {
        let allowed = match self.failure_throttle.lock() {
            Ok(mut throttle) => throttle.check(),
            // A poisoned lock only means another thread panicked mid-check.
            Err(_) => Some(0),
        };
        if let Some(suppressed) = allowed {
            if suppressed > 0 {
                warn!(endpoint, attempt, error = %err, suppressed, "upstream fetch failed");
            } else {
                warn!(endpoint, attempt, error = %err, "upstream fetch failed");
            }
        }
    }

    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn breaker_failures(&self) -> u32 {
        self.breaker.failure_count()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Total entries across all typed caches, for the health report.
    pub fn cached_entries(&self) -> usize {
        self.stats_cache.len()
            + self.debt_cache.len()
            + self.history_cache.len()
            + self.cheque_cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pipeline() -> PipelineConfig {
        PipelineConfig {
            rate_limit_max: 1000,
            rate_limit_window: Duration::from_millis(10),
            retry_delay: Duration::from_millis(1),
            ..PipelineConfig::default()
        }
    }

    fn client_with(gateway: MockBcraGateway, pipeline: PipelineConfig) -> BcraClient {
        BcraClient::with_gateway(Arc::new(gateway), None, pipeline)
    }

    fn listing_body() -> String {
        r#"{"status":200,"results":[{"idVariable":1,"descripcion":"Reservas Internacionales","categoria":"Principales Variables","fecha":"2025-08-15","valor":41250.0}]}"#
            .to_string()
    }

    #[tokio::test]
    async fn test_success_then_served_from_cache() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(1).returning(|_| {
            Ok(HttpReply {
                status: 200,
                body: listing_body(),
            })
        });
        let client = client_with(gateway, test_pipeline());

        let first = client.monetary_variables().await.expect("live fetch");
        assert_eq!(first.results[0].id_variable, 1);
        // The mock allows exactly one call; this one must come from cache.
        let second = client.monetary_variables().await.expect("cached fetch");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_network_errors_retried_then_surfaced() {
        let mut gateway = MockBcraGateway::new();
        // Initial attempt plus two retries.
        gateway
            .expect_execute()
            .times(3)
            .returning(|_| Err(FetchError::Network("connection reset".into())));
        let client = client_with(gateway, test_pipeline());

        let err = client
            .monetary_variables()
            .await
            .expect_err("exhausted retries");
        assert!(matches!(err, FetchError::Network(_)));
        // An exhausted sequence counts once against the breaker.
        assert_eq!(client.breaker_failures(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_fails_without_retry() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(1).returning(|_| {
            Ok(HttpReply {
                status: 401,
                body: String::new(),
            })
        });
        let client = client_with(gateway, test_pipeline());

        let err = client.monetary_variables().await.expect_err("401");
        assert_eq!(err, FetchError::Unauthorized);
        assert_eq!(client.breaker_failures(), 1);
    }

    #[tokio::test]
    async fn test_cached_error_served_without_refetch() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(1).returning(|_| {
            Ok(HttpReply {
                status: 401,
                body: String::new(),
            })
        });
        let client = client_with(gateway, test_pipeline());

        let _ = client.monetary_variables().await;
        // Within the error TTL the cached failure answers; one network call total.
        let err = client.monetary_variables().await.expect_err("cached error");
        assert_eq!(err, FetchError::Unauthorized);
    }

    #[tokio::test]
    async fn test_invalid_limit_rejected_before_network() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(0);
        let client = client_with(gateway, test_pipeline());

        let err = client
            .variable_time_series(27, None, None, 0, 5000)
            .await
            .expect_err("limit above cap");
        assert!(matches!(err, FetchError::InvalidParameter(_)));

        let err = client
            .variable_time_series(0, None, None, 0, 1000)
            .await
            .expect_err("zero variable id");
        assert!(matches!(err, FetchError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_breaker_opens_then_fails_fast() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().returning(|_| {
            Ok(HttpReply {
                status: 401,
                body: String::new(),
            })
        });
        let pipeline = PipelineConfig {
            breaker_threshold: 2,
            ..test_pipeline()
        };
        let client = client_with(gateway, pipeline);

        // Distinct series ids so the error cache does not absorb the calls.
        let _ = client.variable_time_series(1, None, None, 0, 1000).await;
        let _ = client.variable_time_series(2, None, None, 0, 1000).await;
        assert_eq!(client.breaker_state(), CircuitState::Open);

        let err = client
            .variable_time_series(3, None, None, 0, 1000)
            .await
            .expect_err("breaker refusal");
        assert_eq!(err, FetchError::CircuitOpen);
    }

    struct StaticFallback {
        body: String,
    }

    #[async_trait]
    impl FallbackStore for StaticFallback {
        async fn get_raw(&self, _key: &str) -> Result<Option<String>, FetchError> {
            Ok(Some(self.body.clone()))
        }

        async fn put_raw(&self, _key: &str, _body: &str) -> Result<(), FetchError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fallback_served_after_exhausted_retries() {
        let mut gateway = MockBcraGateway::new();
        gateway
            .expect_execute()
            .times(3)
            .returning(|_| Err(FetchError::Network("tls handshake".into())));
        let fallback: Arc<dyn FallbackStore> = Arc::new(StaticFallback {
            body: listing_body(),
        });
        let client =
            BcraClient::with_gateway(Arc::new(gateway), Some(fallback), test_pipeline());

        let result = client.monetary_variables().await.expect("fallback payload");
        assert_eq!(result.results[0].id_variable, 1);
        assert_eq!(result.results[0].valor, 41250.0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(3).returning(|_| {
            Ok(HttpReply {
                status: 200,
                body: "<html>gateway error</html>".to_string(),
            })
        });
        let client = client_with(gateway, test_pipeline());

        let err = client.monetary_variables().await.expect_err("bad body");
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
