//! Service configuration loaded from the environment.
//!
//! Everything has a sensible default so the binary runs without a `.env`
//! file; Redis, the cron secret and the TAMAR API key are optional features
//! that stay disabled when their variables are unset.

use std::time::Duration;

/// Environment-driven service settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// BCRA API hostname (no scheme).
    pub bcra_host: String,
    /// Public deployment URL used for the Origin/Referer headers.
    pub public_base_url: String,
    /// data912 market data base URL.
    pub data912_base_url: String,
    /// comparatasas aggregator base URL.
    pub comparatasas_base_url: String,
    /// Redis connection string for the fallback cache (disabled when unset).
    pub redis_url: Option<String>,
    /// Shared secret guarding the cron warm endpoint (endpoint disabled when unset).
    pub cron_secret: Option<String>,
    /// API key for the TAMAR projection helper (call values skipped when unset).
    pub tamar_api_key: Option<String>,
    /// HTTP bind port for `serve`.
    pub port: u16,
    /// Skip TLS verification for the BCRA host. The BCRA endpoint presents a
    /// certificate chain that standard validation rejects, so this defaults
    /// to true, mirroring production behavior.
    pub accept_invalid_certs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bcra_host: "api.bcra.gob.ar".to_string(),
            public_base_url: "https://macrovivo.ar".to_string(),
            data912_base_url: "https://data912.com".to_string(),
            comparatasas_base_url: "https://api.comparatasas.ar".to_string(),
            redis_url: None,
            cron_secret: None,
            tamar_api_key: None,
            port: 8080,
            accept_invalid_certs: true,
        }
    }
}

impl ServiceConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bcra_host: env_or("BCRA_API_HOST", defaults.bcra_host),
            public_base_url: env_or("PUBLIC_BASE_URL", defaults.public_base_url),
            data912_base_url: env_or("DATA912_BASE_URL", defaults.data912_base_url),
            comparatasas_base_url: env_or("COMPARATASAS_BASE_URL", defaults.comparatasas_base_url),
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            cron_secret: std::env::var("CRON_SECRET").ok().filter(|v| !v.is_empty()),
            tamar_api_key: std::env::var("TAMAR_API_KEY").ok().filter(|v| !v.is_empty()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            accept_invalid_certs: std::env::var("BCRA_ACCEPT_INVALID_CERTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.accept_invalid_certs),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Tunables for the upstream fetch pipeline.
///
/// The defaults are the production values; tests shrink the durations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Success entries go stale after this age (on top of the refresh-hour
    /// and day-change rules, see `cache::TtlPolicy`).
    pub cache_ttl: Duration,
    /// Error entries are re-surfaced for this long before a refetch.
    pub error_cache_ttl: Duration,
    /// Upstream admissions per `rate_limit_window`.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Consecutive failures before the breaker opens.
    pub breaker_threshold: u32,
    /// Cool-down before the breaker admits a probe.
    pub breaker_reset: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Base backoff; attempt n waits `retry_delay * (n + 1)`.
    pub retry_delay: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            error_cache_ttl: Duration::from_secs(300),
            rate_limit_max: 60,
            rate_limit_window: Duration::from_secs(60),
            breaker_threshold: 5,
            breaker_reset: Duration::from_secs(60),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
