//! End-to-end tests for the fetch pipeline through the public client
//! surface: query construction, retry exhaustion, breaker transitions and
//! the durable fallback rescue path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;

use macrovivo::bcra::{BcraClient, BcraGateway, HttpReply};
use macrovivo::cache::fallback::{series_key, FallbackStore, KEY_MONETARIAS};
use macrovivo::config::PipelineConfig;
use macrovivo::error::FetchError;
use macrovivo::resilience::CircuitState;

mock! {
    pub Gateway {}

    #[async_trait]
    impl BcraGateway for Gateway {
        async fn execute(&self, path: &str) -> Result<HttpReply, FetchError>;
    }
}

fn test_pipeline() -> PipelineConfig {
    PipelineConfig {
        rate_limit_max: 1000,
        rate_limit_window: Duration::from_millis(10),
        retry_delay: Duration::from_millis(1),
        ..PipelineConfig::default()
    }
}

fn listing_body() -> String {
    r#"{"status":200,"results":[{"idVariable":27,"descripcion":"Inflación mensual (variación en %)","categoria":"Principales Variables","fecha":"2025-07-31","valor":1.9}]}"#
        .to_string()
}

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

/// Read-only fallback store over a fixed map.
struct MapFallback {
    entries: HashMap<String, String>,
}

#[async_trait]
impl FallbackStore for MapFallback {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, FetchError> {
        Ok(self.entries.get(key).cloned())
    }

    async fn put_raw(&self, _key: &str, _body: &str) -> Result<(), FetchError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_series_window_reaches_upstream_query() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_execute()
        .withf(|path| {
            path == "/estadisticas/v3.0/monetarias/45?desde=2025-01-01&hasta=2025-03-31&offset=100&limit=3000"
        })
        .times(1)
        .returning(|_| {
            Ok(HttpReply {
                status: 200,
                body: listing_body(),
            })
        });
    let client = BcraClient::with_gateway(Arc::new(gateway), None, test_pipeline());

    let series = client
        .variable_time_series(
            45,
            Some(date("2025-01-01")),
            Some(date("2025-03-31")),
            100,
            3000,
        )
        .await
        .expect("series fetch");
    assert_eq!(series.results.len(), 1);
}

#[tokio::test]
async fn test_default_series_parameters_produce_bare_path() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_execute()
        .withf(|path| path == "/estadisticas/v3.0/monetarias/27")
        .times(1)
        .returning(|_| {
            Ok(HttpReply {
                status: 200,
                body: listing_body(),
            })
        });
    let client = BcraClient::with_gateway(Arc::new(gateway), None, test_pipeline());

    let series = client
        .variable_time_series(27, None, None, 0, 1000)
        .await
        .expect("series fetch");
    assert_eq!(series.results[0].id_variable, 27);
}

#[tokio::test]
async fn test_fallback_rescues_listing_and_series_after_retries() {
    let mut gateway = MockGateway::new();
    // Two operations, each exhausting the initial attempt plus two retries.
    gateway
        .expect_execute()
        .times(6)
        .returning(|_| Err(FetchError::Network("connection reset".into())));

    let fallback: Arc<dyn FallbackStore> = Arc::new(MapFallback {
        entries: HashMap::from([
            (KEY_MONETARIAS.to_string(), listing_body()),
            (series_key(27), listing_body()),
        ]),
    });
    let client = BcraClient::with_gateway(Arc::new(gateway), Some(fallback), test_pipeline());

    let listing = client.monetary_variables().await.expect("fallback listing");
    assert_eq!(listing.results[0].id_variable, 27);

    let series = client
        .variable_time_series(27, None, None, 0, 1000)
        .await
        .expect("fallback series");
    assert_eq!(series.results[0].valor, 1.9);

    // Each exhausted sequence counts once against the breaker.
    assert_eq!(client.breaker_failures(), 2);
    assert_eq!(client.breaker_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_fallback_miss_surfaces_original_error_and_caches_it() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_execute()
        .times(3)
        .returning(|_| Err(FetchError::Network("connection reset".into())));

    let fallback: Arc<dyn FallbackStore> = Arc::new(MapFallback {
        entries: HashMap::new(),
    });
    let client = BcraClient::with_gateway(Arc::new(gateway), Some(fallback), test_pipeline());

    let err = client.monetary_variables().await.expect_err("no rescue");
    assert!(matches!(err, FetchError::Network(_)));

    // The failure is answered from the error cache; the mock allows no
    // further calls.
    let err = client.monetary_variables().await.expect_err("cached error");
    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_open_breaker_still_serves_fallback() {
    let mut gateway = MockGateway::new();
    gateway.expect_execute().times(1).returning(|_| {
        Ok(HttpReply {
            status: 401,
            body: String::new(),
        })
    });

    let fallback: Arc<dyn FallbackStore> = Arc::new(MapFallback {
        entries: HashMap::from([(KEY_MONETARIAS.to_string(), listing_body())]),
    });
    let pipeline = PipelineConfig {
        breaker_threshold: 1,
        ..test_pipeline()
    };
    let client = BcraClient::with_gateway(Arc::new(gateway), Some(fallback), pipeline);

    // The 401 trips the breaker, yet the caller still gets a payload.
    let listing = client.monetary_variables().await.expect("fallback listing");
    assert_eq!(listing.results.len(), 1);
    assert_eq!(client.breaker_state(), CircuitState::Open);

    // With the breaker open the transport is never touched again.
    let listing = client.monetary_variables().await.expect("fallback listing");
    assert_eq!(listing.results.len(), 1);
}

#[tokio::test]
async fn test_breaker_probe_recovers_after_cooldown() {
    let mut seq = mockall::Sequence::new();
    let mut gateway = MockGateway::new();
    gateway
        .expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(HttpReply {
                status: 401,
                body: String::new(),
            })
        });
    gateway
        .expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(HttpReply {
                status: 200,
                body: listing_body(),
            })
        });

    let pipeline = PipelineConfig {
        breaker_threshold: 1,
        breaker_reset: Duration::from_millis(100),
        ..test_pipeline()
    };
    let client = BcraClient::with_gateway(Arc::new(gateway), None, pipeline);

    let err = client
        .variable_time_series(1, None, None, 0, 1000)
        .await
        .expect_err("401 trips breaker");
    assert_eq!(err, FetchError::Unauthorized);
    assert_eq!(client.breaker_state(), CircuitState::Open);

    // Refused without touching the transport while the cool-down runs.
    let err = client
        .variable_time_series(2, None, None, 0, 1000)
        .await
        .expect_err("refused while open");
    assert_eq!(err, FetchError::CircuitOpen);

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Breaker refusals are not cached, so the same request now wins the
    // probe slot and closes the circuit.
    let series = client
        .variable_time_series(2, None, None, 0, 1000)
        .await
        .expect("probe succeeds");
    assert_eq!(series.results.len(), 1);
    assert_eq!(client.breaker_state(), CircuitState::Closed);
    assert_eq!(client.breaker_failures(), 0);
}
