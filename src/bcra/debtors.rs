//! Typed fetchers for the central-de-deudores endpoints.
//!
//! All three share the resilient pipeline of the parent module. A 404 from
//! the registry means the identifier has no record and maps to `Ok(None)`.
//! Debtor lookups never consult the durable fallback: personal data is
//! served live or not at all.

use super::request;
use super::types::{ChequeResponse, DebtHistoryResponse, DebtResponse};
use super::BcraClient;
use crate::error::FetchError;

fn validate_cuit(cuit: &str) -> Result<(), FetchError> {
    if cuit.len() == 11 && cuit.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(FetchError::InvalidParameter(format!(
            "invalid CUIT/CUIL: {}",
            cuit
        )))
    }
}

fn absent_on_404<T>(result: Result<T, FetchError>) -> Result<Option<T>, FetchError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(FetchError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

impl BcraClient {
    /// Current debts registered for a CUIT/CUIL.
    pub async fn debts(&self, cuit: &str) -> Result<Option<DebtResponse>, FetchError> {
        validate_cuit(cuit)?;
        let path = request::debts_path(cuit);
        let result = self
            .fetch_cached(
                "debtor",
                &self.debt_cache,
                cuit.to_string(),
                "deudas",
                &path,
                None,
            )
            .await;
        absent_on_404(result)
    }

    /// 24-month debt history for a CUIT/CUIL.
    pub async fn debt_history(
        &self,
        cuit: &str,
    ) -> Result<Option<DebtHistoryResponse>, FetchError> {
        validate_cuit(cuit)?;
        let path = request::debt_history_path(cuit);
        let result = self
            .fetch_cached(
                "debtor",
                &self.history_cache,
                cuit.to_string(),
                "deudas_historicas",
                &path,
                None,
            )
            .await;
        absent_on_404(result)
    }

    /// Rejected cheques registered for a CUIT/CUIL.
    pub async fn rejected_cheques(
        &self,
        cuit: &str,
    ) -> Result<Option<ChequeResponse>, FetchError> {
        validate_cuit(cuit)?;
        let path = request::rejected_cheques_path(cuit);
        let result = self
            .fetch_cached(
                "debtor",
                &self.cheque_cache,
                cuit.to_string(),
                "cheques",
                &path,
                None,
            )
            .await;
        absent_on_404(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{HttpReply, MockBcraGateway};
    use super::*;
    use crate::config::PipelineConfig;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_pipeline() -> PipelineConfig {
        PipelineConfig {
            rate_limit_max: 1000,
            rate_limit_window: Duration::from_millis(10),
            retry_delay: Duration::from_millis(1),
            ..PipelineConfig::default()
        }
    }

    fn client_with(gateway: MockBcraGateway) -> BcraClient {
        BcraClient::with_gateway(Arc::new(gateway), None, test_pipeline())
    }

    fn debt_body() -> String {
        r#"{"status":200,"results":{"identificacion":20123456786,"denominacion":"PEREZ JUAN","periodos":[{"periodo":"202501","entidades":[{"entidad":"BANCO X","situacion":1,"fechaSit1":"2024-11-30","monto":1250.5,"diasAtrasoPago":0,"refinanciaciones":false,"recategorizacionOblig":false,"situacionJuridica":false,"irrecDisposicionTecnica":false,"enRevision":false,"procesoJud":false}]}]}}"#
            .to_string()
    }

    #[tokio::test]
    async fn test_debts_found() {
        let mut gateway = MockBcraGateway::new();
        gateway
            .expect_execute()
            .withf(|path| path == "/centraldedeudores/v1.0/Deudas/20123456786")
            .times(1)
            .returning(|_| {
                Ok(HttpReply {
                    status: 200,
                    body: debt_body(),
                })
            });
        let client = client_with(gateway);

        let debts = client
            .debts("20123456786")
            .await
            .expect("fetch ok")
            .expect("record present");
        assert_eq!(debts.results.identificacion, 20123456786);
    }

    #[tokio::test]
    async fn test_unknown_cuit_maps_to_none_and_is_cached() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(1).returning(|_| {
            Ok(HttpReply {
                status: 404,
                body: String::new(),
            })
        });
        let client = client_with(gateway);

        assert!(client.debts("20999999993").await.expect("no record").is_none());
        // Second probe answered by the cached not-found entry.
        assert!(client.debts("20999999993").await.expect("no record").is_none());
    }

    #[tokio::test]
    async fn test_malformed_cuit_rejected_before_network() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(0);
        let client = client_with(gateway);

        for bad in ["123", "2012345678a", "201234567861"] {
            let err = client.debts(bad).await.expect_err("invalid identifier");
            assert!(matches!(err, FetchError::InvalidParameter(_)));
        }
    }

    #[tokio::test]
    async fn test_server_error_propagates_after_retries() {
        let mut gateway = MockBcraGateway::new();
        gateway.expect_execute().times(3).returning(|_| {
            Ok(HttpReply {
                status: 500,
                body: String::new(),
            })
        });
        let client = client_with(gateway);

        let err = client
            .debt_history("20123456786")
            .await
            .expect_err("upstream failure");
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_cheques_use_dedicated_path() {
        let mut gateway = MockBcraGateway::new();
        gateway
            .expect_execute()
            .withf(|path| path == "/centraldedeudores/v1.0/Deudas/ChequesRechazados/30712345670")
            .times(1)
            .returning(|_| {
                Ok(HttpReply {
                    status: 200,
                    body: r#"{"status":200,"results":{"identificacion":30712345670,"denominacion":"ACME SA","causales":null}}"#
                        .to_string(),
                })
            });
        let client = client_with(gateway);

        let cheques = client
            .rejected_cheques("30712345670")
            .await
            .expect("fetch ok")
            .expect("record present");
        assert!(cheques.results.causales.is_none());
    }
}
