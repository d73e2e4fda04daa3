//! Wire types for the BCRA statistics and debtor-registry APIs.
//!
//! Field names mirror the upstream JSON (Spanish, camelCase) through serde
//! renames, so payloads round-trip unchanged through the fallback store.
//! Nullable upstream fields are `Option` and tolerate being absent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Envelope for the statistics (monetary variables) endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryResponse {
    pub status: u32,
    pub results: Vec<MonetaryVariable>,
}

/// One observation of a monetary variable.
///
/// The listing endpoint populates every field; the per-variable series
/// endpoint omits `descripcion`/`categoria`, which then default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryVariable {
    pub id_variable: u32,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub categoria: String,
    pub fecha: NaiveDate,
    pub valor: f64,
}

/// Envelope for the current-debts endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtResponse {
    pub status: u32,
    pub results: Debtor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    pub identificacion: u64,
    #[serde(default)]
    pub denominacion: Option<String>,
    #[serde(default)]
    pub periodos: Option<Vec<DebtPeriod>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPeriod {
    #[serde(default)]
    pub periodo: Option<String>,
    #[serde(default)]
    pub entidades: Option<Vec<DebtEntity>>,
}

/// A debtor's standing at one reporting entity.
///
/// `situacion` is the regulatory classification, 1 (normal) through 5
/// (irrecoverable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtEntity {
    #[serde(default)]
    pub entidad: Option<String>,
    #[serde(default)]
    pub situacion: Option<u32>,
    #[serde(default)]
    pub fecha_sit1: Option<NaiveDate>,
    #[serde(default)]
    pub monto: Option<f64>,
    #[serde(default)]
    pub dias_atraso_pago: Option<u32>,
    #[serde(default)]
    pub refinanciaciones: bool,
    #[serde(default)]
    pub recategorizacion_oblig: bool,
    #[serde(default)]
    pub situacion_juridica: bool,
    #[serde(default)]
    pub irrec_disposicion_tecnica: bool,
    #[serde(default)]
    pub en_revision: bool,
    #[serde(default)]
    pub proceso_jud: bool,
}

/// Envelope for the 24-month debt history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtHistoryResponse {
    pub status: u32,
    pub results: HistoryDebtor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDebtor {
    pub identificacion: u64,
    #[serde(default)]
    pub denominacion: Option<String>,
    #[serde(default)]
    pub periodos: Option<Vec<HistoryPeriod>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPeriod {
    #[serde(default)]
    pub periodo: Option<String>,
    #[serde(default)]
    pub entidades: Option<Vec<HistoryEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntity {
    #[serde(default)]
    pub entidad: Option<String>,
    #[serde(default)]
    pub situacion: Option<u32>,
    #[serde(default)]
    pub monto: Option<f64>,
    #[serde(default)]
    pub en_revision: bool,
    #[serde(default)]
    pub proceso_jud: bool,
}

/// Envelope for the rejected-cheques endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChequeResponse {
    pub status: u32,
    pub results: RejectedCheques,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCheques {
    pub identificacion: u64,
    #[serde(default)]
    pub denominacion: Option<String>,
    #[serde(default)]
    pub causales: Option<Vec<ChequeCausal>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChequeCausal {
    #[serde(default)]
    pub causal: Option<String>,
    #[serde(default)]
    pub entidades: Option<Vec<ChequeEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChequeEntity {
    #[serde(default)]
    pub entidad: Option<u32>,
    #[serde(default)]
    pub detalle: Option<Vec<ChequeDetail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeDetail {
    pub nro_cheque: u64,
    pub fecha_rechazo: NaiveDate,
    pub monto: f64,
    #[serde(default)]
    pub fecha_pago: Option<NaiveDate>,
    #[serde(default)]
    pub fecha_pago_multa: Option<NaiveDate>,
    #[serde(default)]
    pub estado_multa: Option<String>,
    #[serde(default)]
    pub cta_personal: bool,
    #[serde(default)]
    pub denom_juridica: Option<String>,
    #[serde(default)]
    pub en_revision: bool,
    #[serde(default)]
    pub proceso_jud: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_payload() {
        let body = r#"{
            "status": 200,
            "results": [
                {
                    "idVariable": 27,
                    "descripcion": "Inflación mensual (variación en %)",
                    "categoria": "Principales Variables",
                    "fecha": "2025-02-28",
                    "valor": 2.4
                }
            ]
        }"#;
        let parsed: MonetaryResponse = serde_json::from_str(body).expect("listing parses");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.results[0].id_variable, 27);
        assert_eq!(parsed.results[0].valor, 2.4);
        assert_eq!(
            parsed.results[0].fecha,
            NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid date")
        );
    }

    #[test]
    fn test_parse_series_entry_without_description() {
        // The per-variable endpoint drops descripcion/categoria.
        let body = r#"{
            "status": 200,
            "results": [
                {"idVariable": 45, "fecha": "2025-01-20", "valor": 33.5}
            ]
        }"#;
        let parsed: MonetaryResponse = serde_json::from_str(body).expect("series parses");
        assert_eq!(parsed.results[0].descripcion, "");
        assert_eq!(parsed.results[0].categoria, "");
        assert_eq!(parsed.results[0].valor, 33.5);
    }

    #[test]
    fn test_parse_debt_payload_with_nulls() {
        let body = r#"{
            "status": 200,
            "results": {
                "identificacion": 20123456786,
                "denominacion": "PEREZ JUAN",
                "periodos": [
                    {
                        "periodo": "202501",
                        "entidades": [
                            {
                                "entidad": "BANCO DE LA NACION ARGENTINA",
                                "situacion": 1,
                                "fechaSit1": "2024-11-30",
                                "monto": 1250.5,
                                "diasAtrasoPago": null,
                                "refinanciaciones": false,
                                "recategorizacionOblig": false,
                                "situacionJuridica": false,
                                "irrecDisposicionTecnica": false,
                                "enRevision": false,
                                "procesoJud": false
                            }
                        ]
                    }
                ]
            }
        }"#;
        let parsed: DebtResponse = serde_json::from_str(body).expect("debt parses");
        assert_eq!(parsed.results.identificacion, 20123456786);
        let periods = parsed.results.periodos.expect("has periods");
        let entity = &periods[0].entidades.as_ref().expect("has entities")[0];
        assert_eq!(entity.situacion, Some(1));
        assert_eq!(entity.dias_atraso_pago, None);
        assert!(!entity.proceso_jud);
    }

    #[test]
    fn test_parse_cheque_payload() {
        let body = r#"{
            "status": 200,
            "results": {
                "identificacion": 30712345670,
                "denominacion": "ACME SA",
                "causales": [
                    {
                        "causal": "SIN FONDOS",
                        "entidades": [
                            {
                                "entidad": 11,
                                "detalle": [
                                    {
                                        "nroCheque": 44556677,
                                        "fechaRechazo": "2025-03-10",
                                        "monto": 90000.0,
                                        "fechaPago": null,
                                        "ctaPersonal": true
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        }"#;
        let parsed: ChequeResponse = serde_json::from_str(body).expect("cheques parse");
        let causales = parsed.results.causales.expect("has causales");
        let detail = &causales[0].entidades.as_ref().expect("has entities")[0]
            .detalle
            .as_ref()
            .expect("has detail")[0];
        assert_eq!(detail.nro_cheque, 44556677);
        assert!(detail.fecha_pago.is_none());
        assert!(detail.cta_personal);
        assert!(detail.denom_juridica.is_none());
    }

    #[test]
    fn test_monetary_payload_round_trips_through_fallback_encoding() {
        let original = MonetaryResponse {
            status: 200,
            results: vec![MonetaryVariable {
                id_variable: 1,
                descripcion: "Reservas Internacionales del BCRA".to_string(),
                categoria: "Principales Variables".to_string(),
                fecha: NaiveDate::from_ymd_opt(2025, 8, 15).expect("valid date"),
                valor: 41250.0,
            }],
        };
        let encoded = serde_json::to_string(&original).expect("encodes");
        assert!(encoded.contains("\"idVariable\":1"));
        let decoded: MonetaryResponse = serde_json::from_str(&encoded).expect("decodes");
        assert_eq!(decoded, original);
    }
}
