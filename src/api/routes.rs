//! Handlers for the statistics, debtor and analytics endpoints.
//!
//! Proxy endpoints (monetarias, deudores, mep) surface pipeline errors
//! through [`ApiError`]; the analytics tables degrade to empty payloads
//! instead, matching their snapshot builders.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::acciones::{self, AccionesSnapshot};
use crate::analytics::carry::{self, CarrySnapshot};
use crate::analytics::duales::{self, CallValueRequest, CallValueResponse, DualesSimulation};
use crate::analytics::fija::{self, FijaSnapshot};
use crate::analytics::inflation::{self, InflationSummary};
use crate::bcra::request::DEFAULT_SERIES_LIMIT;
use crate::bcra::{ChequeResponse, DebtHistoryResponse, DebtResponse, MonetaryResponse};
use crate::error::FetchError;
use crate::markets::MepQuote;

use super::error::ApiError;
use super::AppState;

pub async fn monetarias(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonetaryResponse>, ApiError> {
    Ok(Json(state.bcra.monetary_variables().await?))
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_SERIES_LIMIT
}

pub async fn monetarias_series(
    State(state): State<Arc<AppState>>,
    Path(variable_id): Path<u32>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<MonetaryResponse>, ApiError> {
    let series = state
        .bcra
        .variable_time_series(
            variable_id,
            query.desde,
            query.hasta,
            query.offset,
            query.limit,
        )
        .await?;
    Ok(Json(series))
}

pub async fn debtor(
    State(state): State<Arc<AppState>>,
    Path(cuit): Path<String>,
) -> Result<Json<DebtResponse>, ApiError> {
    let debts = state.bcra.debts(&cuit).await?.ok_or(FetchError::NotFound)?;
    Ok(Json(debts))
}

pub async fn debtor_history(
    State(state): State<Arc<AppState>>,
    Path(cuit): Path<String>,
) -> Result<Json<DebtHistoryResponse>, ApiError> {
    let history = state
        .bcra
        .debt_history(&cuit)
        .await?
        .ok_or(FetchError::NotFound)?;
    Ok(Json(history))
}

pub async fn debtor_cheques(
    State(state): State<Arc<AppState>>,
    Path(cuit): Path<String>,
) -> Result<Json<ChequeResponse>, ApiError> {
    let cheques = state
        .bcra
        .rejected_cheques(&cuit)
        .await?
        .ok_or(FetchError::NotFound)?;
    Ok(Json(cheques))
}

#[derive(Debug, Serialize)]
pub struct MepSnapshot {
    pub rate: f64,
    pub quotes: Vec<MepQuote>,
}

pub async fn mep(State(state): State<Arc<AppState>>) -> Result<Json<MepSnapshot>, ApiError> {
    let quotes = state.markets.mep_quotes().await?;
    // Served from the quote cache populated one line above.
    let rate = state.markets.mep_rate().await;
    Ok(Json(MepSnapshot { rate, quotes }))
}

pub async fn acciones_table(State(state): State<Arc<AppState>>) -> Json<AccionesSnapshot> {
    Json(acciones::acciones_snapshot(&state.bcra, &state.markets).await)
}

pub async fn fija_table(State(state): State<Arc<AppState>>) -> Json<FijaSnapshot> {
    Json(fija::fija_snapshot(&state.markets).await)
}

pub async fn carry_table(State(state): State<Arc<AppState>>) -> Json<CarrySnapshot> {
    Json(carry::carry_snapshot(&state.markets).await)
}

pub async fn duales_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DualesSimulation>, ApiError> {
    let simulation = duales::simulation_data(&state.bcra)
        .await
        .ok_or_else(|| FetchError::Network("TAMAR series unavailable".to_string()))?;
    Ok(Json(simulation))
}

pub async fn duales_call_value(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallValueRequest>,
) -> Result<Json<CallValueResponse>, ApiError> {
    let response = state
        .tamar
        .call_value(&request)
        .await
        .ok_or_else(|| FetchError::Network("TAMAR calculation service unavailable".to_string()))?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct InflationQuery {
    pub desde: String,
    pub hasta: String,
    #[serde(default = "default_monto")]
    pub monto: f64,
}

fn default_monto() -> f64 {
    100.0
}

pub async fn inflacion(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InflationQuery>,
) -> Result<Json<InflationSummary>, ApiError> {
    let start = inflation::parse_month(&query.desde)?;
    let end = inflation::parse_month(&query.hasta)?;
    if !query.monto.is_finite() || query.monto <= 0.0 {
        return Err(
            FetchError::InvalidParameter("monto must be a positive number".to_string()).into(),
        );
    }

    let rates = inflation::inflation_rates(&state.bcra).await;
    Ok(Json(inflation::calculate(&rates, start, query.monto, end)))
}
