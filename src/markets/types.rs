//! Wire types for the data912 and comparatasas market feeds.

use serde::{Deserialize, Serialize};

/// Live quote from the data912 feed (notes, bonds and stocks share the
/// same shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityQuote {
    pub symbol: String,
    /// Last traded price.
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub px_bid: f64,
    #[serde(default)]
    pub px_ask: f64,
    #[serde(default)]
    pub q_bid: f64,
    #[serde(default)]
    pub q_ask: f64,
    #[serde(default)]
    pub v: f64,
    #[serde(default)]
    pub q_op: f64,
    #[serde(default)]
    pub pct_change: f64,
}

/// One MEP dollar observation; only the close is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MepQuote {
    pub close: f64,
}

/// A savings/wallet option from the comparatasas aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOption {
    pub pretty_name: String,
    #[serde(default)]
    pub tna: f64,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub pretty_type: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub url: String,
    pub currency: String,
    #[serde(default)]
    pub fund_name: Option<String>,
}

/// Money-market fund snapshot from comparatasas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundData {
    pub nombre: String,
    #[serde(default)]
    pub patrimonio: f64,
    #[serde(default)]
    pub ultimo_vcp: f64,
    #[serde(default)]
    pub penultimo_vcp: f64,
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub ultimo_date: String,
    #[serde(default)]
    pub penultimo_date: String,
    #[serde(default)]
    pub tna: f64,
}
