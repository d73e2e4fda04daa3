//! Clients for the public market-data feeds.
//!
//! Unlike the BCRA upstream these feeds are friendly: plain JSON over
//! HTTPS, no header games. Each endpoint gets a fixed-TTL cache (quotes
//! move all day, so no publication-hour rules apply) and failures are
//! cached briefly rather than retried.

pub mod types;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{CacheLookup, MemoryCache, TtlPolicy};
use crate::config::ServiceConfig;
use crate::error::FetchError;
use crate::metrics;

pub use types::{FundData, MepQuote, SecurityQuote, WalletOption};

/// data912 quote feeds go stale after twenty minutes.
const QUOTE_TTL: Duration = Duration::from_secs(1200);

/// Wallet rates change rarely; six hours matches their publication cadence.
const WALLET_TTL: Duration = Duration::from_secs(21600);

/// Fund NAVs update intraday.
const FUND_TTL: Duration = Duration::from_secs(300);

const ERROR_TTL: Duration = Duration::from_secs(300);

const DARUMA_FUND_QUERY: &str = "/funds/rm?name=Cocos%20Daruma%20Renta%20Mixta%20-%20Clase%20A";

/// Median of the finite values, `None` when there are none.
fn median(mut values: Vec<f64>) -> Option<f64> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn only_ars(options: Vec<WalletOption>) -> Vec<WalletOption> {
    options
        .into_iter()
        .filter(|o| o.currency == "ARS")
        .collect()
}

/// Cached access to the data912 and comparatasas feeds.
pub struct MarketsClient {
    http: reqwest::Client,
    data912_base: String,
    comparatasas_base: String,
    quote_cache: MemoryCache<&'static str, Vec<SecurityQuote>>,
    mep_cache: MemoryCache<&'static str, Vec<MepQuote>>,
    wallet_cache: MemoryCache<&'static str, Vec<WalletOption>>,
    fund_cache: MemoryCache<&'static str, Vec<FundData>>,
}

impl MarketsClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            data912_base: config.data912_base_url.clone(),
            comparatasas_base: config.comparatasas_base_url.clone(),
            quote_cache: MemoryCache::new(TtlPolicy::fixed(QUOTE_TTL, ERROR_TTL)),
            mep_cache: MemoryCache::new(TtlPolicy::fixed(QUOTE_TTL, ERROR_TTL)),
            wallet_cache: MemoryCache::new(TtlPolicy::fixed(WALLET_TTL, ERROR_TTL)),
            fund_cache: MemoryCache::new(TtlPolicy::fixed(FUND_TTL, ERROR_TTL)),
        })
    }

    /// Treasury bills (letras) live quotes.
    pub async fn arg_notes(&self) -> Result<Vec<SecurityQuote>, FetchError> {
        let url = format!("{}/live/arg_notes", self.data912_base);
        self.cached_fetch(&self.quote_cache, "arg_notes", url).await
    }

    /// Sovereign bond live quotes.
    pub async fn arg_bonds(&self) -> Result<Vec<SecurityQuote>, FetchError> {
        let url = format!("{}/live/arg_bonds", self.data912_base);
        self.cached_fetch(&self.quote_cache, "arg_bonds", url).await
    }

    /// Panel líder stock quotes.
    pub async fn arg_stocks(&self) -> Result<Vec<SecurityQuote>, FetchError> {
        let url = format!("{}/live/arg_stocks", self.data912_base);
        self.cached_fetch(&self.quote_cache, "arg_stocks", url)
            .await
    }

    /// Notes and bonds concatenated, the pricing universe for the fixed
    /// income tables.
    pub async fn bond_universe(&self) -> Result<Vec<SecurityQuote>, FetchError> {
        let (mut notes, bonds) = tokio::try_join!(self.arg_notes(), self.arg_bonds())?;
        notes.extend(bonds);
        Ok(notes)
    }

    pub async fn mep_quotes(&self) -> Result<Vec<MepQuote>, FetchError> {
        let url = format!("{}/live/mep", self.data912_base);
        self.cached_fetch(&self.mep_cache, "mep", url).await
    }

    /// Median MEP close across venues. Degrades to 0 when the feed is
    /// empty or down, so dependent tables still render.
    pub async fn mep_rate(&self) -> f64 {
        match self.mep_quotes().await {
            Ok(quotes) => match median(quotes.iter().map(|q| q.close).collect()) {
                Some(m) => m,
                None => {
                    warn!("MEP data is empty or unavailable, using 0");
                    0.0
                }
            },
            Err(e) => {
                warn!(error = %e, "MEP feed unavailable, using 0");
                0.0
            }
        }
    }

    /// ARS-denominated wallet and remunerated-account options.
    pub async fn ars_wallets(&self) -> Result<Vec<WalletOption>, FetchError> {
        let url = format!("{}/cuentas-y-billeteras", self.comparatasas_base);
        let options = self
            .cached_fetch(&self.wallet_cache, "wallets", url)
            .await?;
        Ok(only_ars(options))
    }

    /// The money-market fund tracked alongside the wallet options.
    pub async fn money_market_fund(&self) -> Result<Vec<FundData>, FetchError> {
        let url = format!("{}{}", self.comparatasas_base, DARUMA_FUND_QUERY);
        self.cached_fetch(&self.fund_cache, "daruma", url).await
    }

    async fn cached_fetch<T>(
        &self,
        cache: &MemoryCache<&'static str, T>,
        key: &'static str,
        url: String,
    ) -> Result<T, FetchError>
    where
        T: Clone + DeserializeOwned,
    {
        match cache.lookup(&key) {
            CacheLookup::Fresh(value) => {
                metrics::record_cache_event("markets", "hit");
                return Ok(value);
            }
            CacheLookup::FreshError(err) => {
                metrics::record_cache_event("markets", "error_hit");
                return Err(err);
            }
            CacheLookup::Stale => {
                metrics::record_cache_event("markets", "miss");
            }
        }

        match self.fetch_json::<T>(&url).await {
            Ok(value) => {
                cache.store_ok(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                cache.store_err(key, err.clone());
                Err(err)
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url, "market feed request");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "HTTP error {} from {}",
                status.as_u16(),
                url
            )));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(FetchError::from)
    }
}
