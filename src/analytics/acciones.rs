//! Panel líder stock quotes with year-to-date returns, shown against the
//! CPI accumulated over the same window.

use serde::Serialize;
use tracing::error;

use crate::bcra::request::DEFAULT_SERIES_LIMIT;
use crate::bcra::BcraClient;
use crate::constants::{table_date, INFLATION_VARIABLE_ID, PANEL_LIDER_BASELINE};
use crate::markets::{MarketsClient, SecurityQuote};

use super::round2;

/// YTD baselines and the inflation accumulation both anchor at the start
/// of the year.
const YTD_START_DATE: &str = "2025-01-01";

/// Accumulated percentage change implied by monthly rates given in whole
/// percents. An empty series accumulates to zero.
pub fn compound_pct(monthly_pcts: impl Iterator<Item = f64>) -> f64 {
    let factor: f64 = monthly_pcts.map(|v| 1.0 + v / 100.0).product();
    (factor - 1.0) * 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// CPI accumulated from the start of the year through today, in percent
/// to one decimal. Upstream failures degrade to zero so the stock table
/// still renders.
pub async fn accumulated_inflation(client: &BcraClient) -> f64 {
    let desde = Some(table_date(YTD_START_DATE));
    let hasta = Some(super::today_art());
    match client
        .variable_time_series(INFLATION_VARIABLE_ID, desde, hasta, 0, DEFAULT_SERIES_LIMIT)
        .await
    {
        Ok(response) => round1(compound_pct(response.results.iter().map(|p| p.valor))),
        Err(e) => {
            error!(error = %e, "CPI fetch failed, accumulated inflation shown as zero");
            0.0
        }
    }
}

/// A panel líder quote annotated with its display name and YTD return in
/// percent (two decimals).
#[derive(Debug, Clone, Serialize)]
pub struct StockYtd {
    #[serde(flatten)]
    pub quote: SecurityQuote,
    pub name: &'static str,
    pub ytd_return: f64,
}

/// Join quotes against the year-start baselines. Symbols outside the
/// panel are dropped.
pub fn ytd_returns(quotes: Vec<SecurityQuote>) -> Vec<StockYtd> {
    quotes
        .into_iter()
        .filter_map(|quote| {
            let &(_, name, baseline) = PANEL_LIDER_BASELINE
                .iter()
                .find(|(symbol, _, _)| *symbol == quote.symbol)?;
            let ytd_return = round2((quote.c - baseline) / baseline * 100.0);
            Some(StockYtd {
                quote,
                name,
                ytd_return,
            })
        })
        .collect()
}

pub async fn stocks_with_ytd(markets: &MarketsClient) -> Vec<StockYtd> {
    match markets.arg_stocks().await {
        Ok(quotes) => ytd_returns(quotes),
        Err(e) => {
            error!(error = %e, "stock feed unavailable, acciones table empty");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccionesSnapshot {
    pub accumulated_inflation: f64,
    pub stocks: Vec<StockYtd>,
}

pub async fn acciones_snapshot(bcra: &BcraClient, markets: &MarketsClient) -> AccionesSnapshot {
    let (accumulated, stocks) = tokio::join!(accumulated_inflation(bcra), stocks_with_ytd(markets));
    AccionesSnapshot {
        accumulated_inflation: accumulated,
        stocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, c: f64) -> SecurityQuote {
        SecurityQuote {
            symbol: symbol.to_string(),
            c,
            px_bid: 0.0,
            px_ask: 0.0,
            q_bid: 0.0,
            q_ask: 0.0,
            v: 0.0,
            q_op: 0.0,
            pct_change: 0.0,
        }
    }

    #[test]
    fn test_compound_pct() {
        let acc = compound_pct([3.5, 2.8].into_iter());
        assert!((acc - 6.398).abs() < 1e-9);
        assert_eq!(round1(acc), 6.4);
        assert_eq!(compound_pct(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_ytd_returns_join_and_rounding() {
        let rows = ytd_returns(vec![
            quote("GGAL", 12105.0),
            quote("ALUA", 1000.0),
            quote("NOPE", 500.0),
        ]);

        // Non-panel symbols are dropped.
        assert_eq!(rows.len(), 2);

        let ggal = rows.iter().find(|r| r.quote.symbol == "GGAL").expect("GGAL");
        assert_eq!(ggal.name, "Grupo Galicia");
        // (12105 - 8070) / 8070 * 100 = 50.00
        assert_eq!(ggal.ytd_return, 50.0);

        let alua = rows.iter().find(|r| r.quote.symbol == "ALUA").expect("ALUA");
        // (1000 - 894) / 894 * 100 = 11.8568... -> 11.86
        assert_eq!(alua.ytd_return, 11.86);
    }

    #[test]
    fn test_ytd_returns_empty_input() {
        assert!(ytd_returns(Vec::new()).is_empty());
    }
}
