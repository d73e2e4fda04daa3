//! Fixed-income yield table for the tracked letras and bonos.
//!
//! Settlement is assumed at the next business day (skipping weekends and
//! Argentine market holidays); day counts use both actual/365 (TNA, TEA)
//! and 30/360 months (TEM), matching how these instruments are quoted.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::error;

use crate::constants::{table_date, HOLIDAYS_2025, TICKER_PROSPECT};
use crate::error::FetchError;
use crate::markets::{FundData, MarketsClient, SecurityQuote, WalletOption};

use super::days_between;

/// Annualized simple rate over actual days.
pub fn tna(final_payoff: f64, px: f64, days: i64) -> f64 {
    ((final_payoff / px - 1.0) / days as f64) * 365.0
}

/// Effective monthly rate over 30/360 months.
pub fn tem(final_payoff: f64, px: f64, months: f64) -> f64 {
    (final_payoff / px).powf(1.0 / months) - 1.0
}

/// Effective annual rate over actual days.
pub fn tea(final_payoff: f64, px: f64, days: i64) -> f64 {
    (final_payoff / px).powf(365.0 / days as f64) - 1.0
}

/// 30/360 day count from `start` to `end` (US convention: a 31st becomes
/// the 30th, the end 31st only when the start is already at month end).
pub fn days360(end: NaiveDate, start: NaiveDate) -> i64 {
    let start_day = start.day() as i64;
    let end_day = end.day() as i64;
    let adj_start = if start_day == 31 { 30 } else { start_day };
    let adj_end = if end_day == 31 && adj_start >= 30 { 30 } else { end_day };

    (end.year() as i64 - start.year() as i64) * 360
        + (end.month() as i64 - start.month() as i64) * 30
        + (adj_end - adj_start)
}

/// First settlement date strictly after `from`: the next weekday that is
/// not a market holiday.
pub fn next_business_day(from: NaiveDate) -> NaiveDate {
    let holidays: HashSet<NaiveDate> = HOLIDAYS_2025.iter().map(|s| table_date(s)).collect();
    let mut day = from + Duration::days(1);
    while super::is_weekend(day) || holidays.contains(&day) {
        day += Duration::days(1);
    }
    day
}

/// One instrument's row in the yield table.
#[derive(Debug, Clone, Serialize)]
pub struct FijaRow {
    pub ticker: &'static str,
    pub vencimiento: NaiveDate,
    pub dias: i64,
    pub meses: f64,
    pub px: f64,
    pub pago_final: f64,
    pub tna: f64,
    pub tem: f64,
    pub tea: f64,
}

/// Build the table from live quotes. Letras (S-prefixed) price from the
/// notes feed, bonos (T-prefixed) from the bonds feed; instruments with no
/// quote keep a zero price and zero rates. Matured rows are dropped and
/// the rest sort by days to maturity.
pub fn fija_table(
    letras: &[SecurityQuote],
    bonos: &[SecurityQuote],
    today: NaiveDate,
) -> Vec<FijaRow> {
    let price_for = |ticker: &str| -> f64 {
        let source = match ticker.chars().next() {
            Some('S') => letras,
            Some('T') => bonos,
            _ => return 0.0,
        };
        source
            .iter()
            .find(|q| q.symbol == ticker)
            .map(|q| q.c)
            .unwrap_or(0.0)
    };

    let base_date = next_business_day(today);

    let mut rows: Vec<FijaRow> = TICKER_PROSPECT
        .iter()
        .map(|prospect| {
            let vencimiento = table_date(prospect.maturity);
            let settle = if base_date > vencimiento {
                vencimiento
            } else {
                base_date
            };
            let px = price_for(prospect.ticker);

            let dias = days_between(vencimiento, settle);
            let meses = days360(vencimiento, settle) as f64 / 30.0;

            let tna_v = if px > 0.0 {
                tna(prospect.final_payoff, px, dias)
            } else {
                0.0
            };
            let tem_v = if px > 0.0 && meses > 0.0 {
                tem(prospect.final_payoff, px, meses)
            } else {
                0.0
            };
            let tea_v = if px > 0.0 {
                tea(prospect.final_payoff, px, dias)
            } else {
                0.0
            };

            FijaRow {
                ticker: prospect.ticker,
                vencimiento,
                dias,
                meses,
                px,
                pago_final: prospect.final_payoff,
                tna: tna_v,
                tem: tem_v,
                tea: tea_v,
            }
        })
        .filter(|row| row.dias > 0)
        .collect();

    rows.sort_by_key(|row| row.dias);
    rows
}

/// Full fixed-income view: the yield table plus the wallet and fund rates
/// quoted alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct FijaSnapshot {
    pub rows: Vec<FijaRow>,
    pub billeteras: Vec<WalletOption>,
    pub fondos: Vec<FundData>,
}

fn feed_or_empty<T>(result: Result<Vec<T>, FetchError>, feed: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            error!(feed, error = %e, "feed unavailable, serving empty");
            Vec::new()
        }
    }
}

/// Fetch all four feeds and build the snapshot. Each feed degrades to
/// empty on its own, so one dead upstream never blanks the others.
pub async fn fija_snapshot(markets: &MarketsClient) -> FijaSnapshot {
    let (letras, bonos, billeteras, fondos) = tokio::join!(
        markets.arg_notes(),
        markets.arg_bonds(),
        markets.ars_wallets(),
        markets.money_market_fund(),
    );
    let letras = feed_or_empty(letras, "letras");
    let bonos = feed_or_empty(bonos, "bonos");
    FijaSnapshot {
        rows: fija_table(&letras, &bonos, super::today_art()),
        billeteras: feed_or_empty(billeteras, "billeteras"),
        fondos: feed_or_empty(fondos, "fondos"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn quote(symbol: &str, price: f64) -> SecurityQuote {
        SecurityQuote {
            symbol: symbol.to_string(),
            c: price,
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
    fn test_rate_formulas_at_one_year() {
        // 10% payoff over exactly one year: TNA and TEA coincide.
        assert!((tna(110.0, 100.0, 365) - 0.10).abs() < 1e-12);
        assert!((tea(110.0, 100.0, 365) - 0.10).abs() < 1e-12);
        let monthly = tem(110.0, 100.0, 12.0);
        assert!((((1.0 + monthly).powi(12)) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_days360_month_end_adjustments() {
        assert_eq!(days360(date(2025, 10, 15), date(2025, 8, 22)), 53);
        // A 31st start counts as the 30th.
        assert_eq!(days360(date(2025, 9, 30), date(2025, 8, 31)), 30);
        // End 31st collapses only when the start is at month end.
        assert_eq!(days360(date(2025, 8, 31), date(2025, 7, 31)), 30);
        assert_eq!(days360(date(2025, 8, 31), date(2025, 8, 1)), 30);
    }

    #[test]
    fn test_next_business_day_skips_weekend_and_holiday() {
        // 2025-08-15 is a holiday and the 16th/17th a weekend.
        assert_eq!(next_business_day(date(2025, 8, 14)), date(2025, 8, 18));
        // Plain mid-week day.
        assert_eq!(next_business_day(date(2025, 8, 19)), date(2025, 8, 20));
        // Friday rolls to Monday.
        assert_eq!(next_business_day(date(2025, 8, 22)), date(2025, 8, 25));
    }

    #[test]
    fn test_fija_table_prices_and_ordering() {
        let letras = vec![quote("S30S5", 143.25), quote("S31O5", 120.0)];
        let bonos = vec![quote("T15D5", 151.0)];
        let rows = fija_table(&letras, &bonos, date(2025, 8, 20));

        // Matured instruments are gone.
        assert!(rows.iter().all(|r| r.dias > 0));
        // Sorted ascending by days to maturity.
        assert!(rows.windows(2).all(|w| w[0].dias <= w[1].dias));

        let s30s5 = rows.iter().find(|r| r.ticker == "S30S5").expect("S30S5 present");
        assert_eq!(s30s5.px, 143.25);
        assert!(s30s5.tna > 0.0);
        assert!(s30s5.tem > 0.0);

        // Unquoted instruments keep zero price and zero rates.
        let unquoted = rows.iter().find(|r| r.px == 0.0).expect("some unquoted row");
        assert_eq!(unquoted.tna, 0.0);
        assert_eq!(unquoted.tea, 0.0);
    }

    #[test]
    fn test_fija_settlement_capped_at_maturity() {
        // Once every instrument has matured, settlement caps at maturity and
        // each row drops out (dias == 0) instead of going negative.
        let rows = fija_table(&[], &[], date(2027, 6, 30));
        assert!(rows.is_empty());
    }
}
