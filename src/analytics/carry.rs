//! Peso carry-trade table: for each tracked letra/bono, the yield to
//! maturity against the MEP dollar and against the crawling upper FX band,
//! plus a fixed-date early-exit simulation.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::error;

use crate::constants::{
    table_date, BAND_BASE_VALUE, BAND_MONTHLY_STEP, BAND_START_DATE, CARRY_EXIT_DATE,
    CARRY_EXIT_TEM, CARRY_PRICES, CARRY_TICKERS,
};
use crate::markets::{MarketsClient, SecurityQuote};

use super::days_between;

/// Upper FX band value at `date`. The band starts at its base value and
/// widens 1% per month: pro-rata daily over the stub period to the first
/// monthly anchor, then compounding once per completed calendar month
/// (rounded to whole pesos).
pub fn band_upper_limit(date: NaiveDate) -> f64 {
    let start = table_date(BAND_START_DATE);
    if date <= start {
        return BAND_BASE_VALUE;
    }

    let anchor = start + Duration::days(17);
    if date < anchor {
        let days = days_between(date, start) as f64;
        return BAND_BASE_VALUE * (1.0 + BAND_MONTHLY_STEP * days / 30.0);
    }

    let stub = BAND_BASE_VALUE * (1.0 + BAND_MONTHLY_STEP * 17.0 / 30.0);
    let mut months =
        (date.year() - anchor.year()) * 12 + date.month() as i32 - anchor.month() as i32;
    if date.day() < anchor.day() {
        months -= 1;
    }
    (stub * (1.0 + BAND_MONTHLY_STEP).powi(months)).round()
}

/// One bond's carry metrics. `carries` holds the return against each fixed
/// exit price, flattened into `carry_1000`..`carry_1400` keys.
#[derive(Debug, Clone, Serialize)]
pub struct CarryRow {
    pub symbol: &'static str,
    pub expiration: NaiveDate,
    pub days_to_exp: i64,
    pub bond_price: f64,
    pub payoff: f64,
    pub tna: f64,
    pub tea: f64,
    pub tem: f64,
    pub tem_bid: Option<f64>,
    pub tem_ask: Option<f64>,
    pub mep: f64,
    pub mep_breakeven: f64,
    pub finish_worst: f64,
    pub carry_worst: f64,
    pub carry_mep: f64,
    #[serde(flatten)]
    pub carries: BTreeMap<String, f64>,
}

/// Early-exit economics for bonds still alive at the exit date.
#[derive(Debug, Clone, Serialize)]
pub struct CarryExitRow {
    pub symbol: &'static str,
    pub expiration: NaiveDate,
    pub days_in: i64,
    pub bond_price_in: f64,
    pub bond_price_out: f64,
    pub ars_direct_yield: f64,
    pub ars_tea: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarrySnapshot {
    pub mep: f64,
    pub rows: Vec<CarryRow>,
    pub exit_simulation: Vec<CarryExitRow>,
}

/// Compute carry metrics for every tracked ticker present in `quotes`.
/// Expired bonds and zero prices drop out; rows sort by days to expiry.
pub fn process_bonds(quotes: &[SecurityQuote], mep: f64, today: NaiveDate) -> Vec<CarryRow> {
    let upper_today = band_upper_limit(today);

    let mut rows: Vec<CarryRow> = CARRY_TICKERS
        .iter()
        .filter_map(|prospect| {
            let quote = quotes.iter().find(|q| q.symbol == prospect.ticker)?;
            let expiration = table_date(prospect.maturity);
            let days = days_between(expiration, today);
            if days <= 0 || quote.c <= 0.0 {
                return None;
            }

            let ratio = prospect.final_payoff / quote.c;
            let ann_exp = 365.0 / days as f64;
            let tem_exp = 30.0 / days as f64;
            // Band ceiling projected to expiry, in whole pesos.
            let finish_worst =
                (upper_today * (1.0 + BAND_MONTHLY_STEP).powf(days as f64 / 30.0)).round();

            let carries = CARRY_PRICES
                .iter()
                .map(|price| (format!("carry_{}", *price as u32), ratio * mep / price - 1.0))
                .collect();

            Some(CarryRow {
                symbol: prospect.ticker,
                expiration,
                days_to_exp: days,
                bond_price: quote.c,
                payoff: prospect.final_payoff,
                tna: (ratio - 1.0) * ann_exp,
                tea: ratio.powf(ann_exp) - 1.0,
                tem: ratio.powf(tem_exp) - 1.0,
                tem_bid: (quote.px_bid > 0.0)
                    .then(|| (prospect.final_payoff / quote.px_bid).powf(tem_exp) - 1.0),
                tem_ask: (quote.px_ask > 0.0)
                    .then(|| (prospect.final_payoff / quote.px_ask).powf(tem_exp) - 1.0),
                mep,
                mep_breakeven: mep * ratio,
                finish_worst,
                carry_worst: ratio * mep / finish_worst - 1.0,
                carry_mep: ratio - 1.0,
                carries,
            })
        })
        .collect();

    rows.sort_by_key(|row| row.days_to_exp);
    rows
}

/// Simulate selling at the fixed exit date: remaining cash flows discount
/// at the assumed monthly rate, giving an exit price and the peso yield of
/// the holding period. Bonds expiring on or before the exit date are
/// excluded, and once the exit date has passed the simulation is empty.
pub fn exit_simulation(rows: &[CarryRow], today: NaiveDate) -> Vec<CarryExitRow> {
    let exit_date = table_date(CARRY_EXIT_DATE);
    let days_in = days_between(exit_date, today);
    if days_in <= 0 {
        return Vec::new();
    }

    rows.iter()
        .filter(|row| row.expiration > exit_date)
        .map(|row| {
            let days_out = days_between(row.expiration, exit_date) as f64;
            let bond_price_out = row.payoff / (1.0 + CARRY_EXIT_TEM).powf(days_out / 30.0);
            let ars_direct_yield = bond_price_out / row.bond_price - 1.0;
            let ars_tea = (1.0 + ars_direct_yield).powf(365.0 / days_in as f64) - 1.0;

            CarryExitRow {
                symbol: row.symbol,
                expiration: row.expiration,
                days_in,
                bond_price_in: row.bond_price,
                bond_price_out,
                ars_direct_yield,
                ars_tea,
            }
        })
        .collect()
}

/// Fetch quotes and the MEP rate, then build the full snapshot. A dead
/// quote feed yields an empty table rather than an error.
pub async fn carry_snapshot(markets: &MarketsClient) -> CarrySnapshot {
    let (universe, mep) = tokio::join!(markets.bond_universe(), markets.mep_rate());
    let quotes = match universe {
        Ok(quotes) => quotes,
        Err(e) => {
            error!(error = %e, "quote feed unavailable, carry table empty");
            Vec::new()
        }
    };

    let today = super::today_art();
    let rows = process_bonds(&quotes, mep, today);
    let exit = exit_simulation(&rows, today);
    CarrySnapshot {
        mep,
        rows,
        exit_simulation: exit,
    }
}
