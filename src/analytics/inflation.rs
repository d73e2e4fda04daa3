//! Monthly CPI table and the compound-inflation calculator.
//!
//! The table splices a fixed historical series with live BCRA readings:
//! months the BCRA has already published win over the built-in values, so
//! revisions propagate without a redeploy.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::bcra::request::DEFAULT_SERIES_LIMIT;
use crate::bcra::{BcraClient, MonetaryVariable};
use crate::constants::{HISTORICAL_INFLATION, INFLATION_VARIABLE_ID, LIVE_INFLATION_FROM};
use crate::error::FetchError;

/// Monthly rates as fractions (0.022 = 2.2%), keyed by (year, month).
pub type InflationRates = BTreeMap<(i32, u32), f64>;

pub fn historical_rates() -> InflationRates {
    HISTORICAL_INFLATION
        .iter()
        .map(|&(year, month, rate)| ((year, month), rate))
        .collect()
}

/// Merge live CPI readings over the historical table. The upstream reports
/// whole percentages, so values scale down to fractions here.
pub fn combined_rates(live: &[MonetaryVariable]) -> InflationRates {
    let mut rates = historical_rates();
    for point in live {
        let key = (point.fecha.year(), point.fecha.month());
        rates.insert(key, point.valor / 100.0);
    }
    rates
}

/// Historical table extended with everything published since its cutoff.
/// A dead upstream degrades to the historical table alone.
pub async fn inflation_rates(client: &BcraClient) -> InflationRates {
    let (live_year, live_month) = LIVE_INFLATION_FROM;
    let desde = NaiveDate::from_ymd_opt(live_year, live_month, 1);
    match client
        .variable_time_series(INFLATION_VARIABLE_ID, desde, None, 0, DEFAULT_SERIES_LIMIT)
        .await
    {
        Ok(response) => combined_rates(&response.results),
        Err(e) => {
            warn!(error = %e, "live CPI fetch failed, serving the historical table alone");
            historical_rates()
        }
    }
}

/// Parse a `YYYY-MM` month selector as used by the calculator inputs.
pub fn parse_month(s: &str) -> Result<(i32, u32), FetchError> {
    let invalid =
        || FetchError::InvalidParameter(format!("invalid month '{}', expected YYYY-MM", s));
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

pub fn month_name_es(month: u32) -> &'static str {
    match month {
        1 => "enero",
        2 => "febrero",
        3 => "marzo",
        4 => "abril",
        5 => "mayo",
        6 => "junio",
        7 => "julio",
        8 => "agosto",
        9 => "septiembre",
        10 => "octubre",
        11 => "noviembre",
        12 => "diciembre",
        _ => "",
    }
}

/// Result of compounding a peso amount across a month range. Percentage
/// fields are fractions, not whole percents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InflationSummary {
    pub start_label: String,
    pub end_label: String,
    pub start_value: f64,
    pub end_value: f64,
    pub total_increment: f64,
    pub total_increment_pct: f64,
    pub monthly_avg_pct: f64,
    pub annualized_pct: f64,
    pub total_months: u32,
}

/// Compound `start_value` from `start` (inclusive) to `end` (exclusive):
/// each month's rate applies before advancing, so a January-to-March span
/// covers January and February. Months missing from the table count as
/// zero inflation. An empty or inverted span returns the value unchanged.
pub fn calculate(
    rates: &InflationRates,
    start: (i32, u32),
    start_value: f64,
    end: (i32, u32),
) -> InflationSummary {
    let (start_year, start_month) = start;
    let (end_year, end_month) = end;
    let total_months = (end_year - start_year) * 12 + end_month as i32 - start_month as i32;

    let start_label = format!("{} {}", month_name_es(start_month), start_year);
    let end_label = format!("{} {}", month_name_es(end_month), end_year);

    if total_months <= 0 {
        return InflationSummary {
            start_label,
            end_label,
            start_value,
            end_value: start_value,
            total_increment: 0.0,
            total_increment_pct: 0.0,
            monthly_avg_pct: 0.0,
            annualized_pct: 0.0,
            total_months: 0,
        };
    }

    let mut value = start_value;
    let mut month = start_month;
    let mut year = start_year;
    for _ in 0..total_months {
        let rate = rates.get(&(year, month)).copied().unwrap_or(0.0);
        value *= 1.0 + rate;
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    // Display values round to centavos; the derived rates use the rounded
    // figure so the numbers on screen stay mutually consistent.
    let end_value = (value * 100.0).round() / 100.0;
    let total_increment = end_value - start_value;

    InflationSummary {
        start_label,
        end_label,
        start_value,
        end_value,
        total_increment,
        total_increment_pct: total_increment / start_value,
        monthly_avg_pct: (end_value / start_value).powf(1.0 / total_months as f64) - 1.0,
        annualized_pct: (end_value / start_value).powf(12.0 / total_months as f64) - 1.0,
        total_months: total_months as u32,
    }
}
