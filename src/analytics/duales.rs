//! Dual-bond (TAMAR/fija) simulation.
//!
//! From the observed TAMAR series the module builds monthly spot rates,
//! projects them linearly toward a grid of scenario targets through the
//! end of 2026, and takes expanding averages of the blended series. Each
//! bond then pays max(projected average - fixed rate, 0) compounded over
//! its life, which is what the sobretasa and payoff tables show.

use std::collections::BTreeMap;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::bcra::request::MAX_SERIES_LIMIT;
use crate::bcra::{BcraClient, MonetaryVariable};
use crate::config::ServiceConfig;
use crate::constants::{
    table_date, DUALES_PAYOFF_BASE_DATE, DUALES_TARGET_DATE, DUAL_BONDS, REM_25, REM_50, REM_75,
    SCENARIO_TEM_MAX, SCENARIO_TEM_MIN, SCENARIO_TEM_STEP, TAMAR_FILTER_DATE, TAMAR_VARIABLE_ID,
};
use crate::error::FetchError;

use super::{days_between, is_weekend, round2};

/// One projection target: monthly rate plus its display label ("1.5" for
/// 1.5% monthly).
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub label: String,
    pub target_tem: f64,
}

/// REM survey percentiles (divided to monthly) plus the fixed grid.
/// Labels carry one decimal of monthly percent; when two targets collide
/// on a label (the REM median rounds to 1.5% like the grid point does),
/// the grid value wins and the label appears once.
pub fn scenario_grid() -> Vec<Scenario> {
    let mut targets = vec![REM_25 / 12.0, REM_50 / 12.0, REM_75 / 12.0];
    let steps = ((SCENARIO_TEM_MAX - SCENARIO_TEM_MIN) / SCENARIO_TEM_STEP).round() as u32;
    for i in 0..=steps {
        let tem = SCENARIO_TEM_MIN + i as f64 * SCENARIO_TEM_STEP;
        targets.push((tem * 10_000.0).round() / 10_000.0);
    }

    let mut by_label: BTreeMap<String, f64> = BTreeMap::new();
    for tem in targets {
        by_label.insert(format!("{:.1}", tem * 100.0), tem);
    }

    by_label
        .into_iter()
        .map(|(label, target_tem)| Scenario { label, target_tem })
        .collect()
}

/// Running mean over the defined entries seen so far; `None` until the
/// first defined value.
fn expanding_mean(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut means = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut count = 0u32;
    for value in values.iter().copied() {
        if let Some(v) = value {
            if v.is_finite() {
                sum += v;
                count += 1;
            }
        }
        means.push((count > 0).then(|| sum / count as f64));
    }
    means
}

/// Calendar split of `end - start` into whole years, whole months and
/// leftover days, clamping month ends the way calendar arithmetic does
/// (Jan 29 + 1 month = Feb 28).
fn relative_parts(end: NaiveDate, start: NaiveDate) -> (u32, u32, i64) {
    let mut years: u32 = 0;
    while start + Months::new((years + 1) * 12) <= end {
        years += 1;
    }
    let after_years = start + Months::new(years * 12);

    let mut months: u32 = 0;
    while after_years + Months::new(months + 1) <= end {
        months += 1;
    }
    let after_months = after_years + Months::new(months);

    (years, months, days_between(end, after_months))
}

/// Month count used as the payoff exponent: whole months plus a 30-day
/// fraction tail.
fn payoff_months(event: NaiveDate, base: NaiveDate) -> f64 {
    let (years, months, days) = relative_parts(event, base);
    (years * 12 + months) as f64 + days as f64 / 30.0
}

/// One date on the chart. Spot history and projections never overlap:
/// observed dates carry `tamar_tem_spot`, future weekdays carry one
/// projection per scenario label.
#[derive(Debug, Clone, Serialize)]
pub struct DualesChartPoint {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tamar_tem_spot: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tamar_avg: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fixed_rates: BTreeMap<&'static str, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub projections: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub projection_avgs: BTreeMap<String, f64>,
}

impl DualesChartPoint {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tamar_tem_spot: None,
            tamar_avg: None,
            fixed_rates: BTreeMap::new(),
            projections: BTreeMap::new(),
            projection_avgs: BTreeMap::new(),
        }
    }
}

/// One scenario's row in the sobretasa or payoff table, values in percent
/// keyed by bond ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRow {
    pub label: String,
    pub values: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DualesSimulation {
    pub chart: Vec<DualesChartPoint>,
    pub sobretasa_rows: Vec<ScenarioRow>,
    pub payoff_rows: Vec<ScenarioRow>,
    /// Payoff exponent per bond, in months (two decimals).
    pub meses: BTreeMap<&'static str, f64>,
    pub event_dates: BTreeMap<&'static str, NaiveDate>,
}

/// Build the simulation from raw TAMAR observations. Returns `None` when
/// there is nothing to work with.
pub fn build_simulation(tamar: &[MonetaryVariable], today: NaiveDate) -> Option<DualesSimulation> {
    if tamar.is_empty() {
        return None;
    }

    // Annual rates to monthly spots, oldest first, early history dropped.
    let filter_date = table_date(TAMAR_FILTER_DATE);
    let mut spots: Vec<(NaiveDate, f64)> = tamar
        .iter()
        .filter(|p| p.fecha > filter_date)
        .map(|p| (p.fecha, (1.0 + p.valor / 100.0).powf(1.0 / 12.0) - 1.0))
        .collect();
    spots.sort_by_key(|(date, _)| *date);

    let tem_actual = spots.last().map(|(_, v)| *v).unwrap_or(0.0);
    let start_projection = spots.last().map(|(date, _)| *date).unwrap_or(today) + Duration::days(1);
    let end_projection = table_date(DUALES_TARGET_DATE);

    let mut future_dates = Vec::new();
    let mut day = start_projection;
    while day <= end_projection {
        if !is_weekend(day) {
            future_dates.push(day);
        }
        day += Duration::days(1);
    }

    let dias_totales = match (future_dates.first(), future_dates.last()) {
        (Some(first), Some(last)) => days_between(*last, *first),
        _ => 0,
    };

    let scenarios = scenario_grid();

    let mut points: BTreeMap<NaiveDate, DualesChartPoint> = BTreeMap::new();
    for (date, value) in &spots {
        points
            .entry(*date)
            .or_insert_with(|| DualesChartPoint::new(*date))
            .tamar_tem_spot = Some(*value);
    }

    // Linear ramp from the last observed spot toward each scenario target.
    for scenario in &scenarios {
        for date in &future_dates {
            let projected = if dias_totales > 0 {
                let elapsed = days_between(*date, future_dates[0]) as f64;
                tem_actual + (scenario.target_tem - tem_actual) * elapsed / dias_totales as f64
            } else {
                scenario.target_tem
            };
            points
                .entry(*date)
                .or_insert_with(|| DualesChartPoint::new(*date))
                .projections
                .insert(scenario.label.clone(), projected);
        }
    }

    let dates: Vec<NaiveDate> = points.keys().copied().collect();

    let spot_series: Vec<Option<f64>> = dates.iter().map(|d| points[d].tamar_tem_spot).collect();
    for (date, avg) in dates.iter().zip(expanding_mean(&spot_series)) {
        if let Some(point) = points.get_mut(date) {
            point.tamar_avg = avg;
        }
    }

    // Each bond shows its fixed rate up to and including its payoff event.
    for &(ticker, event, fixed) in DUAL_BONDS {
        let event_date = table_date(event);
        for (date, point) in points.iter_mut() {
            if *date <= event_date {
                point.fixed_rates.insert(ticker, fixed);
            }
        }
    }

    // Expanding average of observed history blended with each projection.
    for scenario in &scenarios {
        let blended: Vec<Option<f64>> = dates
            .iter()
            .map(|d| {
                let point = &points[d];
                point
                    .tamar_tem_spot
                    .or_else(|| point.projections.get(&scenario.label).copied())
            })
            .collect();
        for (date, avg) in dates.iter().zip(expanding_mean(&blended)) {
            if let Some(value) = avg {
                if let Some(point) = points.get_mut(date) {
                    point.projection_avgs.insert(scenario.label.clone(), value);
                }
            }
        }
    }

    let chart: Vec<DualesChartPoint> = points.into_values().collect();

    // Sobretasa: scenario average minus the fixed rate at the payoff
    // event, floored at zero.
    let mut sobretasa: BTreeMap<&'static str, BTreeMap<String, f64>> = BTreeMap::new();
    for &(ticker, event, fixed) in DUAL_BONDS {
        let event_date = table_date(event);
        let per_scenario = sobretasa.entry(ticker).or_default();
        if let Some(point) = chart.iter().find(|p| p.date >= event_date) {
            for scenario in &scenarios {
                let excess = point
                    .projection_avgs
                    .get(&scenario.label)
                    .map(|avg| (avg - fixed).max(0.0))
                    .unwrap_or(0.0);
                per_scenario.insert(scenario.label.clone(), excess);
            }
        }
    }

    let payoff_base = table_date(DUALES_PAYOFF_BASE_DATE);
    let mut meses_exact: BTreeMap<&'static str, f64> = BTreeMap::new();
    for &(ticker, event, _) in DUAL_BONDS {
        meses_exact.insert(ticker, payoff_months(table_date(event), payoff_base));
    }

    let mut sobretasa_rows = Vec::with_capacity(scenarios.len());
    let mut payoff_rows = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        let mut tem_values = BTreeMap::new();
        let mut payoff_values = BTreeMap::new();
        for &(ticker, _, _) in DUAL_BONDS {
            let excess = sobretasa
                .get(ticker)
                .and_then(|per| per.get(&scenario.label))
                .copied()
                .unwrap_or(0.0);
            tem_values.insert(ticker, round2(excess * 100.0));

            let months = meses_exact.get(ticker).copied().unwrap_or(0.0);
            payoff_values.insert(ticker, round2(((1.0 + excess).powf(months) - 1.0) * 100.0));
        }
        let label = format!("TAMAR {}%", scenario.label);
        sobretasa_rows.push(ScenarioRow {
            label: label.clone(),
            values: tem_values,
        });
        payoff_rows.push(ScenarioRow {
            label,
            values: payoff_values,
        });
    }

    let meses = meses_exact
        .into_iter()
        .map(|(ticker, months)| (ticker, round2(months)))
        .collect();
    let event_dates = DUAL_BONDS
        .iter()
        .map(|&(ticker, event, _)| (ticker, table_date(event)))
        .collect();

    Some(DualesSimulation {
        chart,
        sobretasa_rows,
        payoff_rows,
        meses,
        event_dates,
    })
}

/// Fetch the TAMAR series and run the simulation. Upstream failures and
/// an empty series both resolve to `None`.
pub async fn simulation_data(client: &BcraClient) -> Option<DualesSimulation> {
    let tamar = match client
        .variable_time_series(TAMAR_VARIABLE_ID, None, None, 0, MAX_SERIES_LIMIT)
        .await
    {
        Ok(response) => response.results,
        Err(e) => {
            error!(error = %e, "TAMAR series fetch failed");
            Vec::new()
        }
    };
    build_simulation(&tamar, super::today_art())
}

const TAMAR_CALL_URL: &str = "https://tmalamud.pythonanywhere.com/api/tamar-calculation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallValueRequest {
    pub target_mean: f64,
    pub target_prob: f64,
    pub threshold: f64,
    pub min_val: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPoint {
    #[serde(rename = "TAMAR_DIC_26_pct")]
    pub tamar_dic_26_pct: f64,
    #[serde(rename = "TAMAR_MEAN")]
    pub tamar_mean: f64,
    pub fixed_amort_b100: f64,
    pub proba_pct: f64,
    pub tamar_amort_b100: f64,
    pub tamar_diff_b100: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallValueResponse {
    pub call_value_b100: f64,
    pub distribution_data: Vec<DistributionPoint>,
}

/// Client for the external TAMAR call-value calculator. Every failure
/// mode resolves to `None` so the simulation page renders without the
/// optional distribution overlay.
pub struct TamarCallClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl TamarCallClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_key: config.tamar_api_key.clone(),
        })
    }

    pub async fn call_value(&self, request: &CallValueRequest) -> Option<CallValueResponse> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                error!("TAMAR API key not configured, skipping call-value request");
                return None;
            }
        };

        let response = match self
            .http
            .post(TAMAR_CALL_URL)
            .header("x-api-key", api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "call-value request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), "call-value request rejected");
            return None;
        }

        match response.json::<CallValueResponse>().await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, "call-value response malformed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn tamar_point(y: i32, m: u32, d: u32, valor: f64) -> MonetaryVariable {
        MonetaryVariable {
            id_variable: TAMAR_VARIABLE_ID,
            descripcion: String::new(),
            categoria: String::new(),
            fecha: date(y, m, d),
            valor,
        }
    }

    #[test]
    fn test_scenario_grid_dedupes_colliding_labels() {
        let scenarios = scenario_grid();
        assert_eq!(scenarios.len(), 13);

        // The REM median (0.1851/12 = 1.54% monthly) collides with the 1.5%
        // grid point; the grid target wins.
        let mid = scenarios.iter().find(|s| s.label == "1.5").expect("1.5 present");
        assert!((mid.target_tem - 0.015).abs() < 1e-12);

        // The other REM percentiles keep their own labels and targets.
        let low = scenarios.iter().find(|s| s.label == "1.3").expect("1.3 present");
        assert!((low.target_tem - REM_25 / 12.0).abs() < 1e-12);
        let high = scenarios.iter().find(|s| s.label == "1.8").expect("1.8 present");
        assert!((high.target_tem - REM_75 / 12.0).abs() < 1e-9);

        assert_eq!(scenarios.first().map(|s| s.label.as_str()), Some("0.5"));
        assert_eq!(scenarios.last().map(|s| s.label.as_str()), Some("5.5"));
    }

    #[test]
    fn test_expanding_mean_skips_leading_gaps() {
        let values = [None, Some(2.0), Some(4.0), None, Some(6.0)];
        let means = expanding_mean(&values);
        assert_eq!(means[0], None);
        assert_eq!(means[1], Some(2.0));
        assert_eq!(means[2], Some(3.0));
        assert_eq!(means[3], Some(3.0));
        assert_eq!(means[4], Some(4.0));
    }

    #[test]
    fn test_payoff_months_with_clamped_month_ends() {
        let base = table_date(DUALES_PAYOFF_BASE_DATE);
        // Jan 29 2025 -> Mar 16 2026: one year to Jan 29 2026, one clamped
        // month to Feb 28, then 16 days.
        assert_eq!(relative_parts(date(2026, 3, 16), base), (1, 1, 16));
        assert!((payoff_months(date(2026, 3, 16), base) - 13.5333).abs() < 1e-3);
        assert!((payoff_months(date(2026, 12, 15), base) - 22.5333).abs() < 1e-3);
    }

    #[test]
    fn test_build_simulation_requires_data() {
        assert!(build_simulation(&[], date(2025, 6, 5)).is_none());
    }

    #[test]
    fn test_build_simulation_chart_and_tables() {
        // Three spot observations at a 33% annual rate, ~2.405% monthly.
        let tamar = vec![
            tamar_point(2025, 6, 2, 33.0),
            tamar_point(2025, 6, 3, 33.0),
            tamar_point(2025, 6, 4, 33.0),
        ];
        let sim = build_simulation(&tamar, date(2025, 6, 5)).expect("simulation");

        let first = sim.chart.first().expect("chart nonempty");
        assert_eq!(first.date, date(2025, 6, 2));
        let spot = first.tamar_tem_spot.expect("spot value");
        assert!((spot - 0.02405).abs() < 1e-4);
        assert_eq!(first.tamar_avg, Some(spot));
        // All four fixed-rate series run through the early dates.
        assert_eq!(first.fixed_rates.len(), 4);
        assert!(first.projections.is_empty());

        // Projections start the day after the last observation and ramp
        // from the current spot to each target by end of 2026.
        let ramp_start = sim
            .chart
            .iter()
            .find(|p| p.date == date(2025, 6, 5))
            .expect("first projected day");
        assert_eq!(ramp_start.projections.len(), 13);
        assert!((ramp_start.projections["0.5"] - spot).abs() < 1e-12);

        let last = sim.chart.last().expect("chart nonempty");
        assert_eq!(last.date, date(2026, 12, 31));
        assert!((last.projections["5.5"] - 0.055).abs() < 1e-12);
        // Every payoff event has passed by then.
        assert!(last.fixed_rates.is_empty());

        // On its own event date TTD26 still shows a fixed rate, TTS26 no
        // longer does.
        let ttd_event = sim
            .chart
            .iter()
            .find(|p| p.date == date(2026, 12, 15))
            .expect("TTD26 event point");
        assert_eq!(ttd_event.fixed_rates.get("TTD26"), Some(&0.0214));
        assert!(ttd_event.fixed_rates.get("TTS26").is_none());

        // Tables: 13 scenario rows, sobretasa floored at zero and monotone
        // in the scenario target, payoff compounding above the sobretasa.
        assert_eq!(sim.sobretasa_rows.len(), 13);
        assert_eq!(sim.payoff_rows.len(), 13);
        let low_row = sim
            .sobretasa_rows
            .iter()
            .find(|r| r.label == "TAMAR 0.5%")
            .expect("low row");
        let high_row = sim
            .sobretasa_rows
            .iter()
            .find(|r| r.label == "TAMAR 5.5%")
            .expect("high row");
        for &(ticker, _, _) in DUAL_BONDS {
            assert!(low_row.values[ticker] >= 0.0);
            assert!(high_row.values[ticker] >= low_row.values[ticker]);
        }
        let high_payoff = sim
            .payoff_rows
            .iter()
            .find(|r| r.label == "TAMAR 5.5%")
            .expect("high payoff row");
        for &(ticker, _, _) in DUAL_BONDS {
            assert!(high_payoff.values[ticker] >= high_row.values[ticker]);
        }

        assert_eq!(sim.meses["TTM26"], 13.53);
        assert_eq!(sim.meses["TTD26"], 22.53);
        assert_eq!(sim.event_dates.len(), 4);
    }

    #[test]
    fn test_call_value_wire_shapes() {
        let request = CallValueRequest {
            target_mean: 0.019,
            target_prob: 0.5,
            threshold: 0.022,
            min_val: 0.01,
        };
        let body = serde_json::to_string(&request).expect("serializes");
        assert!(body.contains("\"target_mean\":0.019"));

        let payload = r#"{
            "call_value_b100": 3.21,
            "distribution_data": [{
                "TAMAR_DIC_26_pct": 21.5,
                "TAMAR_MEAN": 0.0185,
                "fixed_amort_b100": 158.1,
                "proba_pct": 12.3,
                "tamar_amort_b100": 161.4,
                "tamar_diff_b100": 3.3
            }]
        }"#;
        let parsed: CallValueResponse = serde_json::from_str(payload).expect("parses");
        assert_eq!(parsed.call_value_b100, 3.21);
        assert_eq!(parsed.distribution_data[0].tamar_dic_26_pct, 21.5);
        assert_eq!(parsed.distribution_data[0].tamar_mean, 0.0185);
    }
}
