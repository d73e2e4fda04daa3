//! Static domain tables: variable ids, instrument prospects, payoffs,
//! baselines, holidays and the CPI history.
//!
//! These are maintained by hand against the official prospectuses and the
//! INDEC releases; dates are ISO `YYYY-MM-DD` strings parsed on demand.

use chrono::NaiveDate;

/// BCRA monthly inflation variable (IPC, variación mensual).
pub const INFLATION_VARIABLE_ID: u32 = 27;

/// BCRA TAMAR rate variable (TEA, %).
pub const TAMAR_VARIABLE_ID: u32 = 45;

/// Hours (local Buenos Aires time) at which the BCRA publishes updates;
/// success cache entries written before one of these hours go stale once the
/// hour is crossed.
pub const REFRESH_HOURS: [u32; 4] = [1, 7, 13, 19];

/// Variables pre-warmed by the cache-warm job.
pub const STATIC_VARIABLE_IDS: [u32; 34] = [
    // Divisas
    1, 4, 5, //
    // Tasas de interés
    6, 7, 8, 9, 11, 12, 13, 14, 34, 35, 43, 44, 45, //
    // Base monetaria
    15, 16, 17, 18, 19, //
    // Depósitos
    21, 22, 23, 24, //
    // Privados
    25, 26, //
    // Inflación
    27, 28, 29, //
    // Índices
    30, 31, 32, 40,
];

/// Presentation groups for the variable list.
pub static VARIABLE_GROUPS: &[(&str, &[u32])] = &[
    ("KEY_METRICS", &[1, 4, 5, 6, 15, 27, 28, 29]),
    (
        "INTEREST_RATES",
        &[6, 7, 8, 9, 10, 11, 12, 13, 14, 34, 35, 40, 41, 160, 161, 162],
    ),
    ("EXCHANGE_RATES", &[4, 5, 84]),
    ("INFLATION", &[27, 28, 29, 30, 31, 32]),
    ("RESERVES", &[1, 74, 75, 76, 77]),
    ("MONETARY_BASE", &[15, 16, 17, 18, 19, 46, 64, 71, 72, 73]),
];

/// Look up a variable group by its name (case-insensitive).
pub fn variable_group(name: &str) -> Option<&'static [u32]> {
    VARIABLE_GROUPS
        .iter()
        .find(|(group, _)| group.eq_ignore_ascii_case(name))
        .map(|(_, ids)| *ids)
}

/// Fixed-income prospect: ticker, maturity, final payoff per 100 VN.
#[derive(Debug, Clone, Copy)]
pub struct Prospect {
    pub ticker: &'static str,
    pub maturity: &'static str,
    pub final_payoff: f64,
}

/// Letras and bonos tracked by the fija report.
pub static TICKER_PROSPECT: &[Prospect] = &[
    Prospect { ticker: "TZXY5", maturity: "2025-05-30", final_payoff: 121.16 },
    Prospect { ticker: "S30Y5", maturity: "2025-05-30", final_payoff: 136.33 },
    Prospect { ticker: "S18J5", maturity: "2025-06-18", final_payoff: 147.7 },
    Prospect { ticker: "TZX25", maturity: "2025-06-30", final_payoff: 243.99 },
    Prospect { ticker: "S30J5", maturity: "2025-06-30", final_payoff: 146.61 },
    Prospect { ticker: "S10L5", maturity: "2025-07-10", final_payoff: 101.8855614 },
    Prospect { ticker: "S31L5", maturity: "2025-07-31", final_payoff: 147.74 },
    Prospect { ticker: "S15G5", maturity: "2025-08-18", final_payoff: 146.79 },
    Prospect { ticker: "S29G5", maturity: "2025-08-29", final_payoff: 157.7 },
    Prospect { ticker: "S12S5", maturity: "2025-09-12", final_payoff: 158.98 },
    Prospect { ticker: "S30S5", maturity: "2025-09-30", final_payoff: 159.73 },
    Prospect { ticker: "T17O5", maturity: "2025-10-15", final_payoff: 158.47 },
    Prospect { ticker: "S31O5", maturity: "2025-10-31", final_payoff: 132.82 },
    Prospect { ticker: "S10N5", maturity: "2025-11-10", final_payoff: 122.25 },
    Prospect { ticker: "S28N5", maturity: "2025-11-28", final_payoff: 123.56 },
    Prospect { ticker: "T15D5", maturity: "2025-12-15", final_payoff: 170.84 },
    Prospect { ticker: "T30E6", maturity: "2026-01-30", final_payoff: 142.22 },
    Prospect { ticker: "T13F6", maturity: "2026-02-13", final_payoff: 144.97 },
    Prospect { ticker: "T30J6", maturity: "2026-06-30", final_payoff: 144.9 },
    Prospect { ticker: "TO26", maturity: "2026-01-19", final_payoff: 161.1 },
    Prospect { ticker: "T15E7", maturity: "2027-01-15", final_payoff: 161.1 },
    Prospect { ticker: "TTM26", maturity: "2026-03-16", final_payoff: 135.24 },
    Prospect { ticker: "TTJ26", maturity: "2026-06-30", final_payoff: 144.63 },
    Prospect { ticker: "TTS26", maturity: "2026-09-16", final_payoff: 152.96 },
    Prospect { ticker: "TTD26", maturity: "2026-12-15", final_payoff: 161.14 },
];

/// Carry-trade universe: ticker, expiration, payoff at expiry.
///
/// Kept separate from `TICKER_PROSPECT`: the carry table uses settlement
/// payoffs from the trade desk sheet, which differ in cents for a few
/// tickers.
pub static CARRY_TICKERS: &[Prospect] = &[
    Prospect { ticker: "S16A5", maturity: "2025-04-16", final_payoff: 131.211 },
    Prospect { ticker: "S28A5", maturity: "2025-04-28", final_payoff: 130.813 },
    Prospect { ticker: "S16Y5", maturity: "2025-05-16", final_payoff: 136.861 },
    Prospect { ticker: "S30Y5", maturity: "2025-05-30", final_payoff: 136.331 },
    Prospect { ticker: "S18J5", maturity: "2025-06-18", final_payoff: 147.695 },
    Prospect { ticker: "S30J5", maturity: "2025-06-30", final_payoff: 146.607 },
    Prospect { ticker: "S31L5", maturity: "2025-07-31", final_payoff: 147.74 },
    Prospect { ticker: "S15G5", maturity: "2025-08-15", final_payoff: 146.794 },
    Prospect { ticker: "S29G5", maturity: "2025-08-29", final_payoff: 157.7 },
    Prospect { ticker: "S12S5", maturity: "2025-09-12", final_payoff: 158.977 },
    Prospect { ticker: "S30S5", maturity: "2025-09-30", final_payoff: 159.734 },
    Prospect { ticker: "T17O5", maturity: "2025-10-15", final_payoff: 158.872 },
    Prospect { ticker: "S31O5", maturity: "2025-10-31", final_payoff: 132.821 },
    Prospect { ticker: "S10N5", maturity: "2025-11-10", final_payoff: 122.254 },
    Prospect { ticker: "S28N5", maturity: "2025-11-28", final_payoff: 123.561 },
    Prospect { ticker: "T15D5", maturity: "2025-12-15", final_payoff: 170.838 },
    Prospect { ticker: "T30E6", maturity: "2026-01-30", final_payoff: 142.222 },
    Prospect { ticker: "T13F6", maturity: "2026-02-13", final_payoff: 144.966 },
    Prospect { ticker: "T30J6", maturity: "2026-06-30", final_payoff: 144.896 },
    Prospect { ticker: "T15E7", maturity: "2027-01-15", final_payoff: 160.777 },
    Prospect { ticker: "TTM26", maturity: "2026-03-16", final_payoff: 135.238 },
    Prospect { ticker: "TTJ26", maturity: "2026-06-30", final_payoff: 144.629 },
    Prospect { ticker: "TTS26", maturity: "2026-09-15", final_payoff: 152.096 },
    Prospect { ticker: "TTD26", maturity: "2026-12-15", final_payoff: 161.144 },
];

/// Fixed exit-MEP prices for the carry scenario columns.
pub const CARRY_PRICES: [f64; 5] = [1000.0, 1100.0, 1200.0, 1300.0, 1400.0];

/// 2025 non-business days (national holidays and bridge days).
pub static HOLIDAYS_2025: &[&str] = &[
    "2025-01-01",
    "2025-03-03",
    "2025-03-04",
    "2025-03-24",
    "2025-04-02",
    "2025-04-18",
    "2025-05-01",
    "2025-05-02",
    "2025-05-25",
    "2025-06-16",
    "2025-06-20",
    "2025-07-09",
    "2025-08-15",
    "2025-08-17",
    "2025-10-12",
    "2025-11-21",
    "2025-11-24",
    "2025-12-08",
    "2025-12-25",
];

/// Panel líder year-start closes used for YTD returns.
pub static PANEL_LIDER_BASELINE: &[(&str, &str, f64)] = &[
    ("ALUA", "Aluar Aluminio Argentino SAIC", 894.0),
    ("BBAR", "Banco BBVA Argentina SA", 8570.0),
    ("BMA", "Banco Macro SA", 12850.0),
    ("BYMA", "Bolsas y Mercados Argentinos", 258.0),
    ("CEPU", "Central Puerto", 1820.0),
    ("COME", "Sociedad Comercial del Plata SA", 260.5),
    ("CRES", "Cresud", 1560.0),
    ("EDN", "Edenor", 2790.0),
    ("GGAL", "Grupo Galicia", 8070.0),
    ("IRSA", "IRSA", 1875.0),
    ("LOMA", "Loma Negra", 2985.0),
    ("METR", "Metrogas", 2860.0),
    ("PAMP", "Pampa Energía", 4390.0),
    ("SUPV", "Supervielle", 3915.0),
    ("TECO2", "Telecom", 3180.0),
    ("TGNO4", "Transportadora de Gas del Norte", 4200.0),
    ("TGSU2", "Transportadora de Gas del Sur", 7700.0),
    ("TRAN", "Transener", 2830.0),
    ("TXAR", "Ternium Argentina", 900.0),
    ("VALO", "Grupo Financiero Valores SA", 451.5),
    ("YPFD", "YPF", 52400.0),
];

/// Monthly CPI history (INDEC, as fractions) covering the span before the
/// live variable-27 series takes over (2025-03 onwards).
pub static HISTORICAL_INFLATION: &[(i32, u32, f64)] = &[
    (2023, 1, 0.060),
    (2023, 2, 0.066),
    (2023, 3, 0.077),
    (2023, 4, 0.084),
    (2023, 5, 0.078),
    (2023, 6, 0.060),
    (2023, 7, 0.063),
    (2023, 8, 0.124),
    (2023, 9, 0.127),
    (2023, 10, 0.083),
    (2023, 11, 0.128),
    (2023, 12, 0.255),
    (2024, 1, 0.206),
    (2024, 2, 0.132),
    (2024, 3, 0.110),
    (2024, 4, 0.088),
    (2024, 5, 0.042),
    (2024, 6, 0.046),
    (2024, 7, 0.040),
    (2024, 8, 0.042),
    (2024, 9, 0.035),
    (2024, 10, 0.027),
    (2024, 11, 0.024),
    (2024, 12, 0.027),
    (2025, 1, 0.022),
    (2025, 2, 0.024),
];

/// First month covered by the live series rather than the static table.
pub const LIVE_INFLATION_FROM: (i32, u32) = (2025, 3);

/// Dual bond (TAMAR/fija) definitions: ticker, payoff event date, fixed TEM.
pub static DUAL_BONDS: &[(&str, &str, f64)] = &[
    ("TTM26", "2026-03-16", 0.0225),
    ("TTJ26", "2026-06-30", 0.0219),
    ("TTS26", "2026-09-15", 0.0217),
    ("TTD26", "2026-12-15", 0.0214),
];

/// Horizon of the TAMAR projection scenarios.
pub const DUALES_TARGET_DATE: &str = "2026-12-31";

/// TAMAR spot observations earlier than this date are discarded.
pub const TAMAR_FILTER_DATE: &str = "2025-01-15";

/// Reference date for the dual-bond payoff month count.
pub const DUALES_PAYOFF_BASE_DATE: &str = "2025-01-29";

/// REM survey TAMAR percentiles (annual, as fractions).
pub const REM_25: f64 = 0.156;
pub const REM_50: f64 = 0.1851;
pub const REM_75: f64 = 0.218;

/// Fixed monthly-rate scenario grid for the TAMAR projections.
pub const SCENARIO_TEM_MIN: f64 = 0.005;
pub const SCENARIO_TEM_MAX: f64 = 0.055;
pub const SCENARIO_TEM_STEP: f64 = 0.005;

/// Crawling-peg band: 1400 at 2025-04-14, +1% per month (first month is the
/// 17-day stretch to May 1).
pub const BAND_BASE_VALUE: f64 = 1400.0;
pub const BAND_START_DATE: &str = "2025-04-14";
pub const BAND_MONTHLY_STEP: f64 = 0.01;

/// Early-exit simulation assumptions: estimated exit date and monthly CPI.
pub const CARRY_EXIT_DATE: &str = "2025-10-15";
pub const CARRY_EXIT_TEM: f64 = 0.01;

/// Parse a date from one of the static tables above.
///
/// The tables are compile-time constants validated by tests, so a parse
/// failure is unreachable in practice.
pub fn table_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("static table date is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_table_dates_parse() {
        for p in TICKER_PROSPECT.iter().chain(CARRY_TICKERS.iter()) {
            table_date(p.maturity);
        }
        for d in HOLIDAYS_2025 {
            table_date(d);
        }
        for (_, date, _) in DUAL_BONDS {
            table_date(date);
        }
        table_date(DUALES_TARGET_DATE);
        table_date(TAMAR_FILTER_DATE);
        table_date(DUALES_PAYOFF_BASE_DATE);
        table_date(BAND_START_DATE);
        table_date(CARRY_EXIT_DATE);
    }

    #[test]
    fn test_variable_group_lookup() {
        assert_eq!(variable_group("inflation"), Some(&[27, 28, 29, 30, 31, 32][..]));
        assert!(variable_group("unknown").is_none());
    }

    #[test]
    fn test_warm_set_contains_core_series() {
        assert!(STATIC_VARIABLE_IDS.contains(&INFLATION_VARIABLE_ID));
        assert!(STATIC_VARIABLE_IDS.contains(&TAMAR_VARIABLE_ID));
    }
}
