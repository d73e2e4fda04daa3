//! Outbound request construction for the BCRA upstream.
//!
//! The upstream rejects non-regional traffic at the edge, so every request
//! carries the full header set of an Argentine browser session. Keeping the
//! set in one place makes it deterministic and testable.

use chrono::NaiveDate;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HOST, ORIGIN,
    REFERER, USER_AGENT,
};

use crate::error::FetchError;

/// Base path for the statistics (monetary variables) API.
pub const STATS_BASE: &str = "/estadisticas/v3.0/monetarias";

/// Base path for the debtor-registry API.
pub const DEBTOR_BASE: &str = "/centraldedeudores/v1.0/Deudas";

/// Upstream default page size; the parameter is omitted when it matches.
pub const DEFAULT_SERIES_LIMIT: u32 = 1000;

/// Upstream hard cap on page size.
pub const MAX_SERIES_LIMIT: u32 = 3000;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Residential Argentina address advertised in `X-Forwarded-For`.
const FORWARDED_FOR_IP: &str = "190.191.237.1";

/// Build the browser-equivalent header set sent on every upstream request.
///
/// All values are fixed except `Origin`/`Referer` (the public deployment
/// URL) and `Host`.
pub fn browser_headers(host: &str, public_base_url: &str) -> Result<HeaderMap, FetchError> {
    let dynamic = |v: &str| {
        HeaderValue::from_str(v)
            .map_err(|e| FetchError::InvalidParameter(format!("invalid header value: {}", e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("es-AR,es;q=0.9,en;q=0.8"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(ORIGIN, dynamic(public_base_url)?);
    headers.insert(REFERER, dynamic(public_base_url)?);
    headers.insert(HOST, dynamic(host)?);
    headers.insert(
        HeaderName::from_static("content-language"),
        HeaderValue::from_static("es-AR"),
    );
    headers.insert(
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(FORWARDED_FOR_IP),
    );
    headers.insert(
        HeaderName::from_static("cf-ipcountry"),
        HeaderValue::from_static("AR"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("cross-site"),
    );
    Ok(headers)
}

/// Path for the full monetary-variables listing.
pub fn monetarias_path() -> String {
    STATS_BASE.to_string()
}

/// Path for one variable's time series, with query parameters in canonical
/// order and defaults omitted.
pub fn series_path(
    variable_id: u32,
    desde: Option<NaiveDate>,
    hasta: Option<NaiveDate>,
    offset: u32,
    limit: u32,
) -> String {
    let mut params = Vec::new();
    if let Some(d) = desde {
        params.push(format!("desde={}", d.format("%Y-%m-%d")));
    }
    if let Some(h) = hasta {
        params.push(format!("hasta={}", h.format("%Y-%m-%d")));
    }
    if offset > 0 {
        params.push(format!("offset={}", offset));
    }
    if limit != DEFAULT_SERIES_LIMIT {
        params.push(format!("limit={}", limit));
    }

    if params.is_empty() {
        format!("{}/{}", STATS_BASE, variable_id)
    } else {
        format!("{}/{}?{}", STATS_BASE, variable_id, params.join("&"))
    }
}

pub fn debts_path(cuit: &str) -> String {
    format!("{}/{}", DEBTOR_BASE, cuit)
}

pub fn debt_history_path(cuit: &str) -> String {
    format!("{}/Historicas/{}", DEBTOR_BASE, cuit)
}

pub fn rejected_cheques_path(cuit: &str) -> String {
    format!("{}/ChequesRechazados/{}", DEBTOR_BASE, cuit)
}
