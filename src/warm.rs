//! Scheduled cache warmer.
//!
//! Refreshes the monetarias listing and a three-month window of every
//! tracked variable through the normal fetch pipeline, then mirrors the
//! bodies into the fallback store so an upstream outage can be served
//! from Redis. Variables go out in small concurrent batches with a pause
//! in between to keep the upstream happy.

use std::time::{Duration, Instant};

use chrono::{Months, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::today_art;
use crate::bcra::request::DEFAULT_SERIES_LIMIT;
use crate::bcra::BcraClient;
use crate::cache::fallback::{series_key, KEY_MONETARIAS};
use crate::constants::STATIC_VARIABLE_IDS;
use crate::error::FetchError;
use crate::metrics::{WARM_DURATION, WARM_RUNS, WARM_SERIES};

/// Variables fetched concurrently before each inter-batch pause.
const WARM_BATCH_SIZE: usize = 5;
const BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Window of history mirrored per variable.
const WARM_WINDOW_MONTHS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct WarmSummary {
    pub listing_records: usize,
    pub series_total: usize,
    pub series_warmed: u32,
    pub series_failed: u32,
    pub duration_ms: u64,
}

/// Run one warm pass. The listing is fetched first and a failure there
/// aborts the run; individual series failures are tallied and do not.
pub async fn warm_caches(client: &BcraClient) -> Result<WarmSummary, FetchError> {
    let started = Instant::now();
    info!(
        variables = STATIC_VARIABLE_IDS.len(),
        "starting cache warm run"
    );

    let mirror = client.has_fallback();
    if !mirror {
        warn!("no fallback store configured, warming in-memory caches only");
    }

    let listing = match client.monetary_variables().await {
        Ok(listing) => listing,
        Err(e) => {
            WARM_RUNS.with_label_values(&["error"]).inc();
            WARM_DURATION.observe(started.elapsed().as_secs_f64());
            return Err(e);
        }
    };
    if mirror {
        if let Err(e) = client.mirror_to_fallback(KEY_MONETARIAS, &listing).await {
            warn!(error = %e, "failed to mirror the monetarias listing");
        }
    }

    let hasta = today_art();
    let desde = hasta - Months::new(WARM_WINDOW_MONTHS);

    let mut warmed = 0u32;
    let mut failed = 0u32;

    let batches: Vec<&[u32]> = STATIC_VARIABLE_IDS.chunks(WARM_BATCH_SIZE).collect();
    for (index, batch) in batches.iter().enumerate() {
        let outcomes = join_all(
            batch
                .iter()
                .map(|&id| warm_one(client, id, desde, hasta, mirror)),
        )
        .await;
        for ok in outcomes {
            if ok {
                warmed += 1;
            } else {
                failed += 1;
            }
        }

        if index + 1 < batches.len() {
            tokio::time::sleep(BATCH_PAUSE).await;
        }
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    WARM_RUNS.with_label_values(&["ok"]).inc();
    WARM_DURATION.observe(started.elapsed().as_secs_f64());
    info!(
        listing_records = listing.results.len(),
        warmed, failed, duration_ms, "cache warm run finished"
    );

    Ok(WarmSummary {
        listing_records: listing.results.len(),
        series_total: STATIC_VARIABLE_IDS.len(),
        series_warmed: warmed,
        series_failed: failed,
        duration_ms,
    })
}

/// Warm a single variable. An empty series counts as a failure so a
/// silently truncated upstream response never overwrites good fallback
/// data.
async fn warm_one(
    client: &BcraClient,
    variable_id: u32,
    desde: NaiveDate,
    hasta: NaiveDate,
    mirror: bool,
) -> bool {
    let series = match client
        .variable_time_series(variable_id, Some(desde), Some(hasta), 0, DEFAULT_SERIES_LIMIT)
        .await
    {
        Ok(series) => series,
        Err(e) => {
            warn!(variable_id, error = %e, "warm fetch failed");
            WARM_SERIES.with_label_values(&["failed"]).inc();
            return false;
        }
    };

    if series.results.is_empty() {
        warn!(variable_id, "warm fetch returned no rows");
        WARM_SERIES.with_label_values(&["failed"]).inc();
        return false;
    }

    if mirror {
        if let Err(e) = client
            .mirror_to_fallback(&series_key(variable_id), &series)
            .await
        {
            warn!(variable_id, error = %e, "failed to mirror series");
            WARM_SERIES.with_label_values(&["failed"]).inc();
            return false;
        }
    }

    debug!(variable_id, rows = series.results.len(), "series warmed");
    WARM_SERIES.with_label_values(&["ok"]).inc();
    true
}
