//! Reporting endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sitestats_core::{
    daily_snapshots, DailySnapshot, SiteStatsError, SiteSummarySnapshot, SnapshotStore,
    VersionStore,
};

use crate::error::ApiResult;
use crate::state::AppState;

/// Date range for daily stats; defaults to the last 30 days.
#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    pub results: Vec<DailySnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotsResponse {
    pub results: Vec<SiteSummarySnapshot>,
}

/// GET /stats/daily?from=&to=
pub async fn daily_stats(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<DailyResponse>> {
    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = match query.from {
        Some(from) => from,
        None => to.checked_sub_signed(Duration::days(29)).ok_or_else(|| {
            SiteStatsError::validation(format!("No 30-day range ends on {}", to))
        })?,
    };

    let results = state
        .blocking(move |store| daily_snapshots(&store.all_versions()?, from, to))
        .await?;
    Ok(Json(DailyResponse { results }))
}

/// GET /stats/snapshots
pub async fn list_snapshots(State(state): State<AppState>) -> ApiResult<Json<SnapshotsResponse>> {
    let results = state.blocking(|store| store.summary_snapshots()).await?;
    Ok(Json(SnapshotsResponse { results }))
}
