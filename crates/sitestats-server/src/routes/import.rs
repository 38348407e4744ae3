//! CSV import endpoints. Request bodies are raw CSV text.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use sitestats_core::import::{self as core_import, ImportOptions, ImportStats, SiteImportReport};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SiteImportResponse {
    #[serde(flatten)]
    pub report: SiteImportReport,
    /// Human readable report text
    pub summary: String,
}

/// Import site versions.
/// POST /import/sites
pub async fn import_sites(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<SiteImportResponse>> {
    let options = ImportOptions::from_config(&state.config, Utc::now());
    let report = state
        .blocking(move |store| core_import::import_sites(store, body.as_bytes(), &options))
        .await?;

    Ok(Json(SiteImportResponse {
        summary: report.to_string(),
        report,
    }))
}

/// Import over-time summary snapshots.
/// POST /import/snapshots
pub async fn import_snapshots(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportStats>> {
    let stats = state
        .blocking(move |store| core_import::import_snapshots(store, body.as_bytes()))
        .await?;
    Ok(Json(stats))
}
