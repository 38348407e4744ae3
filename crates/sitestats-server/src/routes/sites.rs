//! Site version endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitestats_core::error::SiteStatsError;
use sitestats_core::{time, SiteAttributes, SiteVersion, VersionStore, VersionSummary};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for creating a site version.
#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub url: String,
    /// When the version takes effect; defaults to now.
    pub active_start_date: Option<String>,
    #[serde(default)]
    pub attributes: SiteAttributes,
}

/// Request body for deriving a new version from the current one.
#[derive(Debug, Deserialize)]
pub struct EditSiteRequest {
    /// When the new version takes effect; defaults to now.
    pub active_start_date: Option<String>,
    #[serde(default)]
    pub attributes: SiteAttributes,
}

#[derive(Debug, Serialize)]
pub struct SitesResponse {
    pub results: Vec<SiteVersion>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub summary: VersionSummary,
    pub results: Vec<SiteVersion>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AtQuery {
    pub url: String,
    pub timestamp: String,
}

fn effective_time(value: Option<&str>) -> ApiResult<DateTime<Utc>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => time::parse_flexible(s).map_err(ApiError::from),
        None => Ok(Utc::now()),
    }
}

/// List the current version of every site.
/// GET /sites
pub async fn list_current_sites(State(state): State<AppState>) -> ApiResult<Json<SitesResponse>> {
    let results = state.blocking(|store| store.list_current()).await?;
    Ok(Json(SitesResponse { results }))
}

/// Insert a version of a site.
/// POST /sites
pub async fn create_site(
    State(state): State<AppState>,
    Json(request): Json<CreateSiteRequest>,
) -> ApiResult<(StatusCode, Json<SiteVersion>)> {
    let effective_at = effective_time(request.active_start_date.as_deref())?;
    let CreateSiteRequest {
        url, attributes, ..
    } = request;

    let version = state
        .write_with_retry(move |store| store.insert_version(&url, effective_at, &attributes))
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// Get a single version.
/// GET /sites/:id
pub async fn get_site_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SiteVersion>> {
    let version = state.blocking(move |store| store.get_version(id)).await?;
    Ok(Json(version))
}

/// Create a new version from the current version `id`.
/// POST /sites/:id/edit
pub async fn edit_site_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EditSiteRequest>,
) -> ApiResult<(StatusCode, Json<SiteVersion>)> {
    let effective_at = effective_time(request.active_start_date.as_deref())?;
    let attributes = request.attributes;

    let version = state
        .write_with_retry(move |store| store.edit_version(id, effective_at, &attributes))
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// Full history of a site.
/// GET /sites/history?url=
pub async fn get_site_history(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let url = query.url;
    let results = state
        .blocking({
            let url = url.clone();
            move |store| store.history(&url)
        })
        .await?;

    let summary = VersionSummary::from_history(&results)
        .ok_or_else(|| ApiError::from(SiteStatsError::site_not_found(url)))?;
    Ok(Json(HistoryResponse { summary, results }))
}

/// The version of a site in effect at a point in time.
/// GET /sites/at?url=&timestamp=
pub async fn get_site_at(
    State(state): State<AppState>,
    Query(query): Query<AtQuery>,
) -> ApiResult<Json<SiteVersion>> {
    let timestamp = time::parse_flexible(&query.timestamp)?;
    let url = query.url;

    let version = state
        .blocking({
            let url = url.clone();
            move |store| store.version_at(&url, timestamp)
        })
        .await?;

    version.map(Json).ok_or_else(|| {
        ApiError::not_found(format!(
            "Site '{}' has no version in effect at {}",
            url,
            timestamp.to_rfc3339()
        ))
    })
}
