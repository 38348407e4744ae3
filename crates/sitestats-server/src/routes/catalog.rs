//! Language and geo zone endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sitestats_core::{CatalogStore, GeoZone, Language};

use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for adding a lookup row.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub results: Vec<Language>,
}

#[derive(Debug, Serialize)]
pub struct GeoZonesResponse {
    pub results: Vec<GeoZone>,
}

/// GET /languages
pub async fn list_languages(State(state): State<AppState>) -> ApiResult<Json<LanguagesResponse>> {
    let results = state.blocking(|store| store.list_languages()).await?;
    Ok(Json(LanguagesResponse { results }))
}

/// POST /languages
pub async fn add_language(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<(StatusCode, Json<Language>)> {
    let language = state
        .blocking(move |store| store.add_language(&request.name))
        .await?;
    Ok((StatusCode::CREATED, Json(language)))
}

/// GET /geozones
pub async fn list_geozones(State(state): State<AppState>) -> ApiResult<Json<GeoZonesResponse>> {
    let results = state.blocking(|store| store.list_geozones()).await?;
    Ok(Json(GeoZonesResponse { results }))
}

/// POST /geozones
pub async fn add_geozone(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> ApiResult<(StatusCode, Json<GeoZone>)> {
    let geozone = state
        .blocking(move |store| store.add_geozone(&request.name))
        .await?;
    Ok((StatusCode::CREATED, Json(geozone)))
}
