//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use sitestats_core::VersionStore;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sites: usize,
    pub versions: usize,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (sites, versions) = state
        .blocking(|store| Ok((store.count_sites()?, store.count_versions()?)))
        .await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sites,
        versions,
    }))
}
