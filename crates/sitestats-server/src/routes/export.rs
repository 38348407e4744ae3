//! CSV export endpoint.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use sitestats_core::VersionStore;

use crate::error::ApiResult;
use crate::state::AppState;

/// Current version of every site as CSV.
/// GET /export/sites
pub async fn export_sites(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state
        .blocking(|store| {
            let mut buf = Vec::new();
            sitestats_core::export_sites(&store.list_current()?, &mut buf)?;
            Ok(buf)
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"sites.csv\""),
        ],
        body,
    )
        .into_response())
}
