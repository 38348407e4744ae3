//! Route definitions for the REST API.

mod catalog;
mod export;
mod health;
mod import;
mod sites;
mod stats;

use axum::{routing::get, routing::post, Router};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Site versions
        .route("/sites", get(sites::list_current_sites).post(sites::create_site))
        .route("/sites/history", get(sites::get_site_history))
        .route("/sites/at", get(sites::get_site_at))
        .route("/sites/:id", get(sites::get_site_version))
        .route("/sites/:id/edit", post(sites::edit_site_version))
        // Lookup tables
        .route("/languages", get(catalog::list_languages).post(catalog::add_language))
        .route("/geozones", get(catalog::list_geozones).post(catalog::add_geozone))
        // Bulk import / export
        .route("/import/sites", post(import::import_sites))
        .route("/import/snapshots", post(import::import_snapshots))
        .route("/export/sites", get(export::export_sites))
        // Reporting
        .route("/stats/daily", get(stats::daily_stats))
        .route("/stats/snapshots", get(stats::list_snapshots))
        // Attach state
        .with_state(state)
}

pub use catalog::*;
pub use export::*;
pub use health::*;
pub use import::*;
pub use sites::*;
pub use stats::*;
