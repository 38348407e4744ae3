//! Export utilities for site data.
//!
//! Writes CSV with the same column set the site importer reads, so an
//! export can be loaded into another store.

pub mod csv;

pub use self::csv::{export_sites, ExportStats};
