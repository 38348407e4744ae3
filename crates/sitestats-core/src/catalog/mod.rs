//! Language and geo zone lookup tables.
//!
//! Both are plain named rows; site versions link to them through the
//! `site_languages` / `site_geo_zones` junction tables.

mod store;

pub use store::CatalogStore;
pub(crate) use store::{link_names, load_names};

use serde::{Deserialize, Serialize};

/// A language a site offers courses in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
}

/// A geographical zone a site serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoZone {
    pub name: String,
}

/// Which lookup table an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Language,
    GeoZone,
}

impl Lookup {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Language => "languages",
            Self::GeoZone => "geo_zones",
        }
    }

    pub(crate) fn link_table(&self) -> &'static str {
        match self {
            Self::Language => "site_languages",
            Self::GeoZone => "site_geo_zones",
        }
    }

    pub(crate) fn link_column(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::GeoZone => "geo_zone",
        }
    }

    /// Human readable model name used in conflict messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Language => "Language",
            Self::GeoZone => "Geo zone",
        }
    }
}

/// Trim names, drop blanks and repeated entries, keeping first-seen order.
pub fn normalize_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Split a comma separated spreadsheet cell into names.
pub fn split_names(cell: &str) -> Vec<String> {
    normalize_names(&cell.split(',').map(str::to_string).collect::<Vec<_>>())
}
