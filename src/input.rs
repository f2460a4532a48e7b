//! Parsing of pasted link text into image references.

use serde::{Deserialize, Serialize};

use crate::error::SnapCheckError;

/// How a load action installs parsed references into the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// One image at a time. The first link is loaded and a record is appended
    /// only once it has loaded and the operator moves on.
    #[default]
    AppendOne,
    /// Batch mode. Every parsed link replaces the store contents immediately.
    ReplaceAll,
}

impl LoadPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            LoadPolicy::AppendOne => "Single image",
            LoadPolicy::ReplaceAll => "Batch",
        }
    }
}

/// Split pasted text into trimmed, non-empty references, keeping their order.
///
/// Links are not validated here; a bad link only shows up when it fails to load.
pub fn parse_references(text: &str) -> Result<Vec<String>, SnapCheckError> {
    let references: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if references.is_empty() {
        return Err(SnapCheckError::EmptyInput);
    }

    log::debug!("Parsed {} reference(s) from input", references.len());
    Ok(references)
}
