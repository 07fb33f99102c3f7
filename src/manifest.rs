//! Manifest Synthesizer
//!
//! `manifest.json` is what the watch host reads to find the entrypoint and
//! show attribution.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::validation::ValidatedOptions;

pub const MANIFEST_FILE: &str = "manifest.json";

/// The host always loads this file first, whatever the template emitted.
pub const ENTRYPOINT: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestData {
    pub name: String,
    pub version: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub entrypoint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl ManifestData {
    /// Pretty-printed with 2-space indentation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn synthesize(options: &ValidatedOptions, created_at: DateTime<FixedOffset>) -> ManifestData {
    let opts = &options.options;
    ManifestData {
        name: opts.name.clone(),
        version: opts.version.clone(),
        author: opts.author.clone(),
        description: opts.description.clone(),
        entrypoint: ENTRYPOINT.to_string(),
        tags: opts.tags.clone(),
        created_at,
    }
}
