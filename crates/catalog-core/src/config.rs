//! Centralized configuration for the dataset catalog.
//!
//! Fixed parameters live in constant groups; the tunables a deployment may
//! want to change live in [`CatalogConfig`].

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Record store configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const DB_FILENAME: &'static str = "catalog.db";
    pub const LOCK_FILENAME: &'static str = "catalog.lock";
    /// Directory under the catalog root that RPC exports and imports use.
    pub const BACKUP_DIRNAME: &'static str = "backups";
    pub const BUSY_TIMEOUT_MS: u64 = 30_000;
    /// Rows fetched per page by the lazy `list_all` scan.
    pub const SCAN_PAGE_SIZE: usize = 256;
    /// Maximum ids bound into a single `IN (...)` lookup.
    pub const LOOKUP_CHUNK_SIZE: usize = 500;
    pub const MAX_ID_LENGTH: usize = 128;
    /// Slug used when a record name contains nothing sluggable.
    pub const FALLBACK_SLUG: &'static str = "dataset";
}

/// Search index configuration.
pub struct IndexConfig;

impl IndexConfig {
    pub const TABLE_NAME: &'static str = "dataset_search";
    /// Porter stemming over case- and diacritic-folding word splitting.
    pub const TOKENIZER: &'static str = "porter unicode61 remove_diacritics 1";
    /// Companion table holding the same columns as whole, unstemmed words.
    ///
    /// A partly typed word can stem differently from the finished word
    /// (`observa` vs `observ`), so prefix terms also match here.
    pub const WORDS_TABLE_NAME: &'static str = "dataset_search_words";
    pub const WORDS_TOKENIZER: &'static str = "unicode61 remove_diacritics 1";
    /// Prefix entry lengths kept for as-you-type matching.
    pub const PREFIX_LENGTHS: &'static str = "2 3 4";
    /// Free-text words shorter than this are dropped.
    pub const MIN_TERM_CHARS: usize = 2;
    pub const SNIPPET_TOKENS: u32 = 12;
    pub const SNIPPET_OPEN: &'static str = "[";
    pub const SNIPPET_CLOSE: &'static str = "]";
    pub const SNIPPET_ELLIPSIS: &'static str = "…";
    /// Characters of description shown for browse (unranked) results.
    pub const BROWSE_SNIPPET_CHARS: usize = 160;
}

/// Autocomplete configuration.
pub struct AutocompleteConfig;

impl AutocompleteConfig {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
    pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;
}

/// BM25 column weights for the search index.
///
/// Higher weights make matches in that column count for more. Name matches
/// usually outrank description matches with the defaults, but a strong
/// description match can still win; nothing forces a strict precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub name: f64,
    pub description: f64,
    pub source: f64,
    pub file_format: f64,
    pub data_types: f64,
    pub used_in_projects: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 10.0,
            description: 4.0,
            source: 1.0,
            file_format: 2.0,
            data_types: 2.0,
            used_in_projects: 2.0,
        }
    }
}

impl FieldWeights {
    /// Reject weights SQLite's bm25() cannot use meaningfully.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("name", self.name),
            ("description", self.description),
            ("source", self.source),
            ("file_format", self.file_format),
            ("data_types", self.data_types),
            ("used_in_projects", self.used_in_projects),
        ];
        for (field, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CatalogError::Config {
                    message: format!("weight for {field} must be a non-negative number"),
                });
            }
        }
        Ok(())
    }
}

/// Runtime configuration for a catalog instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CatalogConfig {
    /// BM25 column weights.
    pub field_weights: FieldWeights,
    /// How often the autocomplete engine rebuilds its suggestion cache.
    #[serde(with = "duration_secs")]
    pub autocomplete_refresh_interval: Duration,
    /// Limit used by callers that don't pass one.
    pub default_search_limit: usize,
}

impl CatalogConfig {
    pub const DEFAULT_SEARCH_LIMIT: usize = 50;

    /// Load configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| CatalogError::io_with_path(e, path))?;
        let config: CatalogConfig =
            serde_json::from_str(&contents).map_err(|e| CatalogError::Config {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.field_weights.validate()?;
        if self.autocomplete_refresh_interval.is_zero() {
            return Err(CatalogError::Config {
                message: "autocomplete_refresh_interval must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            field_weights: FieldWeights::default(),
            autocomplete_refresh_interval: AutocompleteConfig::DEFAULT_REFRESH_INTERVAL,
            default_search_limit: Self::DEFAULT_SEARCH_LIMIT,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
