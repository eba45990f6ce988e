//! Slug-shaped dataset ids.
//!
//! Ids are generated from the dataset name on first save and never change
//! afterwards.

use crate::config::StoreConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Runs of anything that isn't a lowercase ASCII letter or digit.
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// A valid id: alphanumeric words joined by single hyphens.
static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Turn a dataset name into an id candidate.
///
/// # Rules Applied
/// 1. Lowercase
/// 2. Replace every run of non-alphanumeric characters with one hyphen
/// 3. Trim leading/trailing hyphens
/// 4. Truncate to the maximum id length, preferring a word boundary
/// 5. Fall back to `dataset` when nothing is left
///
/// # Examples
///
/// ```
/// use catalog_core::record::slugify;
///
/// assert_eq!(slugify("Global Weather Stations 2024"), "global-weather-stations-2024");
/// assert_eq!(slugify("  MODIS / Terra (v6.1) "), "modis-terra-v6-1");
/// assert_eq!(slugify("***"), "dataset");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = NON_SLUG.replace_all(&lowered, "-").to_string();
    slug = slug.trim_matches('-').to_string();

    // Reserve room for a collision suffix such as "-12".
    let max = StoreConfig::MAX_ID_LENGTH - 8;
    if slug.len() > max {
        slug.truncate(max);
        if let Some(pos) = slug.rfind('-') {
            if pos > max / 2 {
                slug.truncate(pos);
            }
        }
        slug = slug.trim_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = StoreConfig::FALLBACK_SLUG.to_string();
    }

    slug
}

/// The `n`th candidate for `base`: `base` itself for 1, then `base-2`, `base-3`, ...
pub fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}

/// Check that an id has slug shape.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= StoreConfig::MAX_ID_LENGTH && SLUG_SHAPE.is_match(id)
}
