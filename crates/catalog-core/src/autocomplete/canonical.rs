//! Canonical spellings for suggestion values.

use serde::{Deserialize, Serialize};

/// Fields that offer suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestField {
    Project,
    Format,
    Type,
}

impl SuggestField {
    /// Accepts the short names and the record field names, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "project" | "projects" | "used_in_projects" => Some(SuggestField::Project),
            "format" | "file_format" => Some(SuggestField::Format),
            "type" | "types" | "data_types" => Some(SuggestField::Type),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestField::Project => "project",
            SuggestField::Format => "format",
            SuggestField::Type => "type",
        }
    }
}

impl std::fmt::Display for SuggestField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a value to its canonical spelling.
///
/// Known values are matched on their case-folded form (with `_` and runs of
/// whitespace treated as a single space); anything else is returned trimmed
/// but otherwise unchanged.
///
/// ```
/// use catalog_core::autocomplete::{canonicalize, SuggestField};
///
/// assert_eq!(canonicalize(SuggestField::Type, "Time Series"), "time-series");
/// assert_eq!(canonicalize(SuggestField::Format, ".tif"), "GeoTIFF");
/// assert_eq!(canonicalize(SuggestField::Project, " Gideon "), "Gideon");
/// ```
pub fn canonicalize(field: SuggestField, value: &str) -> String {
    let trimmed = value.trim();
    let key = fold(trimmed);

    let known = match field {
        SuggestField::Type => canonical_type(&key),
        SuggestField::Format => canonical_format(key.trim_start_matches('.')),
        SuggestField::Project => None,
    };

    known.map(str::to_string).unwrap_or_else(|| trimmed.to_string())
}

fn fold(value: &str) -> String {
    value
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn canonical_type(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "timeseries" | "time series" | "time-series" => "time-series",
        "tabular" | "table" | "tables" => "tabular",
        "raster" | "rasters" | "gridded" => "raster",
        "vector" | "vectors" => "vector",
        "geospatial" | "gis" | "spatial" => "geospatial",
        "image" | "images" | "imagery" => "imagery",
        "text" | "textual" => "text",
        "point cloud" | "pointcloud" | "lidar" => "point-cloud",
        _ => return None,
    };
    Some(canonical)
}

fn canonical_format(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "csv" => "CSV",
        "tsv" => "TSV",
        "json" => "JSON",
        "geojson" => "GeoJSON",
        "parquet" | "pq" => "Parquet",
        "nc" | "netcdf" | "netcdf4" => "NetCDF",
        "tif" | "tiff" | "geotiff" => "GeoTIFF",
        "xlsx" | "xls" | "excel" => "Excel",
        "h5" | "hdf5" | "hdf" => "HDF5",
        "shp" | "shapefile" => "Shapefile",
        "zarr" => "Zarr",
        _ => return None,
    };
    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_synonyms() {
        for raw in ["timeseries", "Time Series", "time_series", "TIME-SERIES", "time   series"] {
            assert_eq!(canonicalize(SuggestField::Type, raw), "time-series", "{raw}");
        }
    }

    #[test]
    fn test_format_synonyms() {
        assert_eq!(canonicalize(SuggestField::Format, "csv"), "CSV");
        assert_eq!(canonicalize(SuggestField::Format, "NetCDF"), "NetCDF");
        assert_eq!(canonicalize(SuggestField::Format, "nc"), "NetCDF");
        assert_eq!(canonicalize(SuggestField::Format, "XLS"), "Excel");
    }

    #[test]
    fn test_unknown_values_pass_through() {
        assert_eq!(canonicalize(SuggestField::Format, "Feather v2"), "Feather v2");
        assert_eq!(canonicalize(SuggestField::Type, "  audio "), "audio");
        assert_eq!(canonicalize(SuggestField::Project, "climate_ML"), "climate_ML");
    }

    #[test]
    fn test_parse_field_names() {
        assert_eq!(SuggestField::parse("project"), Some(SuggestField::Project));
        assert_eq!(SuggestField::parse("USED_IN_PROJECTS"), Some(SuggestField::Project));
        assert_eq!(SuggestField::parse("file_format"), Some(SuggestField::Format));
        assert_eq!(SuggestField::parse("types"), Some(SuggestField::Type));
        assert_eq!(SuggestField::parse("name"), None);
    }
}
