//! Dataset records: the authoritative payload kept by the record store.

mod slug;

pub use slug::{candidate, is_valid_id, slugify};

use crate::error::{CatalogError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields every record must carry (besides `id`, which is generated when absent).
pub const REQUIRED_TEXT_FIELDS: &[&str] = &["name", "description", "source"];

/// Every typed field; free-form extras may not reuse these names.
pub const KNOWN_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "source",
    "file_format",
    "data_types",
    "used_in_projects",
    "date_created",
];

/// Metadata describing one external data artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable slug-shaped id. Empty on a draft that has not been saved yet.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: String,
    /// URI or code snippet describing where the data comes from.
    pub source: String,
    #[serde(default)]
    pub file_format: String,
    #[serde(default)]
    pub data_types: Vec<String>,
    #[serde(default)]
    pub used_in_projects: Vec<String>,
    pub date_created: NaiveDate,
    /// Free-form optional fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    /// Create an unsaved record with the required fields set.
    pub fn draft(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
        date_created: NaiveDate,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            source: source.into(),
            file_format: String::new(),
            data_types: Vec::new(),
            used_in_projects: Vec::new(),
            date_created,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = format.into();
        self
    }

    pub fn with_data_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used_in_projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build a record from an untyped JSON payload, reporting the first
    /// offending field.
    ///
    /// `id_hint` names the record in error messages when the payload itself
    /// carries no usable id (e.g. the key it was stored under).
    pub fn from_value(value: Value, id_hint: Option<&str>) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CatalogError::validation(
                id_hint,
                "record",
                "payload must be a JSON object",
            ));
        };

        let id = match map.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                return Err(CatalogError::validation(id_hint, "id", "must be a string"));
            }
        };
        let label = id.filter(|s| !s.is_empty()).or(id_hint);

        for field in REQUIRED_TEXT_FIELDS {
            require_text(&map, field, label)?;
        }

        match map.get("date_created") {
            None | Some(Value::Null) => {
                return Err(CatalogError::validation(label, "date_created", "is required"));
            }
            Some(Value::String(s)) if parse_calendar_date(s).is_some() => {}
            Some(other) => {
                return Err(CatalogError::validation(
                    label,
                    "date_created",
                    format!("expected a YYYY-MM-DD calendar date, got {}", other),
                ));
            }
        }

        match map.get("file_format") {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => {
                return Err(CatalogError::validation(label, "file_format", "must be a string"));
            }
        }

        for field in ["data_types", "used_in_projects"] {
            match map.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
                Some(_) => {
                    return Err(CatalogError::validation(
                        label,
                        field,
                        "must be a list of strings",
                    ));
                }
            }
        }

        let label = label.map(String::from);
        let mut map = map;
        // `null` for an optional field means "not set".
        for field in ["id", "file_format", "data_types", "used_in_projects"] {
            if map.get(field).is_some_and(Value::is_null) {
                map.remove(field);
            }
        }

        let record: Record = serde_json::from_value(Value::Object(map)).map_err(|e| {
            CatalogError::validation(label.as_deref(), "record", e.to_string())
        })?;
        record.validate()?;
        Ok(record)
    }

    /// Check the invariants a stored record must satisfy.
    ///
    /// An empty id is accepted here; the store assigns one before writing.
    pub fn validate(&self) -> Result<()> {
        let label = (!self.id.is_empty()).then_some(self.id.as_str());

        if !self.id.is_empty() && !is_valid_id(&self.id) {
            return Err(CatalogError::validation(
                label,
                "id",
                "must be lowercase letters and digits separated by single hyphens",
            ));
        }

        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("source", &self.source),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::validation(label, field, "must not be empty"));
            }
        }

        for (field, values) in [
            ("data_types", &self.data_types),
            ("used_in_projects", &self.used_in_projects),
        ] {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(CatalogError::validation(
                    label,
                    field,
                    "must not contain empty entries",
                ));
            }
        }

        for key in self.extra.keys() {
            if key.is_empty() || KNOWN_FIELDS.contains(&key.as_str()) {
                return Err(CatalogError::validation(
                    label,
                    key.as_str(),
                    "is not a valid free-form field name",
                ));
            }
        }

        Ok(())
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn require_text(map: &Map<String, Value>, field: &str, label: Option<&str>) -> Result<()> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(Value::String(_)) => Err(CatalogError::validation(label, field, "must not be empty")),
        None | Some(Value::Null) => Err(CatalogError::validation(label, field, "is required")),
        Some(_) => Err(CatalogError::validation(label, field, "must be a string")),
    }
}
