//! Query field names.

use crate::index::IndexColumn;
use serde::{Deserialize, Serialize};

/// What a filter restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// A tokenized index column.
    Column(IndexColumn),
    /// The record's creation date, compared as a calendar date.
    DateCreated,
}

/// Map a user-typed field name to what it filters. Case-insensitive.
pub fn lookup_field(name: &str) -> Option<FilterField> {
    let field = match name.to_ascii_lowercase().as_str() {
        "name" => FilterField::Column(IndexColumn::Name),
        "description" | "desc" => FilterField::Column(IndexColumn::Description),
        "source" => FilterField::Column(IndexColumn::Source),
        "format" | "file_format" => FilterField::Column(IndexColumn::FileFormat),
        "project" | "projects" | "used_in_projects" => FilterField::Column(IndexColumn::UsedInProjects),
        "type" | "types" | "data_types" => FilterField::Column(IndexColumn::DataTypes),
        "date" | "created" | "date_created" => FilterField::DateCreated,
        _ => return None,
    };
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_fields() {
        assert_eq!(
            lookup_field("project"),
            Some(FilterField::Column(IndexColumn::UsedInProjects))
        );
        assert_eq!(
            lookup_field("Format"),
            Some(FilterField::Column(IndexColumn::FileFormat))
        );
        assert_eq!(lookup_field("DATE"), Some(FilterField::DateCreated));
    }

    #[test]
    fn test_lookup_unknown_field() {
        assert_eq!(lookup_field("color"), None);
        assert_eq!(lookup_field(""), None);
    }
}
