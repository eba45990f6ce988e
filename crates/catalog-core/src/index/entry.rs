//! Field model at the search index boundary.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A searchable column of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexColumn {
    Name,
    Description,
    Source,
    FileFormat,
    DataTypes,
    UsedInProjects,
}

impl IndexColumn {
    /// Columns in table order (after the unindexed `id`).
    pub const ALL: [IndexColumn; 6] = [
        IndexColumn::Name,
        IndexColumn::Description,
        IndexColumn::Source,
        IndexColumn::FileFormat,
        IndexColumn::DataTypes,
        IndexColumn::UsedInProjects,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            IndexColumn::Name => "name",
            IndexColumn::Description => "description",
            IndexColumn::Source => "source",
            IndexColumn::FileFormat => "file_format",
            IndexColumn::DataTypes => "data_types",
            IndexColumn::UsedInProjects => "used_in_projects",
        }
    }

    /// The record's value(s) for this column.
    pub fn field_of(self, record: &Record) -> IndexField {
        match self {
            IndexColumn::Name => IndexField::Scalar(record.name.clone()),
            IndexColumn::Description => IndexField::Scalar(record.description.clone()),
            IndexColumn::Source => IndexField::Scalar(record.source.clone()),
            IndexColumn::FileFormat => IndexField::Scalar(record.file_format.clone()),
            IndexColumn::DataTypes => IndexField::List(record.data_types.clone()),
            IndexColumn::UsedInProjects => IndexField::List(record.used_in_projects.clone()),
        }
    }
}

/// A field value handed to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexField {
    Scalar(String),
    List(Vec<String>),
}

impl IndexField {
    /// The text the tokenizer sees.
    ///
    /// List items are joined by single spaces, so `["Climate ML"]` and
    /// `["Climate", "ML"]` index identically.
    pub fn flatten(&self) -> String {
        match self {
            IndexField::Scalar(value) => value.trim().to_string(),
            IndexField::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// The per-record projection stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    pub fields: BTreeMap<IndexColumn, IndexField>,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, column: IndexColumn, field: IndexField) -> Self {
        self.fields.insert(column, field);
        self
    }

    pub fn from_record(record: &Record) -> Self {
        IndexColumn::ALL
            .into_iter()
            .fold(Self::new(record.id.clone()), |entry, column| {
                entry.with_field(column, column.field_of(record))
            })
    }

    /// Flattened text per column, in table order. Missing columns are empty.
    pub fn flattened(&self) -> [String; 6] {
        IndexColumn::ALL.map(|column| {
            self.fields
                .get(&column)
                .map(IndexField::flatten)
                .unwrap_or_default()
        })
    }
}
