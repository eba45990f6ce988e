//! Filters evaluated against stored records rather than the index.

use crate::index::IndexColumn;
use crate::query::{FieldFilter, FilterField, FilterOp};
use crate::record::{parse_calendar_date, Record};
use std::cmp::Ordering;

/// Whether the index can answer `filter` as a column match.
///
/// Only equality on a tokenized column can; ranges and dates are checked on
/// the joined records.
pub(crate) fn is_index_filter(filter: &FieldFilter) -> bool {
    matches!(
        (filter.field, filter.op),
        (FilterField::Column(_), FilterOp::Equals)
    )
}

/// Evaluate a record-side filter.
///
/// Text compares case-insensitively by code point; a list field matches when
/// any item does. An empty list or empty scalar never matches a range.
pub(crate) fn record_matches(filter: &FieldFilter, record: &Record) -> bool {
    match filter.field {
        FilterField::DateCreated => match parse_calendar_date(&filter.value) {
            Some(date) => op_accepts(filter.op, record.date_created.cmp(&date)),
            None => false,
        },
        FilterField::Column(column) => {
            let wanted = filter.value.to_lowercase();
            text_values(column, record)
                .into_iter()
                .filter(|v| !v.trim().is_empty())
                .any(|v| op_accepts(filter.op, v.to_lowercase().cmp(&wanted)))
        }
    }
}

fn op_accepts(op: FilterOp, ordering: Ordering) -> bool {
    match op {
        FilterOp::Equals => ordering == Ordering::Equal,
        FilterOp::GreaterThan => ordering == Ordering::Greater,
        FilterOp::LessThan => ordering == Ordering::Less,
    }
}

fn text_values(column: IndexColumn, record: &Record) -> Vec<&str> {
    match column {
        IndexColumn::Name => vec![record.name.as_str()],
        IndexColumn::Description => vec![record.description.as_str()],
        IndexColumn::Source => vec![record.source.as_str()],
        IndexColumn::FileFormat => vec![record.file_format.as_str()],
        IndexColumn::DataTypes => record.data_types.iter().map(String::as_str).collect(),
        IndexColumn::UsedInProjects => record.used_in_projects.iter().map(String::as_str).collect(),
    }
}
