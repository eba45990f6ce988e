//! User query parsing.
//!
//! Turns what a user typed into a [`ParsedQuery`]. Parsing never fails:
//! anything that doesn't form a usable filter or term is dropped, so a sloppy
//! query searches more broadly instead of erroring.
//!
//! ```
//! use catalog_core::query::{parse_query, TextTerm};
//!
//! let query = parse_query(r#"rain "daily totals" project:Gideon date:>2023-01-01 x"#);
//! assert_eq!(
//!     query.terms,
//!     vec![
//!         TextTerm::Word("rain".into()),
//!         TextTerm::Phrase("daily totals".into()),
//!     ]
//! );
//! assert_eq!(query.filters.len(), 2);
//! ```

mod fields;

pub use fields::{lookup_field, FilterField};

use crate::config::IndexConfig;
use crate::record::parse_calendar_date;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One free-text part of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TextTerm {
    /// A bare word, matched as a prefix.
    Word(String),
    /// A quoted phrase, matched as adjacent words.
    Phrase(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    GreaterThan,
    LessThan,
}

/// A `field:op value` restriction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: FilterField,
    pub op: FilterOp,
    pub value: String,
}

/// The structured form of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub terms: Vec<TextTerm>,
    pub filters: BTreeSet<FieldFilter>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.filters.is_empty()
    }
}

/// Parse a query string.
pub fn parse_query(input: &str) -> ParsedQuery {
    let mut query = ParsedQuery::default();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if let Some(after_quote) = rest.strip_prefix('"') {
            let (phrase, remaining) = take_quoted(after_quote);
            let phrase = phrase.trim();
            if !phrase.is_empty() {
                query.terms.push(TextTerm::Phrase(phrase.to_string()));
            }
            rest = remaining;
            continue;
        }

        let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let token = &rest[..token_end];

        match split_filter(token) {
            Some((name, after_colon)) => {
                let (op, value_start) = match after_colon.chars().next() {
                    Some('>') => (FilterOp::GreaterThan, 1),
                    Some('<') => (FilterOp::LessThan, 1),
                    _ => (FilterOp::Equals, 0),
                };

                // Offset of the value within `rest`; a quoted value may run
                // past the current token.
                let value_offset = name.len() + 1 + value_start;
                let (value, remaining) = match rest[value_offset..].strip_prefix('"') {
                    Some(after_quote) => take_quoted(after_quote),
                    None => (&rest[value_offset..token_end], &rest[token_end..]),
                };

                if let Some(filter) = make_filter(name, op, value) {
                    query.filters.insert(filter);
                }
                rest = remaining;
            }
            None => {
                if token.chars().count() >= IndexConfig::MIN_TERM_CHARS {
                    query.terms.push(TextTerm::Word(token.to_string()));
                }
                rest = &rest[token_end..];
            }
        }
    }

    query
}

/// Split `text` at the closing quote. An unterminated quote runs to the end.
fn take_quoted(text: &str) -> (&str, &str) {
    match text.find('"') {
        Some(end) => (&text[..end], &text[end + 1..]),
        None => (text, ""),
    }
}

/// `name:rest` where `name` is an identifier.
fn split_filter(token: &str) -> Option<(&str, &str)> {
    let (name, rest) = token.split_once(':')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, rest))
}

fn make_filter(name: &str, op: FilterOp, value: &str) -> Option<FieldFilter> {
    let field = lookup_field(name)?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let value = match field {
        FilterField::DateCreated => parse_calendar_date(value)?.format("%Y-%m-%d").to_string(),
        FilterField::Column(_) => value.to_string(),
    };

    Some(FieldFilter { field, op, value })
}
