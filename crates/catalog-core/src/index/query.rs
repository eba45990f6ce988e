//! FTS5 match expression building.

use super::entry::IndexColumn;

/// One free-text part of a match expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTerm<'a> {
    /// A word matched as a token prefix (`cli` matches `climate`).
    Prefix(&'a str),
    /// Words that must appear adjacent and in order.
    Phrase(&'a str),
}

/// A complete FTS5 `MATCH` expression. Empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchExpression(String);

impl MatchExpression {
    /// The expression that matches every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build an expression: any of `any_of`, AND every column filter in `all_of`.
    ///
    /// Terms without a single alphanumeric character can't produce tokens and
    /// are skipped.
    ///
    /// - `[Prefix("gpt-2"), Prefix("base")]` → `"gpt-2"* OR "base"*`
    /// - `[Phrase("daily weather")]` + `[(UsedInProjects, "Gideon")]`
    ///   → `("daily weather") AND used_in_projects : "gideon"`
    pub fn build(any_of: &[MatchTerm<'_>], all_of: &[(IndexColumn, &str)]) -> Self {
        let text: Vec<String> = any_of
            .iter()
            .filter_map(|term| match term {
                MatchTerm::Prefix(word) => quote_fts5_string(word).map(|q| format!("{}*", q)),
                MatchTerm::Phrase(phrase) => quote_fts5_string(phrase),
            })
            .collect();

        let columns: Vec<String> = all_of
            .iter()
            .filter_map(|(column, value)| {
                quote_fts5_string(value).map(|q| format!("{} : {}", column.column_name(), q))
            })
            .collect();

        let mut parts = Vec::new();
        if !text.is_empty() {
            let disjunction = text.join(" OR ");
            if columns.is_empty() {
                parts.push(disjunction);
            } else {
                parts.push(format!("({})", disjunction));
            }
        }
        parts.extend(columns);

        Self(parts.join(" AND "))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote text as an FTS5 string, lowercased and with embedded quotes doubled.
///
/// Returns `None` for text the tokenizer would reduce to nothing.
pub fn quote_fts5_string(text: &str) -> Option<String> {
    let text = text.trim().to_lowercase();
    if !text.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some(format!("\"{}\"", text.replace('"', "\"\"")))
}
