//! Full-text search results
//!
//! Rows live at `PrimaryQueryResult.RelevantResults.Table.Rows` (modern) or
//! under `d.query` (verbose). Each row carries `Cells`, a list of
//! `{Key, Value}` pairs. Both `Rows` and `Cells` accept the nested-list forms
//! of [`nested_list`].

use crate::envelope::nested_list;
use crate::error::ShapeError;
use serde_json::Value;
use sitepage_model::{normalize, ResourcePath};
use url::Url;

/// Field holding a server-relative path
pub const RELATIVE_FIELD: &str = "ServerRelativeUrl";

/// Absolute URL fields in the order they are tried
pub const ABSOLUTE_FIELDS: [&str; 4] = ["Path", "OriginalPath", "ServerRedirectedURL", "ParentLink"];

/// Projection requested from the search endpoint
pub const DEFAULT_SELECT_PROPERTIES: [&str; 7] = [
    "Title",
    "Path",
    "ServerRelativeUrl",
    "OriginalPath",
    "ServerRedirectedURL",
    "ParentLink",
    "SPWebUrl",
];

const TABLE_PATH: [&str; 4] = ["PrimaryQueryResult", "RelevantResults", "Table", "Rows"];

/// One search result row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRow {
    cells: Vec<(String, String)>,
}

impl SearchRow {
    /// Build a row from key/value pairs
    pub fn from_cells<K, V>(cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Cell value by key, case-insensitive; blank values count as absent
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Extract result rows from either search envelope
///
/// # Errors
/// `ShapeError::UnrecognizedEnvelope` when the row table cannot be found
pub fn extract_rows(document: &Value, context: &str) -> Result<Vec<SearchRow>, ShapeError> {
    let table = descend(document)
        .or_else(|| document.get("d").and_then(|d| d.get("query")).and_then(descend))
        .ok_or_else(|| ShapeError::unrecognized(context))?;
    let rows = nested_list(table).ok_or_else(|| ShapeError::unrecognized(context))?;

    Ok(rows
        .iter()
        .filter_map(|row| row.get("Cells").and_then(nested_list))
        .map(|cells| {
            SearchRow::from_cells(cells.iter().filter_map(|cell| {
                let key = cell.get("Key")?.as_str()?;
                let value = cell_text(cell.get("Value")?)?;
                Some((key.to_string(), value))
            }))
        })
        .collect())
}

fn descend(root: &Value) -> Option<&Value> {
    TABLE_PATH.iter().try_fold(root, |node, key| node.get(*key))
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Picks a page path out of search rows
///
/// Per row: the relative field wins if it carries the page extension; else
/// each absolute field in [`ABSOLUTE_FIELDS`] order. First row with a usable
/// path wins.
#[derive(Debug, Clone)]
pub struct PathSelector<'a> {
    extension: &'a str,
    preferred_host: Option<&'a str>,
}

impl<'a> PathSelector<'a> {
    #[must_use]
    pub fn new(extension: &'a str) -> Self {
        Self {
            extension,
            preferred_host: None,
        }
    }

    /// Only accept absolute URLs on this host
    #[must_use]
    pub fn with_preferred_host(mut self, host: Option<&'a str>) -> Self {
        self.preferred_host = host;
        self
    }

    #[must_use]
    pub fn select(&self, rows: &[SearchRow]) -> Option<ResourcePath> {
        rows.iter().find_map(|row| self.select_row(row))
    }

    fn select_row(&self, row: &SearchRow) -> Option<ResourcePath> {
        if let Some(relative) = row.get(RELATIVE_FIELD) {
            let path = normalize(relative);
            if path.has_extension(self.extension) {
                return Some(path);
            }
        }
        ABSOLUTE_FIELDS
            .iter()
            .filter_map(|field| row.get(field))
            .find_map(|raw| self.path_from_absolute(raw))
    }

    fn path_from_absolute(&self, raw: &str) -> Option<ResourcePath> {
        let url = Url::parse(raw.trim()).ok()?;
        if let Some(host) = self.preferred_host {
            if !url.host_str()?.eq_ignore_ascii_case(host) {
                return None;
            }
        }
        let path = normalize(url.path());
        path.has_extension(self.extension).then_some(path)
    }
}
