//! Envelope shapes
//!
//! The server wraps list results either as `{"value": [...]}` or, in verbose
//! mode, as `{"d": {"results": [...]}}`. Nested lists (search rows, cells) are
//! either a bare array or `{"results": [...]}`. These are the only shapes
//! recognized; anything else is a [`ShapeError`].
//!
//! Paged lists carry the next page's URL as `odata.nextLink` (or
//! `@odata.nextLink`) in the modern shape and `d.__next` in the verbose one.

use crate::error::ShapeError;
use serde_json::{Map, Value};

/// Recognized list envelope, borrowing the records it wraps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope<'a> {
    /// `{"value": [...]}`
    Modern(&'a [Value]),
    /// `{"d": {"results": [...]}}`
    Verbose(&'a [Value]),
}

impl<'a> Envelope<'a> {
    /// Detect the envelope, preferring the modern shape when both are present
    #[must_use]
    pub fn detect(document: &'a Value) -> Option<Self> {
        if let Some(records) = document.get("value").and_then(Value::as_array) {
            return Some(Self::Modern(records));
        }
        document
            .get("d")
            .and_then(|d| d.get("results"))
            .and_then(Value::as_array)
            .map(|records| Self::Verbose(records))
    }

    /// Wrapped records
    #[inline]
    #[must_use]
    pub fn records(&self) -> &'a [Value] {
        match self {
            Self::Modern(records) | Self::Verbose(records) => records,
        }
    }

    /// Short name of the shape, for logs
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Modern(_) => "modern",
            Self::Verbose(_) => "verbose",
        }
    }
}

/// Parse a response body
///
/// # Errors
/// `ShapeError::InvalidJson` tagged with `context`
pub fn parse_body(body: &str, context: &str) -> Result<Value, ShapeError> {
    serde_json::from_str(body).map_err(|e| ShapeError::InvalidJson {
        context: context.to_string(),
        message: e.to_string(),
    })
}

/// Extract the record list from either envelope
///
/// # Errors
/// `ShapeError::UnrecognizedEnvelope` tagged with `context`
pub fn extract_array<'a>(document: &'a Value, context: &str) -> Result<&'a [Value], ShapeError> {
    Envelope::detect(document)
        .map(|envelope| envelope.records())
        .ok_or_else(|| ShapeError::unrecognized(context))
}

/// URL of the next page of a list response, if the server paged it
#[must_use]
pub fn next_link(document: &Value) -> Option<&str> {
    ["odata.nextLink", "@odata.nextLink"]
        .iter()
        .find_map(|key| document.get(*key))
        .or_else(|| document.get("d").and_then(|d| d.get("__next")))
        .and_then(Value::as_str)
        .filter(|link| !link.trim().is_empty())
}

/// Bare array or `{"results": [...]}`
#[must_use]
pub fn nested_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => map.get("results").and_then(Value::as_array).map(Vec::as_slice),
        _ => None,
    }
}

/// Single-record body: the root object, or `d` (descending into
/// `d.<verbose_key>` when given and present) in verbose mode
///
/// # Errors
/// `ShapeError::UnrecognizedEnvelope` if the body is not an object
pub fn extract_object<'a>(
    document: &'a Value,
    verbose_key: Option<&str>,
    context: &str,
) -> Result<&'a Map<String, Value>, ShapeError> {
    if let Some(d) = document.get("d").and_then(Value::as_object) {
        let inner = verbose_key
            .and_then(|key| d.get(key))
            .and_then(Value::as_object);
        return Ok(inner.unwrap_or(d));
    }
    document
        .as_object()
        .ok_or_else(|| ShapeError::unrecognized(context))
}

/// Look a field up at the root first, then under `d` / `d.<verbose_key>`
#[must_use]
pub fn find_field<'a>(document: &'a Value, verbose_key: Option<&str>, field: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(field) {
        return Some(value);
    }
    let d = document.get("d")?;
    verbose_key
        .and_then(|key| d.get(key))
        .and_then(|inner| inner.get(field))
        .or_else(|| d.get(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn modern_envelope() {
        let doc = json!({"value": [{"Name": "a"}, {"Name": "b"}]});
        let records = extract_array(&doc, "files").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(Envelope::detect(&doc).unwrap().shape(), "modern");
    }

    #[test]
    fn verbose_envelope() {
        let doc = json!({"d": {"results": [{"Name": "a"}]}});
        let records = extract_array(&doc, "files").unwrap();
        assert_eq!(records[0]["Name"], "a");
        assert_eq!(Envelope::detect(&doc).unwrap().shape(), "verbose");
    }

    #[test]
    fn prefers_modern_when_both_present() {
        let doc = json!({"value": [1], "d": {"results": [1, 2]}});
        assert!(matches!(Envelope::detect(&doc), Some(Envelope::Modern(r)) if r.len() == 1));
    }

    #[test]
    fn third_shape_is_rejected() {
        let doc = json!({"items": [{"Name": "a"}]});
        let err = extract_array(&doc, "files:/x").unwrap_err();
        assert_eq!(err, ShapeError::unrecognized("files:/x"));
    }

    #[test]
    fn value_that_is_not_array_is_rejected() {
        let doc = json!({"value": {"results": []}});
        assert!(extract_array(&doc, "lists").is_err());
    }

    #[test]
    fn next_link_both_shapes() {
        let modern = json!({"value": [], "odata.nextLink": "https://h/_api/x?$skiptoken=2"});
        let annotated = json!({"value": [], "@odata.nextLink": "https://h/_api/x?p=3"});
        let verbose = json!({"d": {"results": [], "__next": "https://h/_api/x?p=4"}});
        assert_eq!(next_link(&modern), Some("https://h/_api/x?$skiptoken=2"));
        assert_eq!(next_link(&annotated), Some("https://h/_api/x?p=3"));
        assert_eq!(next_link(&verbose), Some("https://h/_api/x?p=4"));
    }

    #[test]
    fn last_page_has_no_next_link() {
        assert_eq!(next_link(&json!({"value": []})), None);
        assert_eq!(next_link(&json!({"value": [], "odata.nextLink": " "})), None);
        assert_eq!(next_link(&json!({"d": {"results": [], "__next": null}})), None);
    }

    #[test]
    fn nested_list_both_forms() {
        let bare = json!([1, 2]);
        let wrapped = json!({"results": [1, 2, 3]});
        assert_eq!(nested_list(&bare).unwrap().len(), 2);
        assert_eq!(nested_list(&wrapped).unwrap().len(), 3);
        assert!(nested_list(&json!("x")).is_none());
    }

    #[test]
    fn extract_object_verbose_key() {
        let doc = json!({"d": {"GetContextWebInformation": {"FormDigestValue": "t"}}});
        let obj = extract_object(&doc, Some("GetContextWebInformation"), "ctx").unwrap();
        assert_eq!(obj["FormDigestValue"], "t");
    }

    #[test]
    fn extract_object_modern_root() {
        let doc = json!({"Title": "Team"});
        let obj = extract_object(&doc, None, "web").unwrap();
        assert_eq!(obj["Title"], "Team");
        assert!(extract_object(&json!([1]), None, "web").is_err());
    }

    #[test]
    fn find_field_both_shapes() {
        let modern = json!({"FormDigestValue": "m"});
        let verbose = json!({"d": {"GetContextWebInformation": {"FormDigestValue": "v"}}});
        let key = Some("GetContextWebInformation");
        assert_eq!(find_field(&modern, key, "FormDigestValue").unwrap(), "m");
        assert_eq!(find_field(&verbose, key, "FormDigestValue").unwrap(), "v");
        assert!(find_field(&json!({}), key, "FormDigestValue").is_none());
    }

    #[test]
    fn parse_body_rejects_html() {
        let err = parse_body("<html>", "lists").unwrap_err();
        assert!(matches!(err, ShapeError::InvalidJson { .. }));
    }
}
