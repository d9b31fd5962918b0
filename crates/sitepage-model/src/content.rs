//! Page content documents
//!
//! The update pipeline never interprets a [`ContentDocument`]; it only carries
//! it to the server. [`ContentDocument::text_canvas`] exists for callers that
//! want a minimal one-column page from an HTML fragment.

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Client-side web part id of the built-in text part
pub const TEXT_WEB_PART_ID: &str = "d1d91016-032f-456d-98a4-721247c305e8";

/// Opaque, immutable page payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument(Arc<str>);

impl ContentDocument {
    /// Wrap a serialized payload as-is
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// One-column canvas holding a single text part with `html` as its body
    #[must_use]
    pub fn text_canvas(html: &str) -> Self {
        let canvas = json!([
            {
                "controlType": 4,
                "id": Uuid::new_v4().to_string(),
                "position": {
                    "zoneIndex": 1,
                    "sectionIndex": 1,
                    "controlIndex": 1,
                    "layoutIndex": 1,
                    "sectionFactor": 12
                },
                "emphasis": {},
                "innerHTML": html,
                "webPartId": TEXT_WEB_PART_ID,
                "webPartData": {
                    "id": TEXT_WEB_PART_ID,
                    "instanceId": Uuid::new_v4().to_string(),
                    "title": "Text",
                    "dataVersion": "2.9",
                    "properties": { "Title": "", "Text": html },
                    "serverProcessedContent": { "htmlStrings": {} }
                }
            },
            { "controlType": 0, "pageSettingsSlice": { "isDefaultDescription": true, "isDefaultThumbnail": true } }
        ]);
        Self::new(canvas.to_string())
    }

    /// Borrow the payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for an empty payload
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ContentDocument {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for ContentDocument {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
