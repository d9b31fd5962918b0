//! Read-only checks that explain why an update would fail

use crate::client::{odata_literal, SiteClient};
use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sitepage_odata::{extract_object, ShapeError};

/// Effective permissions of the session on one library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LibraryPermissions {
    pub high: u64,
    pub low: u64,
}

impl LibraryPermissions {
    const VIEW: u64 = 1 << 0;
    const ADD: u64 = 1 << 1;
    const EDIT: u64 = 1 << 2;
    const DELETE: u64 = 1 << 3;

    #[inline]
    #[must_use]
    pub fn can_view(&self) -> bool {
        self.low & Self::VIEW != 0
    }

    #[inline]
    #[must_use]
    pub fn can_add(&self) -> bool {
        self.low & Self::ADD != 0
    }

    #[inline]
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.low & Self::EDIT != 0
    }

    #[inline]
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.low & Self::DELETE != 0
    }
}

/// Basic facts about the web the session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebContext {
    pub title: String,
    pub url: String,
    pub server_relative_url: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    client: SiteClient,
}

impl Diagnostics {
    #[must_use]
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }

    /// Effective base permissions on the library titled `title`
    ///
    /// # Errors
    /// `TransportError` for any non-success status, `ShapeError` when `High`
    /// or `Low` is missing or not numeric
    pub async fn library_permissions(&self, title: &str) -> Result<LibraryPermissions> {
        let context = format!("permissions:{title}");
        let url = self.client.api_url(&format!(
            "web/lists/getByTitle('{}')/EffectiveBasePermissions",
            odata_literal(title)
        ));
        let document = self.client.get_json_required(url, &context).await?;
        let object = extract_object(&document, Some("EffectiveBasePermissions"), &context)?;

        let permissions = LibraryPermissions {
            high: mask(object, "High", &context)?,
            low: mask(object, "Low", &context)?,
        };
        tracing::info!(
            "Permissions on '{}': view={} add={} edit={} delete={}",
            title,
            permissions.can_view(),
            permissions.can_add(),
            permissions.can_edit(),
            permissions.can_delete()
        );
        Ok(permissions)
    }

    /// Title and URLs of the current web
    ///
    /// # Errors
    /// `TransportError` for any non-success status, `ShapeError` for an
    /// unrecognized body
    pub async fn web_context(&self) -> Result<WebContext> {
        let url = self.client.api_url("web?$select=Title,Url,ServerRelativeUrl");
        let document = self.client.get_json_required(url, "web").await?;
        let object = extract_object(&document, None, "web")?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(WebContext {
            title: text("Title"),
            url: text("Url"),
            server_relative_url: text("ServerRelativeUrl"),
        })
    }
}

/// Permission masks arrive as numbers or as decimal strings
fn mask(object: &Map<String, Value>, key: &str, context: &str) -> Result<u64, ShapeError> {
    let parsed = match object.get(key) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ShapeError::MalformedRecord {
        context: context.to_string(),
        index: 0,
        message: format!("{key} is missing or not an unsigned integer"),
    })
}
