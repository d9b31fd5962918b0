//! Transport seam
//!
//! Everything the pipeline sends goes through [`Transport`]. The production
//! implementation is [`crate::HttpChannel`]; tests script responses in memory.

use async_trait::async_trait;
use serde_json::Value;
use sitepage_odata::{parse_body, ShapeError};
use std::fmt::{self, Display, Formatter};

/// HTTP verb. Writes tunnel MERGE through POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Request descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Header value by name, case-insensitive
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Parse the body as JSON
    ///
    /// # Errors
    /// `ShapeError::InvalidJson` tagged with `context`
    pub fn json(&self, context: &str) -> Result<Value, ShapeError> {
        parse_body(&self.body, context)
    }
}

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Server answered with a status the caller does not handle
    #[error("{context}: HTTP {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    /// No response was received
    #[error("{context}: request failed: {message}")]
    Request { context: String, message: String },

    #[error("{context}: timed out")]
    Timeout { context: String },
}

impl TransportError {
    /// Create status error from a response, truncating long bodies
    #[must_use]
    pub fn from_response(context: impl Into<String>, response: &ApiResponse) -> Self {
        const MAX_BODY: usize = 512;
        let body = match response.body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => format!("{}...", &response.body[..idx]),
            None => response.body.clone(),
        };
        Self::Status {
            context: context.into(),
            status: response.status,
            body,
        }
    }

    /// HTTP status, when one was received
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authenticated request channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Non-success statuses are returned, not raised.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
