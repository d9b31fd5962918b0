//! HTTP transport over `reqwest`
//!
//! The session itself (cookies or a bearer token) is acquired elsewhere and
//! handed in as [`SessionCredentials`].

use crate::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

/// Media type for requests and responses without OData metadata
pub const NOMETADATA: &str = "application/json;odata=nometadata";

/// Credentials of an authenticated browser or app session
#[derive(Clone)]
pub enum SessionCredentials {
    /// Name/value cookie pairs, sent as one `Cookie` header
    Cookies(Vec<(String, String)>),
    /// `Authorization: Bearer` token
    Bearer(String),
}

impl SessionCredentials {
    /// `Cookie` header value
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        match self {
            Self::Cookies(pairs) if !pairs.is_empty() => Some(
                pairs
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }

    fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Bearer(token) => builder.bearer_auth(token),
            Self::Cookies(_) => match self.cookie_header() {
                Some(cookie) => builder.header(COOKIE, cookie),
                None => builder,
            },
        }
    }
}

impl Debug for SessionCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookies(pairs) => f
                .debug_tuple("Cookies")
                .field(&pairs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>())
                .finish(),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Production [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: reqwest::Client,
    credentials: SessionCredentials,
}

impl HttpChannel {
    /// Create channel with a per-request timeout
    ///
    /// # Errors
    /// `TransportError::Request` if the client cannot be built
    pub fn new(credentials: SessionCredentials, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(NOMETADATA));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Request {
                context: "http client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl Transport for HttpChannel {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let has_content_type = request.header(CONTENT_TYPE.as_str()).is_some();
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(url.as_str()),
            Method::Post => self.client.post(url.as_str()),
        };
        builder = self.credentials.apply(builder);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if method == Method::Post {
            if !has_content_type {
                builder = builder.header(CONTENT_TYPE, NOMETADATA);
            }
            builder = builder.body(body.unwrap_or_default());
        }

        tracing::debug!("{} {}", method, url);
        let response = builder.send().await.map_err(|e| classify(&url, &e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(&url, &e))?;
        tracing::debug!("{} {} -> {}", method, url, status);

        Ok(ApiResponse { status, body })
    }
}

fn classify(url: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            context: url.to_string(),
        }
    } else {
        TransportError::Request {
            context: url.to_string(),
            message: error.to_string(),
        }
    }
}
