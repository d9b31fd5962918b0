//! Site-scoped REST client
//!
//! Wraps a [`Transport`] with the site base address. Read helpers map 404 to
//! `None` so callers decide whether not-found is recoverable; every other
//! non-success status becomes a `TransportError`.

use crate::error::{PipelineError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sitepage_odata::{decode_records, next_link};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Characters escaped inside quoted OData literals and query values
const LITERAL: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Quote-escape an OData string literal (`'` becomes `''`)
#[must_use]
pub fn odata_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// OData-escape, then percent-encode for use inside a URL
#[must_use]
pub fn odata_literal(value: &str) -> String {
    utf8_percent_encode(&odata_escape(value), LITERAL).to_string()
}

/// Client bound to one site
#[derive(Clone)]
pub struct SiteClient {
    transport: Arc<dyn Transport>,
    site: Url,
    base: String,
}

impl std::fmt::Debug for SiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteClient").field("site", &self.base).finish_non_exhaustive()
    }
}

impl SiteClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, site: Url) -> Self {
        let base = site.as_str().trim_end_matches('/').to_string();
        Self {
            transport,
            site,
            base,
        }
    }

    #[inline]
    #[must_use]
    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Site base without trailing slash
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<site>/_api/<relative>`
    #[must_use]
    pub fn api_url(&self, relative: &str) -> String {
        format!("{}/_api/{}", self.base, relative.trim_start_matches('/'))
    }

    /// Send and return the response whatever its status
    ///
    /// # Errors
    /// Transport failures only
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        Ok(self.transport.send(request).await?)
    }

    /// Send; 404 → `None`, other non-success → `TransportError`
    ///
    /// # Errors
    /// `TransportError` for failures and unhandled statuses
    pub async fn send_optional(
        &self,
        request: ApiRequest,
        context: &str,
    ) -> Result<Option<ApiResponse>> {
        let response = self.execute(request).await?;
        if response.is_not_found() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(TransportError::from_response(context, &response).into());
        }
        Ok(Some(response))
    }

    /// Send; any non-success (404 included) → `TransportError`
    ///
    /// # Errors
    /// `TransportError` for failures and every non-success status
    pub async fn send_required(&self, request: ApiRequest, context: &str) -> Result<ApiResponse> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(TransportError::from_response(context, &response).into());
        }
        Ok(response)
    }

    /// GET a JSON document; 404 → `None`
    ///
    /// # Errors
    /// `TransportError` for unhandled statuses, `ShapeError` for non-JSON bodies
    pub async fn get_json(&self, url: String, context: &str) -> Result<Option<Value>> {
        match self.send_optional(ApiRequest::get(url), context).await? {
            Some(response) => Ok(Some(response.json(context)?)),
            None => Ok(None),
        }
    }

    /// GET a JSON document that must exist
    ///
    /// # Errors
    /// `TransportError` for every non-success status, `ShapeError` for non-JSON bodies
    pub async fn get_json_required(&self, url: String, context: &str) -> Result<Value> {
        let response = self.send_required(ApiRequest::get(url), context).await?;
        Ok(response.json(context)?)
    }

    /// GET every page of a list, following next-page links
    ///
    /// A 404 on the first page is `None`; once the list exists, a missing
    /// continuation page is an error.
    ///
    /// # Errors
    /// `TransportError` for unhandled statuses, `ShapeError` for unknown shapes,
    /// `InvalidAddress` for a next-page link that is not a URL
    pub async fn get_all_records<T: DeserializeOwned>(
        &self,
        url: String,
        context: &str,
    ) -> Result<Option<Vec<T>>> {
        let Some(mut document) = self.get_json(url.clone(), context).await? else {
            return Ok(None);
        };
        let mut records: Vec<T> = Vec::new();
        let mut seen = HashSet::from([url]);

        loop {
            records.extend(decode_records::<T>(&document, context)?);
            let Some(link) = next_link(&document) else {
                break;
            };
            let next = self
                .site
                .join(link)
                .map_err(|e| PipelineError::invalid_address(link, e.to_string()))?
                .to_string();
            if !seen.insert(next.clone()) {
                tracing::warn!("{}: next-page link repeats {}; stopping", context, next);
                break;
            }
            tracing::debug!("{}: fetching next page ({} records so far)", context, records.len());
            document = self.get_json_required(next, context).await?;
        }

        Ok(Some(records))
    }
}
