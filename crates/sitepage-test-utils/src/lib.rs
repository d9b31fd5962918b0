//! Testing utilities for the sitepage workspace
//!
//! Scripted in-memory transport and JSON fixtures for both envelope shapes.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sitepage_core::{
    encode_decoded_url, file_resource, ApiRequest, ApiResponse, Method, Pipeline, PipelineConfig,
    SiteClient, Transport, TransportError,
};
use sitepage_model::{normalize, AddressingScheme, ResourcePath};
use std::sync::Arc;
use url::Url;

pub const SITE: &str = "https://contoso.example/sites/X";

#[derive(Debug)]
struct Rule {
    method: Method,
    fragment: String,
    response: ApiResponse,
}

/// In-memory [`Transport`]
///
/// A request is answered by the first rule whose method matches and whose
/// fragment occurs in the URL; unmatched requests get an empty 404. Every
/// request is logged.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn respond(self, method: Method, fragment: impl Into<String>, response: ApiResponse) -> Self {
        self.rules.lock().push(Rule {
            method,
            fragment: fragment.into(),
            response,
        });
        self
    }

    #[must_use]
    pub fn get_json(self, fragment: impl Into<String>, body: &Value) -> Self {
        self.respond(Method::Get, fragment, ApiResponse::new(200, body.to_string()))
    }

    #[must_use]
    pub fn get_status(self, fragment: impl Into<String>, status: u16) -> Self {
        self.respond(Method::Get, fragment, ApiResponse::new(status, ""))
    }

    #[must_use]
    pub fn post_json(self, fragment: impl Into<String>, body: &Value) -> Self {
        self.respond(Method::Post, fragment, ApiResponse::new(200, body.to_string()))
    }

    #[must_use]
    pub fn post_status(self, fragment: impl Into<String>, status: u16) -> Self {
        self.respond(Method::Post, fragment, ApiResponse::new(status, ""))
    }

    /// Every request sent so far
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().clone()
    }

    /// Number of logged requests matching `method` and `fragment`
    #[must_use]
    pub fn count(&self, method: Method, fragment: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.contains(fragment))
            .count()
    }

    /// Logged URLs, in order
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.log.lock().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self
            .rules
            .lock()
            .iter()
            .find(|rule| rule.method == request.method && request.url.contains(&rule.fragment))
            .map_or_else(|| ApiResponse::new(404, ""), |rule| rule.response.clone());
        self.log.lock().push(request);
        Ok(response)
    }
}

/// Site URL used by every fixture
#[must_use]
pub fn site() -> Url {
    Url::parse(SITE).expect("fixture site URL")
}

#[must_use]
pub fn client(transport: &Arc<ScriptedTransport>) -> SiteClient {
    SiteClient::new(Arc::clone(transport) as Arc<dyn Transport>, site())
}

#[must_use]
pub fn pipeline(transport: &Arc<ScriptedTransport>, config: PipelineConfig) -> Pipeline {
    Pipeline::new(Arc::clone(transport) as Arc<dyn Transport>, site(), config)
}

/// URL fragments identifying each endpoint
pub mod endpoints {
    use super::*;

    pub const LISTS: &str = "/_api/web/lists?";
    pub const CONTEXT_INFO: &str = "/_api/contextinfo";
    pub const SEARCH: &str = "/_api/search/query";

    #[must_use]
    pub fn files_of(folder: &str) -> String {
        format!("decodedurl='{}')/Files", encode_decoded_url(&normalize(folder)))
    }

    #[must_use]
    pub fn folders_of(folder: &str) -> String {
        format!("decodedurl='{}')/Folders", encode_decoded_url(&normalize(folder)))
    }

    #[must_use]
    pub fn items_of(list_id: &str) -> String {
        format!("lists(guid'{list_id}')/items")
    }

    fn file(scheme: AddressingScheme, path: &str) -> String {
        file_resource(scheme, &normalize(path))
    }

    #[must_use]
    pub fn probe(scheme: AddressingScheme, path: &str) -> String {
        format!("{}?$select=UniqueId", file(scheme, path))
    }

    #[must_use]
    pub fn merge(scheme: AddressingScheme, path: &str) -> String {
        format!("{}/ListItemAllFields", file(scheme, path))
    }

    #[must_use]
    pub fn publish(scheme: AddressingScheme, path: &str) -> String {
        format!("{}/Publish(", file(scheme, path))
    }

    #[must_use]
    pub fn read_content(scheme: AddressingScheme, path: &str) -> String {
        format!("{}/ListItemAllFields?$select=CanvasContent1", file(scheme, path))
    }
}

/// JSON bodies
pub mod fixtures {
    use super::*;

    #[must_use]
    pub fn modern(records: Vec<Value>) -> Value {
        json!({ "value": records })
    }

    #[must_use]
    pub fn verbose(records: Vec<Value>) -> Value {
        json!({ "d": { "results": records } })
    }

    #[must_use]
    pub fn file(folder: &str, name: &str) -> Value {
        json!({
            "Name": name,
            "ServerRelativeUrl": format!("{}/{}", normalize(folder), name),
            "TimeLastModified": "2024-05-01T10:00:00Z"
        })
    }

    #[must_use]
    pub fn files(folder: &str, names: &[&str]) -> Value {
        modern(names.iter().map(|name| file(folder, name)).collect())
    }

    #[must_use]
    pub fn folder(parent: &str, name: &str) -> Value {
        json!({
            "Name": name,
            "ServerRelativeUrl": format!("{}/{}", normalize(parent), name)
        })
    }

    #[must_use]
    pub fn folders(parent: &str, names: &[&str]) -> Value {
        modern(names.iter().map(|name| folder(parent, name)).collect())
    }

    #[must_use]
    pub fn list(id: &str, title: &str, template: u32, root: &str) -> Value {
        json!({
            "Id": id,
            "Title": title,
            "BaseTemplate": template,
            "RootFolder": { "ServerRelativeUrl": root }
        })
    }

    #[must_use]
    pub fn list_item(file_ref: &str, title: &str) -> Value {
        let path: ResourcePath = normalize(file_ref);
        json!({
            "Id": 1,
            "FileRef": path.as_str(),
            "FileLeafRef": path.leaf().unwrap_or_default(),
            "Title": title
        })
    }

    #[must_use]
    pub fn context_info(digest: &str) -> Value {
        json!({ "FormDigestValue": digest, "FormDigestTimeoutSeconds": 1800 })
    }

    #[must_use]
    pub fn context_info_verbose(digest: &str) -> Value {
        json!({ "d": { "GetContextWebInformation": { "FormDigestValue": digest } } })
    }

    fn cells(row: &[(&str, &str)]) -> Vec<Value> {
        row.iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value, "ValueType": "Edm.String" }))
            .collect()
    }

    #[must_use]
    pub fn search(rows: &[&[(&str, &str)]]) -> Value {
        let rows: Vec<Value> = rows.iter().map(|row| json!({ "Cells": cells(row) })).collect();
        json!({ "PrimaryQueryResult": { "RelevantResults": { "Table": { "Rows": rows } } } })
    }

    #[must_use]
    pub fn search_verbose(rows: &[&[(&str, &str)]]) -> Value {
        let rows: Vec<Value> = rows
            .iter()
            .map(|row| json!({ "Cells": { "results": cells(row) } }))
            .collect();
        json!({ "d": { "query": { "PrimaryQueryResult": { "RelevantResults": {
            "Table": { "Rows": { "results": rows } }
        } } } } })
    }

    #[must_use]
    pub fn canvas_read_back(content: &str) -> Value {
        json!({ "CanvasContent1": content })
    }
}
