//! Addressing schemes as pure request builders
//!
//! Each [`AddressingScheme`] maps `(site base, path, operation)` to a request.
//! Write-path fallback is then just iteration over [`AddressingScheme::ORDER`].

use crate::client::odata_literal;
use crate::transport::ApiRequest;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sitepage_model::{AddressingScheme, ResourcePath};

/// Everything but unreserved characters and `/`
const DECODED_URL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a path for a `decodedurl='...'` parameter
#[must_use]
pub fn encode_decoded_url(path: &ResourcePath) -> String {
    utf8_percent_encode(path.as_str(), DECODED_URL).to_string()
}

/// Operations on a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation<'a> {
    /// Cheap existence check
    Probe,
    /// MERGE list-item fields
    Merge,
    /// Publish a major version
    Publish { comment: &'a str },
    /// Read the stored canvas back
    ReadContent,
}

/// File resource segment under `_api/web/`
#[must_use]
pub fn file_resource(scheme: AddressingScheme, path: &ResourcePath) -> String {
    match scheme {
        AddressingScheme::Primary => format!(
            "web/GetFileByServerRelativePath(decodedurl='{}')",
            encode_decoded_url(path)
        ),
        AddressingScheme::Fallback => format!(
            "web/GetFileByServerRelativeUrl('{}')",
            odata_literal(path.as_str())
        ),
    }
}

/// Build the request for `operation` on `path` under `scheme`
///
/// Digest headers and bodies are attached by the caller.
#[must_use]
pub fn file_request(
    base: &str,
    scheme: AddressingScheme,
    path: &ResourcePath,
    operation: FileOperation<'_>,
) -> ApiRequest {
    let resource = format!("{}/_api/{}", base, file_resource(scheme, path));
    match operation {
        FileOperation::Probe => ApiRequest::get(format!("{resource}?$select=UniqueId")),
        FileOperation::Merge => ApiRequest::post(format!("{resource}/ListItemAllFields"))
            .with_header("IF-MATCH", "*")
            .with_header("X-HTTP-Method", "MERGE"),
        FileOperation::Publish { comment } => ApiRequest::post(format!(
            "{resource}/Publish(StringParameter='{}')",
            odata_literal(comment)
        )),
        FileOperation::ReadContent => {
            ApiRequest::get(format!("{resource}/ListItemAllFields?$select=CanvasContent1"))
        }
    }
}
