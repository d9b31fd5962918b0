//! Existence probe

use crate::addressing::{file_request, FileOperation};
use crate::client::SiteClient;
use crate::error::Result;
use sitepage_model::{AddressingScheme, ResourcePath};

/// First scheme under which `path` exists, or `None`
///
/// # Errors
/// Any status other than success or 404 as `TransportError`
pub async fn probe(client: &SiteClient, path: &ResourcePath) -> Result<Option<AddressingScheme>> {
    for scheme in AddressingScheme::ORDER {
        let request = file_request(client.base(), scheme, path, FileOperation::Probe);
        let context = format!("probe:{scheme}");
        if client.send_optional(request, &context).await?.is_some() {
            tracing::debug!("{} exists ({})", path, scheme);
            return Ok(Some(scheme));
        }
        tracing::debug!("{} not found via {}", path, scheme);
    }
    Ok(None)
}
