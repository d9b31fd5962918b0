//! Container enumeration
//!
//! Lists the site's page libraries. Server order is preserved.

use crate::client::SiteClient;
use crate::error::Result;
use sitepage_model::{ContainerDescriptor, TypeTag};
use sitepage_odata::{decode_records, ListRecord};
use std::collections::BTreeSet;

const LISTS_SELECT: &str = "Id,Title,BaseTemplate,RootFolder/ServerRelativeUrl";

/// `(BaseTemplate eq 119) or (BaseTemplate eq 850)`, URL-encoded
#[must_use]
pub fn template_filter(type_filter: &BTreeSet<TypeTag>) -> String {
    type_filter
        .iter()
        .map(|tag| format!("(BaseTemplate%20eq%20{tag})"))
        .collect::<Vec<_>>()
        .join("%20or%20")
}

/// Page libraries whose template is in `type_filter`
///
/// # Errors
/// Any non-success status (404 included) as `TransportError`; `ShapeError`
/// for an unrecognized envelope
pub async fn list_containers(
    client: &SiteClient,
    type_filter: &BTreeSet<TypeTag>,
) -> Result<Vec<ContainerDescriptor>> {
    if type_filter.is_empty() {
        return Ok(Vec::new());
    }
    let url = client.api_url(&format!(
        "web/lists?$select={LISTS_SELECT}&$expand=RootFolder&$filter={}",
        template_filter(type_filter)
    ));
    let document = client.get_json_required(url, "lists").await?;
    let records: Vec<ListRecord> = decode_records(&document, "lists")?;

    // the server filter is trusted but re-checked, keeping server order
    let containers: Vec<ContainerDescriptor> = records
        .into_iter()
        .filter(|record| type_filter.contains(&record.base_template))
        .map(ListRecord::into_descriptor)
        .collect();

    tracing::debug!("Found {} page libraries", containers.len());
    Ok(containers)
}
