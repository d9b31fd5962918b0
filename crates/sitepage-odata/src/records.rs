//! Typed records
//!
//! Each record type mirrors the `$select` of the query that produces it.
//! Unknown fields (`__metadata`, `odata.*`) are ignored.

use crate::envelope::extract_array;
use crate::error::ShapeError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sitepage_model::{ContainerDescriptor, ResourcePath, TypeTag};

/// File in a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileRecord {
    pub name: String,
    pub server_relative_url: ResourcePath,
    #[serde(default)]
    pub time_last_modified: Option<String>,
}

/// Subfolder in a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderRecord {
    pub name: String,
    pub server_relative_url: ResourcePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootFolderRecord {
    pub server_relative_url: ResourcePath,
}

/// Page library from the lists query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub base_template: TypeTag,
    pub root_folder: RootFolderRecord,
}

impl ListRecord {
    /// Convert into a container descriptor
    #[must_use]
    pub fn into_descriptor(self) -> ContainerDescriptor {
        ContainerDescriptor::new(
            self.id,
            self.title,
            self.base_template,
            self.root_folder.server_relative_url,
        )
    }
}

/// Item from a title-field query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItemRecord {
    #[serde(rename = "FileRef")]
    pub file_ref: ResourcePath,
    #[serde(rename = "FileLeafRef", default)]
    pub file_leaf_ref: Option<String>,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
}

impl ListItemRecord {
    /// Leaf name, falling back to the last segment of `FileRef`
    #[must_use]
    pub fn leaf_name(&self) -> String {
        self.file_leaf_ref
            .clone()
            .or_else(|| self.file_ref.leaf().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Decode every record of a list envelope
///
/// # Errors
/// `UnrecognizedEnvelope` for an unknown shape, `MalformedRecord` for the
/// first record that does not decode
pub fn decode_records<T: DeserializeOwned>(
    document: &Value,
    context: &str,
) -> Result<Vec<T>, ShapeError> {
    extract_array(document, context)?
        .iter()
        .enumerate()
        .map(|(index, record)| {
            T::deserialize(record).map_err(|e| ShapeError::MalformedRecord {
                context: context.to_string(),
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
