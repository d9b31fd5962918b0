//! Content containers (page libraries)

use crate::path::ResourcePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Numeric template code of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(pub u32);

impl TypeTag {
    /// Site pages library
    pub const SITE_PAGES: Self = Self(119);
    /// Publishing pages library
    pub const PUBLISHING_PAGES: Self = Self(850);

    /// The two known page-library templates
    #[must_use]
    pub fn page_libraries() -> BTreeSet<Self> {
        BTreeSet::from([Self::SITE_PAGES, Self::PUBLISHING_PAGES])
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate page library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    /// Server identifier (list GUID)
    pub id: String,
    /// Display title
    pub display_name: String,
    /// Template code
    pub type_tag: TypeTag,
    /// Canonical root folder path
    pub root_path: ResourcePath,
}

impl ContainerDescriptor {
    /// Create new descriptor
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        type_tag: TypeTag,
        root_path: ResourcePath,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            type_tag,
            root_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::normalize;

    #[test]
    fn page_libraries_contains_both_templates() {
        let tags = TypeTag::page_libraries();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&TypeTag(119)));
        assert!(tags.contains(&TypeTag(850)));
    }

    #[test]
    fn descriptor_roundtrips_through_json() {
        let desc = ContainerDescriptor::new(
            "guid-1",
            "Site Pages",
            TypeTag::SITE_PAGES,
            normalize("/sites/X/SitePages"),
        );
        let json = serde_json::to_string(&desc).unwrap();
        let back: ContainerDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
