//! Pipeline configuration

use serde::{Deserialize, Serialize};
use sitepage_model::{TypeTag, PAGE_EXTENSION};
use sitepage_odata::DEFAULT_SELECT_PROPERTIES;
use std::collections::BTreeSet;
use std::time::Duration;

/// What the orchestrator does when the pre-probe finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTargetPolicy {
    /// Fail with `TargetNotFound`
    Abort,
    /// Re-resolve using the path's leaf as the hint
    #[default]
    AutoCorrect,
}

/// Resolver and update settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page file extension, with the dot
    pub page_extension: String,
    /// Container templates considered page libraries
    pub container_types: BTreeSet<TypeTag>,
    /// Folder budget for one resolve call
    pub max_folders: usize,
    /// Page size of folder file listings; later pages follow next links
    pub files_page_size: u32,
    /// Page size of subfolder listings
    pub folders_page_size: u32,
    /// Folder names never descended into
    pub skipped_folders: Vec<String>,
    /// Full-text search row limit
    pub search_row_limit: u32,
    /// Full-text search projection
    pub search_select_properties: Vec<String>,
    /// Restrict absolute search URLs to this host
    pub preferred_host: Option<String>,
    /// Query list items by title for title-like hints
    pub title_lookup: bool,
    /// `PageLayoutType` sent with every content write
    pub layout_marker: String,
    /// Check-in comment of the publish action
    pub publish_comment: String,
    /// Probe the target before writing
    pub pre_probe: bool,
    pub missing_target: MissingTargetPolicy,
    /// Read content back after writing
    pub verify: bool,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With folder budget
    #[inline]
    #[must_use]
    pub fn with_max_folders(mut self, max: usize) -> Self {
        self.max_folders = max;
        self
    }

    /// With preferred search host
    #[inline]
    #[must_use]
    pub fn with_preferred_host(mut self, host: impl Into<String>) -> Self {
        self.preferred_host = Some(host.into());
        self
    }

    /// With title-field lookup toggled
    #[inline]
    #[must_use]
    pub fn with_title_lookup(mut self, enabled: bool) -> Self {
        self.title_lookup = enabled;
        self
    }

    /// With pre-probe toggled
    #[inline]
    #[must_use]
    pub fn with_pre_probe(mut self, enabled: bool) -> Self {
        self.pre_probe = enabled;
        self
    }

    /// With missing-target policy
    #[inline]
    #[must_use]
    pub fn with_missing_target(mut self, policy: MissingTargetPolicy) -> Self {
        self.missing_target = policy;
        self
    }

    /// With post-write verification toggled
    #[inline]
    #[must_use]
    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// With publish comment
    #[inline]
    #[must_use]
    pub fn with_publish_comment(mut self, comment: impl Into<String>) -> Self {
        self.publish_comment = comment.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether a folder name is on the skip list (case-insensitive)
    #[must_use]
    pub fn is_skipped_folder(&self, name: &str) -> bool {
        self.skipped_folders
            .iter()
            .any(|skipped| skipped.eq_ignore_ascii_case(name))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_extension: PAGE_EXTENSION.to_string(),
            container_types: TypeTag::page_libraries(),
            max_folders: 5000,
            files_page_size: 1000,
            folders_page_size: 500,
            skipped_folders: vec!["Forms".to_string()],
            search_row_limit: 20,
            search_select_properties: DEFAULT_SELECT_PROPERTIES
                .iter()
                .map(ToString::to_string)
                .collect(),
            preferred_host: None,
            title_lookup: true,
            layout_marker: "Article".to_string(),
            publish_comment: "Smoke update".to_string(),
            pre_probe: true,
            missing_target: MissingTargetPolicy::AutoCorrect,
            verify: false,
            request_timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_folders, 5000);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.preferred_host.is_none());
        assert_eq!(config.missing_target, MissingTargetPolicy::AutoCorrect);
        assert!(config.container_types.contains(&TypeTag::PUBLISHING_PAGES));
    }

    #[test]
    fn skipped_folder_is_case_insensitive() {
        let config = PipelineConfig::default();
        assert!(config.is_skipped_folder("forms"));
        assert!(!config.is_skipped_folder("Archive"));
    }

    #[test]
    fn partial_deserialize_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"max_folders": 10, "missing_target": "abort"}"#).unwrap();
        assert_eq!(config.max_folders, 10);
        assert_eq!(config.missing_target, MissingTargetPolicy::Abort);
        assert_eq!(config.layout_marker, "Article");
    }

    #[test]
    fn builders() {
        let config = PipelineConfig::new()
            .with_max_folders(3)
            .with_verify(true)
            .with_preferred_host("c.example");
        assert_eq!(config.max_folders, 3);
        assert!(config.verify);
        assert_eq!(config.preferred_host.as_deref(), Some("c.example"));
    }
}
