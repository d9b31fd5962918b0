//! Application configuration
//!
//! Loaded from a TOML file; command-line flags override file values.
//!
//! ```toml
//! site_url = "https://contoso.sharepoint.com/sites/TeamX"
//!
//! [credentials]
//! cookies_file = "cookies.json"
//!
//! [pipeline]
//! verify = true
//! missing_target = "abort"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sitepage_core::PipelineConfig;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable read for a bearer token when none is configured
pub(crate) const DEFAULT_TOKEN_ENV: &str = "SITEPAGE_TOKEN";

/// Where the session credentials come from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct CredentialSource {
    /// Cookie export of an authenticated browser session
    pub(crate) cookies_file: Option<PathBuf>,
    /// Environment variable holding a bearer token
    pub(crate) token_env: String,
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self {
            cookies_file: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) site_url: Option<String>,
    pub(crate) credentials: CredentialSource,
    pub(crate) pipeline: PipelineConfig,
}

impl AppConfig {
    /// Parse TOML text
    pub(crate) fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read `path`, or fall back to defaults when no path is given
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("loading config {}", path.display()))
    }

    #[must_use]
    pub(crate) fn with_site_url(mut self, site_url: Option<String>) -> Self {
        if site_url.is_some() {
            self.site_url = site_url;
        }
        self
    }

    #[must_use]
    pub(crate) fn with_cookies_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.credentials.cookies_file = path;
        }
        self
    }

    #[must_use]
    pub(crate) fn with_token_env(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.credentials.token_env = name;
        }
        self
    }

    /// Configured site as a URL
    pub(crate) fn site(&self) -> Result<Url> {
        let Some(raw) = self.site_url.as_deref() else {
            bail!("no site configured; set site_url or pass --site");
        };
        let site = Url::parse(raw.trim_end_matches('/'))
            .with_context(|| format!("invalid site URL {raw}"))?;
        if !matches!(site.scheme(), "http" | "https") {
            bail!("site URL must be http(s): {raw}");
        }
        Ok(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitepage_core::MissingTargetPolicy;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.site_url, None);
        assert_eq!(config.credentials, CredentialSource::default());
        assert_eq!(config.pipeline.max_folders, 5000);
    }

    #[test]
    fn pipeline_section_overrides_defaults() {
        let config = AppConfig::from_toml(
            r#"
            site_url = "https://contoso.example/sites/X"

            [credentials]
            cookies_file = "cookies.json"

            [pipeline]
            verify = true
            max_folders = 10
            missing_target = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(config.credentials.cookies_file, Some(PathBuf::from("cookies.json")));
        assert_eq!(config.credentials.token_env, DEFAULT_TOKEN_ENV);
        assert!(config.pipeline.verify);
        assert_eq!(config.pipeline.max_folders, 10);
        assert_eq!(config.pipeline.missing_target, MissingTargetPolicy::Abort);
        assert_eq!(config.pipeline.page_extension, ".aspx");
    }

    #[test]
    fn flags_override_file_values() {
        let config = AppConfig::from_toml(r#"site_url = "https://a.example/sites/A""#)
            .unwrap()
            .with_site_url(Some("https://b.example/sites/B/".into()))
            .with_cookies_file(None)
            .with_token_env(Some("MY_TOKEN".into()));
        assert_eq!(config.site().unwrap().as_str(), "https://b.example/sites/B");
        assert_eq!(config.credentials.cookies_file, None);
        assert_eq!(config.credentials.token_env, "MY_TOKEN");
    }

    #[test]
    fn missing_site_is_an_error() {
        assert!(AppConfig::default().site().is_err());
        let config = AppConfig::default().with_site_url(Some("ftp://x.example/s".into()));
        assert!(config.site().is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "site_url = \"https://contoso.example/sites/X\"").unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.site_url.as_deref(), Some("https://contoso.example/sites/X"));
    }

    #[test]
    fn load_without_path_is_default() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.site_url.is_none());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = AppConfig::from_toml("[pipeline]\nmissing_target = \"retry\"").unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
