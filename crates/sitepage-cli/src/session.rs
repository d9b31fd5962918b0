//! Session credentials from an existing browser or app sign-in
//!
//! Cookie exports are accepted as an array of `{name, value, ...}` records
//! (either key casing), the same array wrapped in `{"cookies": [...]}`, or a
//! flat `{name: value}` map.

use crate::config::CredentialSource;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sitepage_core::SessionCredentials;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CookieRecord {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieExport {
    Records(Vec<CookieRecord>),
    StorageState { cookies: Vec<CookieRecord> },
    Map(BTreeMap<String, String>),
}

/// Name/value pairs of a cookie export, in file order
pub(crate) fn parse_cookies(json: &str) -> Result<Vec<(String, String)>> {
    let export: CookieExport =
        serde_json::from_str(json).context("unrecognised cookie export format")?;
    let pairs: Vec<(String, String)> = match export {
        CookieExport::Records(records) | CookieExport::StorageState { cookies: records } => {
            records.into_iter().map(|c| (c.name, c.value)).collect()
        }
        CookieExport::Map(map) => map.into_iter().collect(),
    };
    if pairs.is_empty() {
        bail!("cookie export contains no cookies");
    }
    Ok(pairs)
}

pub(crate) fn load_cookies(path: &Path) -> Result<SessionCredentials> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading cookies {}", path.display()))?;
    let pairs = parse_cookies(&text).with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!("Loaded {} cookies from {}", pairs.len(), path.display());
    Ok(SessionCredentials::Cookies(pairs))
}

/// Cookies when a cookie file is configured, otherwise a bearer token
pub(crate) fn credentials(source: &CredentialSource) -> Result<SessionCredentials> {
    if let Some(path) = &source.cookies_file {
        return load_cookies(path);
    }
    match std::env::var(&source.token_env) {
        Ok(token) if !token.trim().is_empty() => {
            Ok(SessionCredentials::Bearer(token.trim().to_string()))
        }
        _ => bail!(
            "no credentials: pass --cookies or set {} to a bearer token",
            source.token_env
        ),
    }
}
