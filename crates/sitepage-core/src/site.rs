//! Site locator
//!
//! Splits a page URL or server-relative path into the site it belongs to and
//! the page's canonical path. The split point is the first `SitePages` or
//! `Pages` segment.

use crate::error::{PipelineError, Result};
use sitepage_model::{normalize, ResourcePath};
use url::Url;

const LIBRARY_SEGMENTS: [&str; 2] = ["SitePages", "Pages"];

/// A site base address and a page path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAddress {
    /// `scheme://host/<site-root>`
    pub base: Url,
    pub path: ResourcePath,
}

/// Split `input` into site base and page path
///
/// Absolute `http(s)` URLs carry their own host; server-relative paths take
/// scheme and host from `default_site`.
///
/// # Errors
/// `InvalidAddress` for unsupported URLs or paths without a library segment
pub fn locate(input: &str, default_site: &Url) -> Result<SiteAddress> {
    let trimmed = input.trim();
    let (origin, path) = match Url::parse(trimmed) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(PipelineError::invalid_address(input, "not an http(s) URL"));
            }
            let path = normalize(url.path());
            (url, path)
        }
        Err(_) => (default_site.clone(), normalize(trimmed)),
    };

    let segments: Vec<&str> = path.segments().collect();
    let library = segments
        .iter()
        .position(|segment| LIBRARY_SEGMENTS.iter().any(|lib| segment.eq_ignore_ascii_case(lib)))
        .ok_or_else(|| {
            PipelineError::invalid_address(input, "no SitePages or Pages segment in path")
        })?;

    let mut base = origin;
    base.set_path(&format!("/{}", segments[..library].join("/")));
    base.set_query(None);
    base.set_fragment(None);

    Ok(SiteAddress { base, path })
}
