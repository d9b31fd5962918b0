//! Canonical resource paths
//!
//! Provides [`ResourcePath`] for addressing pages inside the remote store, and
//! [`normalize`], the only way to produce one.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display, Formatter};

/// Canonical, slash-delimited identifier rooted at `/`
///
/// Invariants (upheld by [`normalize`]):
/// - begins with exactly one `/`
/// - no empty segments
/// - no trailing `;` or whitespace
/// - fully percent-decoded
///
/// # Examples
/// - `sites%2FTeamX//SitePages/Home.aspx;` → `/sites/TeamX/SitePages/Home.aspx`
/// - `""` → `/`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// The root path `/`
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Borrow the canonical string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the root path
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Check if path has no segments (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Last segment (if not root)
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Parent path (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let idx = self.0.rfind('/')?;
        Some(normalize(&self.0[..idx]))
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        normalize(&format!("{}/{}", self.0, segment))
    }

    /// Check if `self` lies under `prefix`, comparing segments case-insensitively
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        let mut own = self.segments();
        prefix
            .segments()
            .all(|p| own.next().is_some_and(|s| s.eq_ignore_ascii_case(p)))
    }

    /// Check if the leaf ends with `extension` (case-insensitive, leading dot included)
    #[must_use]
    pub fn has_extension(&self, extension: &str) -> bool {
        self.leaf().is_some_and(|leaf| ends_with_ignore_case(leaf, extension))
    }

    /// Case-insensitive equality of the canonical forms
    #[inline]
    #[must_use]
    pub fn eq_ignore_case(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourcePath {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

impl From<String> for ResourcePath {
    fn from(raw: String) -> Self {
        normalize(&raw)
    }
}

impl Default for ResourcePath {
    fn default() -> Self {
        Self::root()
    }
}

impl<'de> Deserialize<'de> for ResourcePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| normalize(&raw))
    }
}

/// Canonicalize a raw path string
///
/// Percent-decodes, trims, strips trailing `;`/whitespace, collapses duplicate
/// slashes and guarantees a single leading `/`. Never fails.
///
/// The single pass is repeated until it reaches a fixed point, so
/// `normalize(normalize(x)) == normalize(x)` holds even for double-encoded
/// input.
#[must_use]
pub fn normalize(raw: &str) -> ResourcePath {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return ResourcePath(current);
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let trimmed = decoded
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    let mut out = String::with_capacity(trimmed.len() + 1);
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

pub(crate) fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value.is_char_boundary(value.len() - suffix.len())
        && value[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
