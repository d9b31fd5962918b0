//! Search hints and match classification
//!
//! A [`SearchHint`] is classified once, at construction, as file-like or
//! title-like. Everything the resolver compares against (leaf, stem, canonical
//! stem) is derived here and never recomputed.

use crate::path::{ends_with_ignore_case, ResourcePath};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Extension carried by page files
pub const PAGE_EXTENSION: &str = ".aspx";

/// How a hint was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintKind {
    /// Ends with the page extension, e.g. `First-Test-Page.aspx`
    FileLike,
    /// Anything else, e.g. `First Test Page`
    TitleLike,
}

/// Caller-provided reference to a page whose exact path is unknown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHint {
    raw: String,
    kind: HintKind,
    extension: String,
    leaf: String,
    stem: String,
    canonical_stem: String,
    // Case-folded forms used by every name comparison
    folded_leaf: String,
    folded_stem: String,
    folded_stem_spaced: String,
}

impl SearchHint {
    /// Classify a hint using the default page extension
    ///
    /// # Errors
    /// See [`SearchHint::with_extension`].
    pub fn new(raw: impl Into<String>) -> Result<Self, HintError> {
        Self::with_extension(raw, PAGE_EXTENSION)
    }

    /// Classify a hint against an explicit page extension (leading dot included)
    ///
    /// # Errors
    /// - `HintError::Empty` for blank input
    /// - `HintError::EmptyStem` when nothing is left once the extension is removed
    pub fn with_extension(
        raw: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self, HintError> {
        let raw = raw.into().trim().to_string();
        let extension = extension.into();
        if raw.is_empty() {
            return Err(HintError::Empty);
        }

        let (kind, leaf) = if ends_with_ignore_case(&raw, &extension) {
            (HintKind::FileLike, raw.clone())
        } else {
            (
                HintKind::TitleLike,
                format!("{}{}", raw.replace(' ', "-"), extension),
            )
        };

        let stem = leaf[..leaf.len() - extension.len()].to_string();
        if stem.trim().is_empty() {
            return Err(HintError::EmptyStem(raw));
        }
        let canonical_stem = canonicalize(&stem);
        let folded_stem = fold(&stem);
        let folded_stem_spaced = folded_stem.replace('-', " ").trim().to_string();

        Ok(Self {
            folded_leaf: fold(&leaf),
            raw,
            kind,
            extension,
            leaf,
            stem,
            canonical_stem,
            folded_stem,
            folded_stem_spaced,
        })
    }

    /// Hint as given (trimmed)
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Classification
    #[inline]
    #[must_use]
    pub fn kind(&self) -> HintKind {
        self.kind
    }

    /// Whether the hint names a file
    #[inline]
    #[must_use]
    pub fn is_file_like(&self) -> bool {
        self.kind == HintKind::FileLike
    }

    /// Expected leaf file name, e.g. `First-Test-Page.aspx`
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        &self.leaf
    }

    /// Leaf without extension
    #[inline]
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Lowercased alphanumeric-only stem
    #[inline]
    #[must_use]
    pub fn canonical_stem(&self) -> &str {
        &self.canonical_stem
    }

    /// Page extension the hint was classified against
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full-text query for this hint: `filename:<leaf>` or the bare stem
    #[must_use]
    pub fn search_query(&self) -> String {
        match self.kind {
            HintKind::FileLike => format!("filename:{}", self.leaf),
            HintKind::TitleLike => self.stem.clone(),
        }
    }

    /// Case-insensitive equality with the expected leaf
    ///
    /// Folds case the same way as [`SearchHint::fuzzy_kind`], so a name that
    /// differs only in case is always exact.
    #[inline]
    #[must_use]
    pub fn is_exact(&self, name: &str) -> bool {
        fold(name) == self.folded_leaf
    }

    /// Fuzzy classification of a candidate file name
    ///
    /// Returns `ContainsStem` when the candidate's stem contains the target stem
    /// (or the target stem with hyphens read as spaces), `CanonicalContains`
    /// when only the punctuation-insensitive forms agree, `None` otherwise.
    #[must_use]
    pub fn fuzzy_kind(&self, name: &str) -> Option<MatchKind> {
        let candidate = fold(file_stem(name));
        if candidate.contains(&self.folded_stem)
            || (!self.folded_stem_spaced.is_empty() && candidate.contains(&self.folded_stem_spaced))
        {
            return Some(MatchKind::ContainsStem);
        }
        if !self.canonical_stem.is_empty() && canonicalize(&candidate).contains(&self.canonical_stem)
        {
            return Some(MatchKind::CanonicalContains);
        }
        None
    }
}

impl Display for SearchHint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Errors building a [`SearchHint`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HintError {
    /// Blank hint
    #[error("search hint is empty")]
    Empty,

    /// Hint is only an extension
    #[error("search hint '{0}' has no name before its extension")]
    EmptyStem(String),
}

/// Which rule produced a match, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Leaf name equality
    Exact,
    /// Candidate stem contains the target stem
    ContainsStem,
    /// Canonical stems contain each other
    CanonicalContains,
    /// Title field equals a title-like hint
    TitleField,
    /// Found through the full-text index
    FullTextHit,
}

impl Display for MatchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::ContainsStem => "contains-stem",
            Self::CanonicalContains => "canonical-contains",
            Self::TitleField => "title-field",
            Self::FullTextHit => "full-text",
        };
        f.write_str(s)
    }
}

/// A resolved candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    /// Leaf name as listed by the server
    pub name: String,
    /// Canonical path
    pub path: ResourcePath,
    /// Rule that matched
    pub kind: MatchKind,
}

impl MatchCandidate {
    /// Create new candidate
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, path: ResourcePath, kind: MatchKind) -> Self {
        Self {
            name: name.into(),
            path,
            kind,
        }
    }
}

/// Lowercase and keep only alphanumeric characters
#[must_use]
pub fn canonicalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case folding shared by exact and fuzzy name comparison
fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// File name without its last extension
#[must_use]
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_like_derives_leaf() {
        let hint = SearchHint::new("First Test Page").unwrap();
        assert_eq!(hint.kind(), HintKind::TitleLike);
        assert_eq!(hint.leaf(), "First-Test-Page.aspx");
        assert_eq!(hint.stem(), "First-Test-Page");
        assert_eq!(hint.canonical_stem(), "firsttestpage");
    }

    #[test]
    fn hyphenated_title_stays_title_like() {
        let hint = SearchHint::new("First-Test-Page").unwrap();
        assert_eq!(hint.kind(), HintKind::TitleLike);
        assert_eq!(hint.leaf(), "First-Test-Page.aspx");
    }

    #[test]
    fn file_like_keeps_leaf() {
        let hint = SearchHint::new("  Home.ASPX ").unwrap();
        assert!(hint.is_file_like());
        assert_eq!(hint.leaf(), "Home.ASPX");
        assert_eq!(hint.stem(), "Home");
    }

    #[test]
    fn rejects_blank_and_bare_extension() {
        assert_eq!(SearchHint::new("  "), Err(HintError::Empty));
        assert!(matches!(
            SearchHint::new(".aspx"),
            Err(HintError::EmptyStem(_))
        ));
    }

    #[test]
    fn exact_is_case_insensitive() {
        let hint = SearchHint::new("Home.aspx").unwrap();
        assert!(hint.is_exact("home.ASPX"));
        assert!(!hint.is_exact("home-1.aspx"));
    }

    #[test]
    fn fuzzy_contains_stem() {
        let hint = SearchHint::new("First-Test-Page").unwrap();
        assert_eq!(
            hint.fuzzy_kind("First-Test-Page-1.aspx"),
            Some(MatchKind::ContainsStem)
        );
    }

    #[test]
    fn fuzzy_hyphens_as_spaces() {
        let hint = SearchHint::new("First-Test-Page").unwrap();
        assert_eq!(
            hint.fuzzy_kind("Copy of First Test Page.aspx"),
            Some(MatchKind::ContainsStem)
        );
    }

    #[test]
    fn fuzzy_canonical() {
        let hint = SearchHint::new("First-Test-Page").unwrap();
        assert_eq!(
            hint.fuzzy_kind("first_test.page(2).aspx"),
            Some(MatchKind::CanonicalContains)
        );
        assert_eq!(hint.fuzzy_kind("Other.aspx"), None);
    }

    #[test]
    fn search_query_forms() {
        assert_eq!(
            SearchHint::new("Home.aspx").unwrap().search_query(),
            "filename:Home.aspx"
        );
        assert_eq!(SearchHint::new("My Page").unwrap().search_query(), "My-Page");
    }

    #[test]
    fn match_kind_priority_order() {
        assert!(MatchKind::Exact < MatchKind::ContainsStem);
        assert!(MatchKind::CanonicalContains < MatchKind::FullTextHit);
    }

    #[test]
    fn non_ascii_case_difference_is_exact() {
        let hint = SearchHint::new("Über.aspx").unwrap();
        assert!(hint.is_exact("über.aspx"));
        assert!(hint.is_exact("ÜBER.ASPX"));
        assert!(!hint.is_exact("Über-2.aspx"));
        assert_eq!(hint.fuzzy_kind("über-2.aspx"), Some(MatchKind::ContainsStem));
    }

    #[test]
    fn title_like_non_ascii_matches_exactly() {
        let hint = SearchHint::new("Ärger im Büro").unwrap();
        assert_eq!(hint.leaf(), "Ärger-im-Büro.aspx");
        assert!(hint.is_exact("ärger-im-büro.aspx"));
    }

    #[test]
    fn file_stem_strips_last_extension() {
        assert_eq!(file_stem("a.b.aspx"), "a.b");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("plain"), "plain");
    }
}
