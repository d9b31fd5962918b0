//! Sitepage Model
//!
//! Plain data shared by the resolver and the update pipeline. No IO.
//!
//! # Core Concepts
//!
//! - [`ResourcePath`]: canonical page path, produced only by [`normalize`]
//! - [`SearchHint`]: a page name or title, classified once
//! - [`ContainerDescriptor`]: one page library
//! - [`ContentDocument`]: opaque payload written verbatim
//! - [`UpdateOutcome`]: what a successful update did
//!
//! # Example
//!
//! ```rust
//! use sitepage_model::{normalize, SearchHint};
//!
//! let path = normalize("sites%2FTeamX//SitePages/Home.aspx;");
//! assert_eq!(path.as_str(), "/sites/TeamX/SitePages/Home.aspx");
//!
//! let hint = SearchHint::new("First Test Page").unwrap();
//! assert_eq!(hint.leaf(), "First-Test-Page.aspx");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod container;
mod content;
mod hint;
mod outcome;
mod path;

pub use container::{ContainerDescriptor, TypeTag};
pub use content::{ContentDocument, TEXT_WEB_PART_ID};
pub use hint::{
    canonicalize, file_stem, HintError, HintKind, MatchCandidate, MatchKind, SearchHint,
    PAGE_EXTENSION,
};
pub use outcome::{AddressingScheme, StageError, UpdateOutcome, UpdateStage};
pub use path::{normalize, ResourcePath};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
