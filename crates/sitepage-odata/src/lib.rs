//! Sitepage OData
//!
//! Turns raw REST response bodies into typed records.
//!
//! - [`Envelope`]: the two list envelopes, as a closed set
//! - [`decode_records`]: typed records out of either envelope
//! - [`next_link`]: continuation of a paged list
//! - [`extract_rows`] / [`PathSelector`]: full-text search results
//!
//! Every failure is a [`ShapeError`] tagged with the caller's context string.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod envelope;
mod error;
mod records;
mod search;

pub use envelope::{
    extract_array, extract_object, find_field, nested_list, next_link, parse_body, Envelope,
};
pub use error::ShapeError;
pub use records::{
    decode_records, FileRecord, FolderRecord, ListItemRecord, ListRecord, RootFolderRecord,
};
pub use search::{
    extract_rows, PathSelector, SearchRow, ABSOLUTE_FIELDS, DEFAULT_SELECT_PROPERTIES,
    RELATIVE_FIELD,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
