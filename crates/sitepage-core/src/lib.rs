//! Sitepage Core
//!
//! Resolves loosely named pages inside a site's page libraries and rewrites
//! their content through a conditional, two-scheme write.
//!
//! # Architecture
//!
//! ```text
//! hint ──► Resolver ──► ResourcePath ──► UpdateOrchestrator ──► UpdateOutcome
//!            │                               │
//!            ├─ containers (page libraries)   ├─ probe
//!            └─ search                        ├─ token (form digest)
//!                                             └─ addressing (Primary, Fallback)
//! ```
//!
//! All remote calls go through the [`Transport`] trait; [`HttpChannel`] is
//! the `reqwest` implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitepage_core::{HttpChannel, Pipeline, PipelineConfig, SessionCredentials};
//! use sitepage_model::ContentDocument;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = HttpChannel::new(
//!     SessionCredentials::Bearer("token".into()),
//!     Duration::from_secs(60),
//! )?;
//! let site = url::Url::parse("https://contoso.example/sites/TeamX")?;
//! let pipeline = Pipeline::new(Arc::new(channel), site, PipelineConfig::default());
//!
//! let content = ContentDocument::text_canvas("<p>Hello</p>");
//! let outcome = pipeline.resolve_and_update("First Test Page", &content, true).await?;
//! println!("{} via {}", outcome.resolved_path, outcome.scheme);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod addressing;
mod client;
mod config;
mod containers;
mod diagnostics;
mod error;
mod http;
mod pipeline;
mod probe;
mod resolver;
mod site;
mod token;
mod transport;
mod update;

pub use addressing::{encode_decoded_url, file_request, file_resource, FileOperation};
pub use client::{odata_escape, odata_literal, SiteClient};
pub use config::{MissingTargetPolicy, PipelineConfig};
pub use containers::{list_containers, template_filter};
pub use diagnostics::{Diagnostics, LibraryPermissions, WebContext};
pub use error::{PipelineError, Result, WriteStep};
pub use http::{HttpChannel, SessionCredentials, NOMETADATA};
pub use pipeline::Pipeline;
pub use probe::probe;
pub use resolver::Resolver;
pub use site::{locate, SiteAddress};
pub use token::{acquire_token, AuthToken};
pub use transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
pub use update::UpdateOrchestrator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Pipeline, PipelineConfig, PipelineError, Resolver, SessionCredentials, Transport,
        UpdateOrchestrator,
    };
    pub use sitepage_model::{
        normalize, AddressingScheme, ContentDocument, MatchKind, ResourcePath, SearchHint,
        UpdateOutcome,
    };
}
