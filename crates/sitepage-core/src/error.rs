//! Error types for the resolver and update pipeline
//!
//! Provides error handling for:
//! - Response shape failures
//! - Transport and status failures
//! - Resolution exhaustion
//! - Token acquisition
//! - Write and publish targets that do not exist

use crate::transport::TransportError;
use sitepage_model::{HintError, ResourcePath, StageError};
use sitepage_odata::ShapeError;
use std::fmt::{self, Display, Formatter};

/// Step of the conditional write that ran out of addressing schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Write,
    Publish,
}

impl Display for WriteStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Response body in an unrecognized shape
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Request failed or returned an unhandled status
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every resolution strategy was exhausted
    #[error("no page matches '{hint}'")]
    NotFound { hint: String },

    /// Write token could not be obtained
    #[error("auth error: {0}")]
    Auth(String),

    /// Pre-probe found nothing at the path (and auto-correction did not help)
    #[error("target not found: {path}")]
    TargetNotFound { path: ResourcePath },

    /// Every addressing scheme answered not-found
    #[error("{stage} target missing under every addressing scheme: {path}")]
    WriteTargetMissing { path: ResourcePath, stage: WriteStep },

    /// Read-back content differs from what was written
    #[error("verification failed for {path}: {reason}")]
    VerificationFailed { path: ResourcePath, reason: String },

    /// Input cannot be split into a site and a page path
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    /// Update stage machine violation
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Unusable search hint
    #[error(transparent)]
    Hint(#[from] HintError),
}

impl PipelineError {
    /// Per-attempt not-found condition, the only recoverable class
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::TargetNotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(404),
            _ => false,
        }
    }

    /// Create invalid-address error
    pub fn invalid_address(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for pipeline operations
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
