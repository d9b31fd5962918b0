//! Error types for response decoding

/// A response body did not match any recognized shape
///
/// Always carries the call-site context so the failing request is
/// identifiable from the message alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// Neither the modern nor the verbose envelope was present
    #[error("{context}: unrecognized response envelope")]
    UnrecognizedEnvelope { context: String },

    /// Envelope was fine but a record lacked a required field
    #[error("{context}: record {index} is malformed: {message}")]
    MalformedRecord {
        context: String,
        index: usize,
        message: String,
    },

    /// Body was not JSON at all
    #[error("{context}: response body is not JSON: {message}")]
    InvalidJson { context: String, message: String },
}

impl ShapeError {
    /// Create unrecognized-envelope error
    pub fn unrecognized(context: impl Into<String>) -> Self {
        Self::UnrecognizedEnvelope {
            context: context.into(),
        }
    }

    /// Call-site context of the failure
    #[must_use]
    pub fn context(&self) -> &str {
        match self {
            Self::UnrecognizedEnvelope { context }
            | Self::MalformedRecord { context, .. }
            | Self::InvalidJson { context, .. } => context,
        }
    }
}
