//! Addressing schemes, update stages and the update outcome

use crate::path::ResourcePath;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// URL-construction convention identifying a file by path
///
/// Both conventions address the same logical resource; they differ in how the
/// path is encoded and matched server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingScheme {
    /// Percent-encoded, decoded-url form
    Primary,
    /// Quoted server-relative-url form
    Fallback,
}

impl AddressingScheme {
    /// Declared try order
    pub const ORDER: [Self; 2] = [Self::Primary, Self::Fallback];

    /// Try order starting from `first`, remaining schemes in declared order
    #[must_use]
    pub fn order_from(first: Self) -> Vec<Self> {
        std::iter::once(first)
            .chain(Self::ORDER.into_iter().filter(move |s| *s != first))
            .collect()
    }
}

impl Display for AddressingScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// States of the conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateStage {
    /// Nothing sent yet
    Idle,
    /// Form digest fetched for this update
    TokenAcquired,
    /// Content write sent under the primary scheme
    PrimaryAttempted,
    /// Primary answered not-found; write sent under the fallback scheme
    FallbackAttempted,
    /// Content replaced, publish not requested
    Written,
    /// Content replaced and published
    Published,
    /// Read-back content matched what was written
    Verified,
    /// Update aborted
    Failed,
}

impl UpdateStage {
    /// Stages reachable from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [Self] {
        use UpdateStage::*;
        match self {
            Idle => &[TokenAcquired, Failed],
            TokenAcquired => &[PrimaryAttempted, Failed],
            PrimaryAttempted => &[Written, Published, FallbackAttempted, Failed],
            FallbackAttempted => &[Written, Published, Failed],
            Written | Published => &[Verified, Failed],
            Verified | Failed => &[],
        }
    }

    /// Check a single transition
    ///
    /// # Errors
    /// `StageError::IllegalTransition` if `to` is not reachable from `self`
    pub fn validate_transition(self, to: Self) -> Result<(), StageError> {
        if self.allowed_transitions().contains(&to) {
            Ok(())
        } else {
            Err(StageError::IllegalTransition { from: self, to })
        }
    }

    /// Terminal success state
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Written | Self::Published | Self::Verified)
    }
}

/// Stage machine violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("illegal update stage transition: {from:?} -> {to:?}")]
    IllegalTransition { from: UpdateStage, to: UpdateStage },

    /// Outcome requested before reaching a success stage
    #[error("update ended in non-success stage {0:?}")]
    Unfinished(UpdateStage),
}

/// Result of a successful update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Path the write landed on
    pub resolved_path: ResourcePath,
    /// Scheme that accepted the content write
    pub scheme: AddressingScheme,
    /// Whether a publish action succeeded
    pub published: bool,
    /// Scheme that accepted the publish; may differ from `scheme`
    #[serde(default)]
    pub published_scheme: Option<AddressingScheme>,
    /// Whether the written content was read back
    pub verified: bool,
    /// Original path when pre-probe auto-correction replaced it
    pub corrected_from: Option<ResourcePath>,
    /// Stage trail, `Idle` first
    pub stages: Vec<UpdateStage>,
}
