//! Update orchestrator
//!
//! Conditional write of a page's canvas:
//! - Pre-probe the target, optionally re-resolving a stale path
//! - Acquire a fresh form digest
//! - MERGE the content under each addressing scheme until one accepts it
//! - Publish, starting with the scheme that accepted the write
//! - Optionally read the content back
//!
//! Only not-found answers move on to the next scheme. Every other failure
//! ends the update in `Failed`; nothing is retried or rolled back.

use crate::addressing::{file_request, FileOperation};
use crate::client::SiteClient;
use crate::config::{MissingTargetPolicy, PipelineConfig};
use crate::containers::list_containers;
use crate::error::{PipelineError, Result, WriteStep};
use crate::probe::probe;
use crate::resolver::Resolver;
use crate::token::{acquire_token, AuthToken};
use serde_json::json;
use sitepage_model::{
    AddressingScheme, ContentDocument, ResourcePath, StageError, UpdateOutcome, UpdateStage,
};
use sitepage_odata::find_field;
use std::sync::Arc;
use tracing::Instrument;

const CONTENT_FIELD: &str = "CanvasContent1";

/// Stage trail with validated transitions
#[derive(Debug)]
struct StageTracker {
    current: UpdateStage,
    trail: Vec<UpdateStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: UpdateStage::Idle,
            trail: vec![UpdateStage::Idle],
        }
    }

    fn advance(&mut self, to: UpdateStage) -> std::result::Result<(), StageError> {
        self.current.validate_transition(to)?;
        tracing::debug!("Update stage {:?} -> {:?}", self.current, to);
        self.current = to;
        self.trail.push(to);
        Ok(())
    }

    /// Trail of a finished update; the current stage must be a success stage
    fn finish(self) -> std::result::Result<Vec<UpdateStage>, StageError> {
        if self.current.is_success() {
            Ok(self.trail)
        } else {
            Err(StageError::Unfinished(self.current))
        }
    }

    fn fail(&mut self) {
        if self.current.validate_transition(UpdateStage::Failed).is_ok() {
            self.current = UpdateStage::Failed;
            self.trail.push(UpdateStage::Failed);
        }
        tracing::warn!("Update failed; stages: {:?}", self.trail);
    }
}

fn attempt_stage(scheme: AddressingScheme) -> UpdateStage {
    match scheme {
        AddressingScheme::Primary => UpdateStage::PrimaryAttempted,
        AddressingScheme::Fallback => UpdateStage::FallbackAttempted,
    }
}

/// What the transactional part of an update achieved
struct Committed {
    scheme: AddressingScheme,
    published: Option<AddressingScheme>,
    verified: bool,
}

/// Two-phase conditional writer
#[derive(Debug, Clone)]
pub struct UpdateOrchestrator {
    client: SiteClient,
    config: Arc<PipelineConfig>,
    resolver: Resolver,
}

impl UpdateOrchestrator {
    #[must_use]
    pub fn new(client: SiteClient, config: Arc<PipelineConfig>) -> Self {
        let resolver = Resolver::new(client.clone(), Arc::clone(&config));
        Self {
            client,
            config,
            resolver,
        }
    }

    /// Replace the page content at `path`, then publish if asked
    ///
    /// # Errors
    /// - `TargetNotFound` when the pre-probe (and auto-correction) finds nothing
    /// - `WriteTargetMissing` when every scheme answers not-found
    /// - `VerificationFailed` when read-back content differs
    /// - transport, shape and auth errors unchanged
    pub async fn update(
        &self,
        path: &ResourcePath,
        content: &ContentDocument,
        publish: bool,
    ) -> Result<UpdateOutcome> {
        let span = tracing::info_span!("update", path = %path, publish);
        self.run(path, content, publish).instrument(span).await
    }

    async fn run(
        &self,
        path: &ResourcePath,
        content: &ContentDocument,
        publish: bool,
    ) -> Result<UpdateOutcome> {
        let (target, corrected_from) = if self.config.pre_probe {
            self.ensure_target(path).await?
        } else {
            (path.clone(), None)
        };

        let mut stages = StageTracker::new();
        let committed = match self.commit(&target, content, publish, &mut stages).await {
            Ok(committed) => committed,
            Err(e) => {
                stages.fail();
                return Err(e);
            }
        };

        let outcome = UpdateOutcome {
            resolved_path: target,
            scheme: committed.scheme,
            published: committed.published.is_some(),
            published_scheme: committed.published,
            verified: committed.verified,
            corrected_from,
            stages: stages.finish()?,
        };
        tracing::info!(
            "Updated {} via {} scheme (published: {}, verified: {})",
            outcome.resolved_path,
            outcome.scheme,
            outcome.published,
            outcome.verified
        );
        Ok(outcome)
    }

    async fn commit(
        &self,
        target: &ResourcePath,
        content: &ContentDocument,
        publish: bool,
        stages: &mut StageTracker,
    ) -> Result<Committed> {
        let token = acquire_token(&self.client).await?;
        stages.advance(UpdateStage::TokenAcquired)?;

        let scheme = self.write(target, content, &token, stages).await?;

        let published = if publish {
            let published = self.publish(target, scheme, &token).await?;
            stages.advance(UpdateStage::Published)?;
            Some(published)
        } else {
            stages.advance(UpdateStage::Written)?;
            None
        };

        let verified = if self.config.verify {
            self.verify(target, scheme, content).await?;
            stages.advance(UpdateStage::Verified)?;
            true
        } else {
            false
        };

        Ok(Committed {
            scheme,
            published,
            verified,
        })
    }

    /// MERGE content under each scheme in declared order
    async fn write(
        &self,
        target: &ResourcePath,
        content: &ContentDocument,
        token: &AuthToken,
        stages: &mut StageTracker,
    ) -> Result<AddressingScheme> {
        let body = json!({
            "CanvasContent1": content.as_str(),
            "PageLayoutType": self.config.layout_marker,
        });

        for scheme in AddressingScheme::ORDER {
            stages.advance(attempt_stage(scheme))?;
            let request = file_request(self.client.base(), scheme, target, FileOperation::Merge)
                .with_header("X-RequestDigest", token.expose())
                .with_json(&body);
            let context = format!("write:{scheme}");
            if self.client.send_optional(request, &context).await?.is_some() {
                tracing::info!("Content written via {} scheme", scheme);
                return Ok(scheme);
            }
            tracing::warn!("Write target not found via {} scheme", scheme);
        }

        Err(PipelineError::WriteTargetMissing {
            path: target.clone(),
            stage: WriteStep::Write,
        })
    }

    /// Publish, starting with the scheme that accepted the write
    async fn publish(
        &self,
        target: &ResourcePath,
        written: AddressingScheme,
        token: &AuthToken,
    ) -> Result<AddressingScheme> {
        let operation = FileOperation::Publish {
            comment: &self.config.publish_comment,
        };
        for scheme in AddressingScheme::order_from(written) {
            let request = file_request(self.client.base(), scheme, target, operation)
                .with_header("X-RequestDigest", token.expose());
            let context = format!("publish:{scheme}");
            if self.client.send_optional(request, &context).await?.is_some() {
                tracing::info!("Published via {} scheme", scheme);
                return Ok(scheme);
            }
            tracing::warn!("Publish target not found via {} scheme", scheme);
        }

        Err(PipelineError::WriteTargetMissing {
            path: target.clone(),
            stage: WriteStep::Publish,
        })
    }

    async fn verify(
        &self,
        target: &ResourcePath,
        scheme: AddressingScheme,
        content: &ContentDocument,
    ) -> Result<()> {
        let request = file_request(self.client.base(), scheme, target, FileOperation::ReadContent);
        let Some(response) = self.client.send_optional(request, "verify").await? else {
            return Err(PipelineError::VerificationFailed {
                path: target.clone(),
                reason: "content could not be read back".to_string(),
            });
        };
        let document = response.json("verify")?;
        let stored = find_field(&document, None, CONTENT_FIELD).and_then(|value| value.as_str());

        match stored {
            Some(stored) if stored == content.as_str() => {
                tracing::debug!("Verified {} bytes of content", stored.len());
                Ok(())
            }
            Some(stored) => Err(PipelineError::VerificationFailed {
                path: target.clone(),
                reason: format!(
                    "stored content differs ({} bytes written, {} bytes read)",
                    content.len(),
                    stored.len()
                ),
            }),
            None => Err(PipelineError::VerificationFailed {
                path: target.clone(),
                reason: format!("{CONTENT_FIELD} missing from read-back"),
            }),
        }
    }

    /// Pre-probe, re-resolving on not-found under `AutoCorrect`
    async fn ensure_target(
        &self,
        path: &ResourcePath,
    ) -> Result<(ResourcePath, Option<ResourcePath>)> {
        if probe(&self.client, path).await?.is_some() {
            return Ok((path.clone(), None));
        }
        let missing = || PipelineError::TargetNotFound { path: path.clone() };

        match self.config.missing_target {
            MissingTargetPolicy::Abort => Err(missing()),
            MissingTargetPolicy::AutoCorrect => {
                let Some(leaf) = path.leaf() else {
                    return Err(missing());
                };
                let hint = self.resolver.hint(leaf).map_err(|_| missing())?;
                tracing::warn!("{} not found; re-resolving '{}'", path, leaf);

                let containers = list_containers(&self.client, &self.config.container_types).await?;
                let corrected = match self.resolver.resolve(&hint, &containers).await {
                    Ok(corrected) => corrected,
                    Err(PipelineError::NotFound { .. }) => return Err(missing()),
                    Err(e) => return Err(e),
                };
                if probe(&self.client, &corrected).await?.is_none() {
                    return Err(missing());
                }

                tracing::info!("Auto-corrected {} -> {}", path, corrected);
                Ok((corrected, Some(path.clone())))
            }
        }
    }
}
