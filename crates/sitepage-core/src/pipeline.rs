//! Pipeline facade
//!
//! Wires the container enumerator, resolver and orchestrator around one
//! site-scoped client.

use crate::client::SiteClient;
use crate::config::PipelineConfig;
use crate::containers::list_containers;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::probe::probe;
use crate::resolver::Resolver;
use crate::transport::Transport;
use crate::update::UpdateOrchestrator;
use sitepage_model::{
    AddressingScheme, ContainerDescriptor, ContentDocument, MatchCandidate, ResourcePath,
    UpdateOutcome,
};
use std::sync::Arc;
use url::Url;

/// Resolve-then-update entry point for one site
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: SiteClient,
    config: Arc<PipelineConfig>,
    resolver: Resolver,
    orchestrator: UpdateOrchestrator,
}

impl Pipeline {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, site: Url, config: PipelineConfig) -> Self {
        let client = SiteClient::new(transport, site);
        let config = Arc::new(config);
        Self {
            resolver: Resolver::new(client.clone(), Arc::clone(&config)),
            orchestrator: UpdateOrchestrator::new(client.clone(), Arc::clone(&config)),
            client,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn client(&self) -> &SiteClient {
        &self.client
    }

    /// Page libraries of the site
    ///
    /// # Errors
    /// See [`list_containers`].
    pub async fn containers(&self) -> Result<Vec<ContainerDescriptor>> {
        list_containers(&self.client, &self.config.container_types).await
    }

    /// Enumerate containers and resolve `raw` against them
    ///
    /// # Errors
    /// `Hint` for unusable input, `NotFound` once every strategy is exhausted
    pub async fn resolve(&self, raw: &str) -> Result<MatchCandidate> {
        let hint = self.resolver.hint(raw)?;
        let containers = self.containers().await?;
        self.resolver.resolve_candidate(&hint, &containers).await
    }

    /// Existence check under each addressing scheme
    ///
    /// # Errors
    /// See [`probe`].
    pub async fn probe(&self, path: &ResourcePath) -> Result<Option<AddressingScheme>> {
        probe(&self.client, path).await
    }

    /// Conditional write at a known path
    ///
    /// # Errors
    /// See [`UpdateOrchestrator::update`].
    pub async fn update(
        &self,
        path: &ResourcePath,
        content: &ContentDocument,
        publish: bool,
    ) -> Result<UpdateOutcome> {
        self.orchestrator.update(path, content, publish).await
    }

    /// Resolve a hint, then write to the path it resolves to
    ///
    /// # Errors
    /// Errors of [`Pipeline::resolve`] and [`Pipeline::update`]
    pub async fn resolve_and_update(
        &self,
        raw: &str,
        content: &ContentDocument,
        publish: bool,
    ) -> Result<UpdateOutcome> {
        let candidate = self.resolve(raw).await?;
        self.update(&candidate.path, content, publish).await
    }

    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.client.clone())
    }
}
