//! Resolver
//!
//! Finds the exact path of a page from a loose hint. Strategies, cheapest
//! first, first success wins:
//!
//! 1. Exact leaf match in every container root (root listings fetched once)
//! 2. Fuzzy stem match in the same cached root listings
//! 3. Title-field query per container (title-like hints, optional)
//! 4. Breadth-first folder traversal under a single folder budget
//! 5. Full-text search
//!
//! Within a strategy the server's order decides. Not-found answers while
//! listing are skipped; every other failure aborts the resolve.

use crate::addressing::encode_decoded_url;
use crate::client::{odata_literal, SiteClient};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use sitepage_model::{
    ContainerDescriptor, HintKind, MatchCandidate, MatchKind, ResourcePath, SearchHint,
};
use sitepage_odata::{
    decode_records, extract_rows, FileRecord, FolderRecord, ListItemRecord, PathSelector,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::Instrument;

/// Multi-strategy page resolver
#[derive(Debug, Clone)]
pub struct Resolver {
    client: SiteClient,
    config: Arc<PipelineConfig>,
}

impl Resolver {
    #[must_use]
    pub fn new(client: SiteClient, config: Arc<PipelineConfig>) -> Self {
        Self { client, config }
    }

    /// Classify a raw hint against the configured page extension
    ///
    /// # Errors
    /// `PipelineError::Hint` for blank or extension-only hints
    pub fn hint(&self, raw: &str) -> Result<SearchHint> {
        Ok(SearchHint::with_extension(raw, self.config.page_extension.as_str())?)
    }

    /// Resolve to a canonical path
    ///
    /// # Errors
    /// `NotFound` once every strategy is exhausted; transport and shape
    /// errors propagate unchanged
    pub async fn resolve(
        &self,
        hint: &SearchHint,
        containers: &[ContainerDescriptor],
    ) -> Result<ResourcePath> {
        self.resolve_candidate(hint, containers)
            .await
            .map(|candidate| candidate.path)
    }

    /// Resolve, keeping the rule that matched
    ///
    /// # Errors
    /// See [`Resolver::resolve`].
    pub async fn resolve_candidate(
        &self,
        hint: &SearchHint,
        containers: &[ContainerDescriptor],
    ) -> Result<MatchCandidate> {
        let span = tracing::info_span!("resolve", hint = %hint);
        self.run(hint, containers).instrument(span).await
    }

    async fn run(
        &self,
        hint: &SearchHint,
        containers: &[ContainerDescriptor],
    ) -> Result<MatchCandidate> {
        tracing::debug!(
            "Resolving '{}' ({:?}, leaf {}) across {} containers",
            hint,
            hint.kind(),
            hint.leaf(),
            containers.len()
        );

        let mut roots = Vec::with_capacity(containers.len());
        for container in containers {
            let files = match self.list_files(&container.root_path).await? {
                Some(files) => files,
                None => {
                    tracing::warn!("Container root not found: {}", container.root_path);
                    Vec::new()
                }
            };
            roots.push(files);
        }

        for (container, files) in containers.iter().zip(&roots) {
            if let Some(hit) = exact_match(hint, files) {
                return Ok(found(hit, container));
            }
        }

        for (container, files) in containers.iter().zip(&roots) {
            if let Some(hit) = fuzzy_match(hint, files) {
                return Ok(found(hit, container));
            }
        }

        if hint.kind() == HintKind::TitleLike && self.config.title_lookup {
            for container in containers {
                if let Some(hit) = self.title_lookup(hint, container).await? {
                    return Ok(found(hit, container));
                }
            }
        }

        if let Some((hit, container)) = self.traverse(hint, containers).await? {
            return Ok(found(hit, container));
        }

        if let Some(hit) = self.search(hint).await? {
            tracing::info!("Resolved '{}' via {} -> {}", hint, hit.kind, hit.path);
            return Ok(hit);
        }

        tracing::info!("No page matches '{}'", hint);
        Err(PipelineError::NotFound {
            hint: hint.raw().to_string(),
        })
    }

    /// Breadth-first traversal below each container root
    ///
    /// Root file listings were already matched, so only subfolder listings of
    /// the root are fetched. The folder budget and visited set span all
    /// containers of this call.
    async fn traverse<'c>(
        &self,
        hint: &SearchHint,
        containers: &'c [ContainerDescriptor],
    ) -> Result<Option<(MatchCandidate, &'c ContainerDescriptor)>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut explored = 0usize;

        for container in containers {
            if !visited.insert(folder_key(&container.root_path)) {
                continue;
            }
            let mut queue = VecDeque::from([container.root_path.clone()]);

            while let Some(folder) = queue.pop_front() {
                if explored >= self.config.max_folders {
                    tracing::warn!(
                        "Folder budget of {} exhausted while resolving '{}'",
                        self.config.max_folders,
                        hint
                    );
                    return Ok(None);
                }
                explored += 1;

                if folder != container.root_path {
                    let Some(files) = self.list_files(&folder).await? else {
                        tracing::debug!("Skipping missing folder {}", folder);
                        continue;
                    };
                    if let Some(hit) = exact_match(hint, &files).or_else(|| fuzzy_match(hint, &files)) {
                        return Ok(Some((hit, container)));
                    }
                }

                let Some(subfolders) = self.list_folders(&folder).await? else {
                    continue;
                };
                for subfolder in subfolders {
                    if self.config.is_skipped_folder(&subfolder.name) {
                        tracing::debug!("Skipping system folder {}", subfolder.server_relative_url);
                        continue;
                    }
                    if visited.insert(folder_key(&subfolder.server_relative_url)) {
                        queue.push_back(subfolder.server_relative_url);
                    }
                }
            }
        }

        tracing::debug!("Traversal explored {} folders without a match", explored);
        Ok(None)
    }

    /// Most recently modified item whose title equals the hint
    async fn title_lookup(
        &self,
        hint: &SearchHint,
        container: &ContainerDescriptor,
    ) -> Result<Option<MatchCandidate>> {
        let context = format!("items:{}", container.display_name);
        let url = self.client.api_url(&format!(
            "web/lists(guid'{}')/items?$select=Id,FileLeafRef,FileRef,Title&$filter=Title%20eq%20'{}'&$orderby=Modified%20desc&$top=1",
            container.id,
            odata_literal(hint.raw())
        ));
        let Some(document) = self.client.get_json(url, &context).await? else {
            return Ok(None);
        };
        let items: Vec<ListItemRecord> = decode_records(&document, &context)?;
        Ok(items.into_iter().next().map(|item| {
            MatchCandidate::new(item.leaf_name(), item.file_ref, MatchKind::TitleField)
        }))
    }

    /// Full-text search fallback
    async fn search(&self, hint: &SearchHint) -> Result<Option<MatchCandidate>> {
        let url = self.client.api_url(&format!(
            "search/query?querytext='{}'&rowlimit={}&trimduplicates=false&selectproperties='{}'",
            odata_literal(&hint.search_query()),
            self.config.search_row_limit,
            self.config.search_select_properties.join(",")
        ));
        let Some(document) = self.client.get_json(url, "search").await? else {
            tracing::debug!("Search endpoint not found; treating as no hit");
            return Ok(None);
        };
        let rows = extract_rows(&document, "search")?;
        tracing::debug!("Search returned {} rows", rows.len());

        let selector = PathSelector::new(hint.extension())
            .with_preferred_host(self.config.preferred_host.as_deref());
        Ok(selector.select(&rows).map(|path| {
            let name = path.leaf().unwrap_or_default().to_string();
            MatchCandidate::new(name, path, MatchKind::FullTextHit)
        }))
    }

    /// Every file of `folder`, across all pages; `None` when the folder is gone
    async fn list_files(&self, folder: &ResourcePath) -> Result<Option<Vec<FileRecord>>> {
        let context = format!("files:{folder}");
        let url = self.client.api_url(&format!(
            "web/GetFolderByServerRelativePath(decodedurl='{}')/Files?$select=Name,ServerRelativeUrl,TimeLastModified&$top={}",
            encode_decoded_url(folder),
            self.config.files_page_size
        ));
        self.client.get_all_records(url, &context).await
    }

    async fn list_folders(&self, folder: &ResourcePath) -> Result<Option<Vec<FolderRecord>>> {
        let context = format!("folders:{folder}");
        let url = self.client.api_url(&format!(
            "web/GetFolderByServerRelativePath(decodedurl='{}')/Folders?$select=Name,ServerRelativeUrl&$top={}",
            encode_decoded_url(folder),
            self.config.folders_page_size
        ));
        self.client.get_all_records(url, &context).await
    }
}

fn exact_match(hint: &SearchHint, files: &[FileRecord]) -> Option<MatchCandidate> {
    files.iter().find(|file| hint.is_exact(&file.name)).map(|file| {
        MatchCandidate::new(&file.name, file.server_relative_url.clone(), MatchKind::Exact)
    })
}

fn fuzzy_match(hint: &SearchHint, files: &[FileRecord]) -> Option<MatchCandidate> {
    files
        .iter()
        .filter(|file| file.server_relative_url.has_extension(hint.extension()))
        .find_map(|file| {
            hint.fuzzy_kind(&file.name)
                .map(|kind| MatchCandidate::new(&file.name, file.server_relative_url.clone(), kind))
        })
}

fn found(hit: MatchCandidate, container: &ContainerDescriptor) -> MatchCandidate {
    tracing::info!(
        "Resolved via {} in '{}' -> {}",
        hit.kind,
        container.display_name,
        hit.path
    );
    hit
}

fn folder_key(path: &ResourcePath) -> String {
    path.as_str().to_lowercase()
}
