//! Role-driven model selection over a live catalog.

use std::sync::Arc;

use crate::catalog::{CatalogCache, CatalogClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::selection::{Candidate, CandidateSelector, Requirements, Selection, SelectionWarning};

/// Fetches the catalog (cached) and runs the selector for a role.
#[derive(Debug)]
pub struct ModelScout {
    config: Arc<Config>,
    client: CatalogClient,
    cache: CatalogCache,
    selector: CandidateSelector,
}

impl ModelScout {
    pub fn new(config: Config) -> Result<Self> {
        let client = CatalogClient::new(&config.catalog)?;
        let cache = CatalogCache::new(config.catalog.cache_ttl());
        let selector = CandidateSelector::from_config(&config.scoring, config.freshness.as_ref());

        Ok(Self {
            config: Arc::new(config),
            client,
            cache,
            selector,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selector(&self) -> &CandidateSelector {
        &self.selector
    }

    /// Current catalog contents, fetched at most once per TTL.
    pub async fn candidates(&self) -> Result<Arc<Vec<Candidate>>> {
        let client = &self.client;
        self.cache
            .get_or_fetch(client.url(), move || client.fetch())
            .await
    }

    /// Force the next call to refetch the catalog.
    pub fn refresh(&self) {
        self.cache.invalidate(self.client.url());
    }

    /// Select a primary and fallback for explicit requirements.
    pub async fn select(&self, requirements: &Requirements) -> Result<Selection> {
        let candidates = self.candidates().await?;
        let selection = self.selector.select(&candidates, requirements)?;
        log_selection(None, requirements, &selection);
        Ok(selection)
    }

    /// Select a primary and fallback for a configured role.
    pub async fn select_for_role(&self, role: &str) -> Result<Selection> {
        let requirements = self
            .config
            .role(role)
            .map(|r| r.requirements())
            .ok_or_else(|| Error::UnknownRole(role.to_string()))?;

        let candidates = self.candidates().await?;
        let selection = self.selector.select(&candidates, &requirements)?;
        log_selection(Some(role), &requirements, &selection);
        Ok(selection)
    }
}

fn log_selection(role: Option<&str>, requirements: &Requirements, selection: &Selection) {
    let role = role.unwrap_or("-");
    tracing::info!(
        role = %role,
        primary = %selection.primary.identifier(),
        primary_total = selection.primary.scores.total,
        fallback = %selection.fallback.identifier(),
        fallback_total = selection.fallback.scores.total,
        eligible = selection.eligible,
        total = selection.total,
        languages = ?requirements.languages,
        size = requirements.size.map(|s| s.as_str()).unwrap_or("-"),
        "Selected models"
    );

    if selection.warning == Some(SelectionWarning::SingleCandidate) {
        tracing::warn!(
            role = %role,
            primary = %selection.primary.identifier(),
            "Only one eligible candidate, fallback equals primary"
        );
    } else if !selection.is_diverse() {
        tracing::warn!(
            role = %role,
            provider = %selection.primary.provider(),
            "Fallback shares the primary's provider"
        );
    }
}
