//! HTTP client for an OpenRouter-compatible model catalog.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::{ApiKey, CatalogConfig};
use crate::error::{Error, Result};
use crate::selection::Candidate;

/// Catalog prices are quoted per token; candidates carry per-million prices.
const TOKENS_PER_MILLION: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<CatalogModel>,
}

#[derive(Debug, Deserialize)]
struct CatalogModel {
    id: String,
    #[serde(default)]
    context_length: Option<u64>,
    #[serde(default)]
    pricing: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    #[serde(default)]
    prompt: Option<Price>,
    #[serde(default)]
    completion: Option<Price>,
}

/// Prices arrive as decimal strings (`"0.000003"`) or bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Text(String),
    Number(f64),
}

impl Price {
    fn per_token(&self) -> Option<f64> {
        match self {
            Price::Text(s) => s.trim().parse().ok(),
            Price::Number(n) => Some(*n),
        }
    }
}

/// Fetches candidate lists from a catalog endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    url: String,
    api_key: Option<ApiKey>,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate the catalog's candidate list.
    ///
    /// Bounded by the configured timeout; dropping the future cancels the
    /// request.
    pub async fn fetch(&self) -> Result<Vec<Candidate>> {
        match tokio::time::timeout(self.timeout, self.fetch_inner()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(url = %self.url, timeout = ?self.timeout, "Catalog fetch timed out");
                Err(Error::CatalogTimeout(self.timeout))
            }
        }
    }

    async fn fetch_inner(&self) -> Result<Vec<Candidate>> {
        let mut request = self.http.get(&self.url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        tracing::debug!(url = %self.url, "Fetching model catalog");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Catalog(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let body: ModelsResponse = response
            .json()
            .await
            .map_err(|e| Error::Catalog(format!("Invalid catalog response: {}", e)))?;

        let candidates = into_candidates(body.data);
        tracing::info!(url = %self.url, count = candidates.len(), "Fetched model catalog");
        Ok(candidates)
    }
}

/// Convert wire models into validated, de-duplicated candidates.
fn into_candidates(models: Vec<CatalogModel>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(models.len());

    for model in models {
        let Some(candidate) = to_candidate(&model) else {
            continue;
        };
        if !seen.insert(candidate.identifier().to_string()) {
            tracing::warn!(id = %model.id, "Duplicate catalog entry, keeping first occurrence");
            continue;
        }
        candidates.push(candidate);
    }

    candidates
}

fn to_candidate(model: &CatalogModel) -> Option<Candidate> {
    let pricing = model.pricing.as_ref()?;
    let input = pricing.prompt.as_ref()?.per_token()?;
    let output = pricing.completion.as_ref()?.per_token()?;

    match Candidate::new(
        model.id.clone(),
        model.context_length.unwrap_or(0),
        input * TOKENS_PER_MILLION,
        output * TOKENS_PER_MILLION,
    ) {
        Ok(candidate) => Some(candidate),
        Err(e) => {
            tracing::debug!(id = %model.id, error = %e, "Skipping catalog entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Candidate> {
        let body: ModelsResponse = serde_json::from_str(json).unwrap();
        into_candidates(body.data)
    }

    #[test]
    fn test_prices_converted_to_per_million() {
        let candidates = parse(
            r#"{"data":[{"id":"anthropic/claude-3-opus","context_length":200000,
                "pricing":{"prompt":"0.000015","completion":"0.000075"}}]}"#,
        );
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.provider(), "anthropic");
        assert_eq!(c.context_capacity(), 200_000);
        assert!((c.input_cost() - 15.0).abs() < 1e-9);
        assert!((c.output_cost() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_prices_accepted() {
        let candidates = parse(
            r#"{"data":[{"id":"b/y","pricing":{"prompt":0.00001,"completion":0.00003}}]}"#,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].context_capacity(), 0);
        assert!((candidates[0].average_cost() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_entries_without_pricing_or_provider_skipped() {
        let candidates = parse(
            r#"{"data":[
                {"id":"no-pricing/model","context_length":8192},
                {"id":"noslash","pricing":{"prompt":"0","completion":"0"}},
                {"id":"bad/price","pricing":{"prompt":"abc","completion":"0"}},
                {"id":"neg/price","pricing":{"prompt":"-1","completion":"0"}},
                {"id":"ok/model","pricing":{"prompt":"0","completion":"0"}}
            ]}"#,
        );
        let ids: Vec<&str> = candidates.iter().map(|c| c.identifier()).collect();
        assert_eq!(ids, vec!["ok/model"]);
    }

    #[test]
    fn test_duplicates_keep_first() {
        let candidates = parse(
            r#"{"data":[
                {"id":"a/x","context_length":1000,"pricing":{"prompt":"0","completion":"0"}},
                {"id":"a/x","context_length":2000,"pricing":{"prompt":"0","completion":"0"}}
            ]}"#,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].context_capacity(), 1000);
    }
}
