//! Configuration parsing and validation for modelscout.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::selection::{Requirements, SizeCategory, Weights};

/// Root configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub scoring: ScoringConfig,
    pub freshness: Option<FreshnessConfig>,
    pub roles: Vec<RoleConfig>,
    pub logging: LoggingConfig,
}

/// Model catalog endpoint configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog URL (e.g., "https://openrouter.ai/api/v1/models")
    pub url: String,
    /// Optional bearer token sent with catalog requests
    pub api_key: Option<ApiKey>,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// How long a fetched catalog stays fresh in the cache
    pub cache_ttl_secs: u64,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_catalog_url() -> String {
    "https://openrouter.ai/api/v1/models".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// API key wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
///
/// Only accessible via `.expose_secret()`.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Every call site is auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// How the catalog API key was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Key was a literal string in config (no ${} references)
    Literal,
    /// Key contained ${VAR} references expanded from environment
    EnvExpanded,
    /// Key was auto-discovered from the convention env var (holds var name)
    Convention(String),
    /// No key available
    None,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => write!(f, "config-literal"),
            KeySource::EnvExpanded => write!(f, "env-expanded"),
            KeySource::Convention(var) => write!(f, "convention ({})", var),
            KeySource::None => write!(f, "none"),
        }
    }
}

/// Reference ceilings and lexical tier tokens used by the default scoring strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Average price per million tokens at (or above) which the cost score is 0
    #[serde(default = "default_cost_ceiling")]
    pub cost_ceiling: f64,
    /// Context window at (or above) which the context signal saturates
    #[serde(default = "default_context_ceiling")]
    pub context_ceiling: u64,
    /// Share of the quality score driven by context capacity (rest is the tier signal)
    #[serde(default = "default_quality_context_share")]
    pub quality_context_share: f64,
    /// Share of the speed score driven by (inverse) context capacity
    #[serde(default = "default_speed_context_share")]
    pub speed_context_share: f64,
    /// Name tokens that mark a premium tier
    #[serde(default = "default_premium_tokens")]
    pub premium_tokens: Vec<String>,
    /// Name tokens that mark a fast/compact tier
    #[serde(default = "default_fast_tokens")]
    pub fast_tokens: Vec<String>,
}

fn default_cost_ceiling() -> f64 {
    100.0
}

fn default_context_ceiling() -> u64 {
    1_000_000
}

fn default_quality_context_share() -> f64 {
    0.6
}

fn default_speed_context_share() -> f64 {
    0.3
}

fn default_premium_tokens() -> Vec<String> {
    ["opus", "pro", "ultra", "large", "max"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_fast_tokens() -> Vec<String> {
    ["mini", "flash", "haiku", "nano", "lite", "small", "fast", "turbo"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cost_ceiling: default_cost_ceiling(),
            context_ceiling: default_context_ceiling(),
            quality_context_share: default_quality_context_share(),
            speed_context_share: default_speed_context_share(),
            premium_tokens: default_premium_tokens(),
            fast_tokens: default_fast_tokens(),
        }
    }
}

/// Optional staleness filter applied before scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct FreshnessConfig {
    /// Name tokens that mark a candidate as stale
    #[serde(default = "default_stale_markers")]
    pub stale_markers: Vec<String>,
    /// Date-stamped candidates released before this date are stale
    #[serde(default)]
    pub released_after: Option<NaiveDate>,
}

fn default_stale_markers() -> Vec<String> {
    vec!["deprecated".to_string(), "legacy".to_string()]
}

/// A named selection profile.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// Role name (e.g., "deepwiki", "researcher")
    pub name: String,
    /// Relative priorities of quality, speed and cost
    pub weights: Weights,
    /// Reject candidates with a smaller context window
    pub min_context_capacity: Option<u64>,
    /// Reject candidates whose average price per million tokens is higher
    pub max_average_cost: Option<f64>,
    /// Descriptive language hints
    #[serde(default)]
    pub languages: Vec<String>,
    /// Descriptive repository size hint
    pub size: Option<SizeCategory>,
}

impl RoleConfig {
    /// Build the selection requirements for this role.
    pub fn requirements(&self) -> Requirements {
        Requirements {
            weights: self.weights,
            min_context_capacity: self.min_context_capacity,
            max_average_cost: self.max_average_cost,
            languages: self.languages.clone(),
            size: self.size,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!("modelscout={}", self.level.trim().to_lowercase())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, expanding `${VAR}` references.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_env(path).map(|(config, _)| config)
    }

    /// Parse configuration from a TOML string, expanding `${VAR}` references.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        let (config, _) = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.url.is_empty() {
            return Err(ConfigError::Validation("Catalog URL is empty".to_string()));
        }
        if self.catalog.timeout_secs == 0 || self.catalog.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Catalog timeouts must be greater than zero".to_string(),
            ));
        }

        let scoring = &self.scoring;
        if !(scoring.cost_ceiling.is_finite() && scoring.cost_ceiling > 0.0) {
            return Err(ConfigError::Validation(format!(
                "cost_ceiling must be positive, got {}",
                scoring.cost_ceiling
            )));
        }
        if scoring.context_ceiling == 0 {
            return Err(ConfigError::Validation(
                "context_ceiling must be positive".to_string(),
            ));
        }
        for (field, share) in [
            ("quality_context_share", scoring.quality_context_share),
            ("speed_context_share", scoring.speed_context_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(ConfigError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    field, share
                )));
            }
        }

        if self.roles.is_empty() {
            tracing::warn!("No roles configured - only explicit requirements can be selected");
        }

        let mut seen = HashSet::new();
        for role in &self.roles {
            if !seen.insert(role.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate role '{}'",
                    role.name
                )));
            }
            role.weights.validate().map_err(|e| {
                ConfigError::Validation(format!("Role '{}': {}", role.name, e))
            })?;
            if let Some(max) = role.max_average_cost {
                if !(max.is_finite() && max >= 0.0) {
                    return Err(ConfigError::Validation(format!(
                        "Role '{}' has invalid max_average_cost {}",
                        role.name, max
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a role by name.
    pub fn role(&self, name: &str) -> Option<&RoleConfig> {
        self.roles.iter().find(|r| r.name == name)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable '{var}' not set for {context}: {message}")]
    EnvVar {
        var: String,
        context: String,
        message: String,
    },
}

/// Raw catalog config deserialized directly from TOML.
/// api_key is `Option<String>` so it may contain `${VAR}` references not yet expanded.
#[derive(Deserialize)]
pub struct RawCatalogConfig {
    #[serde(default = "default_catalog_url")]
    url: String,
    api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,
}

impl Default for RawCatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Raw configuration deserialized directly from TOML.
/// The catalog api_key may contain `${VAR}` references not yet expanded.
#[derive(Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    catalog: RawCatalogConfig,
    #[serde(default)]
    scoring: ScoringConfig,
    freshness: Option<FreshnessConfig>,
    #[serde(default)]
    roles: Vec<RoleConfig>,
    #[serde(default)]
    logging: LoggingConfig,
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Supports multiple `${VAR}` in one string (e.g., `${SCHEME}://${HOST}/v1`).
/// Fails on first missing variable, unclosed `${`, or empty variable name.
fn expand_env_vars_with<F>(input: &str, context: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            context: context.to_string(),
            message: format!("Unclosed '${{' in config value: {}", input),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                context: context.to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            context: context.to_string(),
            message: format!(
                "Environment variable '{}' is not set (referenced in {})",
                var_name, context
            ),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

/// Convention env var consulted when `[catalog]` has no `api_key`.
pub const CONVENTION_API_KEY_VAR: &str = "MODELSCOUT_CATALOG_API_KEY";

impl Config {
    /// Convert raw (deserialized) config to final config with env var expansion.
    ///
    /// - If `api_key` contains `${VAR}`: expand from environment, source = `EnvExpanded`
    /// - If `api_key` is a literal string: wrap directly, source = `Literal`
    /// - If `api_key` is absent: try `MODELSCOUT_CATALOG_API_KEY`,
    ///   source = `Convention(var_name)` or `KeySource::None`
    pub fn from_raw(raw: RawConfig) -> Result<(Self, KeySource), ConfigError> {
        Self::from_raw_with(raw, |name| std::env::var(name).ok())
    }

    fn from_raw_with<F>(raw: RawConfig, lookup: F) -> Result<(Self, KeySource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rc = raw.catalog;
        let (api_key, source) = match rc.api_key {
            Some(ref raw_key) if raw_key.contains("${") => {
                let expanded = expand_env_vars_with(raw_key, "catalog.api_key", &lookup)?;
                (Some(ApiKey::from(expanded)), KeySource::EnvExpanded)
            }
            Some(ref raw_key) => (Some(ApiKey::from(raw_key.as_str())), KeySource::Literal),
            None => match lookup(CONVENTION_API_KEY_VAR) {
                Some(value) => (
                    Some(ApiKey::from(value)),
                    KeySource::Convention(CONVENTION_API_KEY_VAR.to_string()),
                ),
                None => (None, KeySource::None),
            },
        };

        let url = expand_env_vars_with(&rc.url, "catalog.url", &lookup)?;

        let config = Config {
            catalog: CatalogConfig {
                url,
                api_key,
                timeout_secs: rc.timeout_secs,
                connect_timeout_secs: rc.connect_timeout_secs,
                cache_ttl_secs: rc.cache_ttl_secs,
            },
            scoring: raw.scoring,
            freshness: raw.freshness,
            roles: raw.roles,
            logging: raw.logging,
        };

        Ok((config, source))
    }

    /// Load configuration from a TOML file with environment variable expansion.
    ///
    /// Returns the config and how the catalog API key was resolved.
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<(Self, KeySource), ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        let raw: RawConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
        let (config, key_source) = Self::from_raw(raw)?;
        config.validate()?;

        Ok((config, key_source))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                url: default_catalog_url(),
                api_key: None,
                timeout_secs: default_timeout_secs(),
                connect_timeout_secs: default_connect_timeout_secs(),
                cache_ttl_secs: default_cache_ttl_secs(),
            },
            scoring: ScoringConfig::default(),
            freshness: None,
            roles: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}
