//! Per-axis scoring strategies.

use std::collections::HashSet;

use super::Candidate;
use crate::config::ScoringConfig;

/// Tier signal for a name with no matching tier token.
const NEUTRAL_TIER: f64 = 0.5;

/// Tier signal on the axis a tier trades away (e.g. speed for premium).
const TRADED_TIER: f64 = 0.3;

/// Quality and speed estimates for one candidate, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScores {
    pub quality: f64,
    pub speed: f64,
}

impl AxisScores {
    pub fn new(quality: f64, speed: f64) -> Self {
        Self {
            quality: clamp_unit(quality),
            speed: clamp_unit(speed),
        }
    }
}

/// Estimates quality and speed for a candidate.
///
/// Implementations must be deterministic: no wall clock, no I/O.
pub trait ScoringStrategy: Send + Sync {
    fn score(&self, candidate: &Candidate) -> AxisScores;
}

/// Cheaper is better, saturating at `cost_ceiling`.
pub fn cost_score(average_cost: f64, cost_ceiling: f64) -> f64 {
    if cost_ceiling.is_nan() || cost_ceiling <= 0.0 || !average_cost.is_finite() {
        return 0.0;
    }
    1.0 - (average_cost.max(0.0) / cost_ceiling).min(1.0)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Blends context capacity with tier tokens found in the model name.
///
/// Tokens are matched whole: the name is lowercased and split on every
/// non-alphanumeric character, so `"mini"` does not match `"gemini"`.
#[derive(Debug, Clone)]
pub struct LexicalScoring {
    context_ceiling: u64,
    quality_context_share: f64,
    speed_context_share: f64,
    premium_tokens: HashSet<String>,
    fast_tokens: HashSet<String>,
}

impl LexicalScoring {
    pub fn from_config(config: &ScoringConfig) -> Self {
        let normalize = |tokens: &[String]| -> HashSet<String> {
            tokens.iter().map(|t| t.to_lowercase()).collect()
        };
        Self {
            context_ceiling: config.context_ceiling,
            quality_context_share: clamp_unit(config.quality_context_share),
            speed_context_share: clamp_unit(config.speed_context_share),
            premium_tokens: normalize(&config.premium_tokens),
            fast_tokens: normalize(&config.fast_tokens),
        }
    }

    /// Context capacity relative to the ceiling, saturating at 1.
    fn context_norm(&self, capacity: u64) -> Option<f64> {
        if capacity == 0 || self.context_ceiling == 0 {
            return None;
        }
        Some((capacity as f64 / self.context_ceiling as f64).min(1.0))
    }
}

impl Default for LexicalScoring {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

/// Lowercased alphanumeric tokens of a model name.
pub(crate) fn name_tokens(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

impl ScoringStrategy for LexicalScoring {
    fn score(&self, candidate: &Candidate) -> AxisScores {
        let mut premium = false;
        let mut fast = false;
        for token in name_tokens(candidate.name()) {
            premium |= self.premium_tokens.contains(&token);
            fast |= self.fast_tokens.contains(&token);
        }

        let tier_quality = match (premium, fast) {
            (true, _) => 1.0,
            (false, true) => TRADED_TIER,
            (false, false) => NEUTRAL_TIER,
        };
        let tier_speed = match (premium, fast) {
            (_, true) => 1.0,
            (true, false) => TRADED_TIER,
            (false, false) => NEUTRAL_TIER,
        };

        // Missing context contributes nothing on either axis.
        let (quality_ctx, speed_ctx) = match self.context_norm(candidate.context_capacity()) {
            Some(norm) => (norm, 1.0 - norm),
            None => (0.0, 0.0),
        };

        let q_share = self.quality_context_share;
        let s_share = self.speed_context_share;
        AxisScores::new(
            q_share * quality_ctx + (1.0 - q_share) * tier_quality,
            s_share * speed_ctx + (1.0 - s_share) * tier_speed,
        )
    }
}
