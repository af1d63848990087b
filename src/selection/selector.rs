//! Primary/fallback selection over a candidate list.

use std::cmp::Ordering;

use super::freshness::{Freshness, FreshnessStrategy, MarkerFreshness};
use super::scoring::{cost_score, LexicalScoring, ScoringStrategy};
use super::{Candidate, Requirements, ScoredCandidate, Scores, Weights};
use crate::config::{FreshnessConfig, ScoringConfig};
use crate::error::{Error, Result};

/// Non-fatal conditions attached to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionWarning {
    /// Only one candidate passed filtering; `fallback` equals `primary`.
    SingleCandidate,
}

impl SelectionWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionWarning::SingleCandidate => "single_candidate",
        }
    }
}

/// Result of a selection call.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub primary: ScoredCandidate,
    pub fallback: ScoredCandidate,
    pub warning: Option<SelectionWarning>,
    /// Candidates that passed the hard filters.
    pub eligible: usize,
    /// Candidates offered to the selector.
    pub total: usize,
}

impl Selection {
    /// Whether primary and fallback come from different providers.
    pub fn is_diverse(&self) -> bool {
        self.primary.provider() != self.fallback.provider()
    }
}

/// Ranks candidates against requirements and picks a primary and fallback.
///
/// Stateless and synchronous: every call works only on its arguments.
pub struct CandidateSelector {
    strategy: Box<dyn ScoringStrategy>,
    cost_ceiling: f64,
    freshness: Option<Box<dyn FreshnessStrategy>>,
}

impl CandidateSelector {
    pub fn new(strategy: Box<dyn ScoringStrategy>, cost_ceiling: f64) -> Self {
        Self {
            strategy,
            cost_ceiling,
            freshness: None,
        }
    }

    /// Lexical scoring with ceilings and tokens from config.
    pub fn from_config(scoring: &ScoringConfig, freshness: Option<&FreshnessConfig>) -> Self {
        let selector = Self::new(
            Box::new(LexicalScoring::from_config(scoring)),
            scoring.cost_ceiling,
        );
        match freshness {
            Some(config) => selector.with_freshness(Box::new(MarkerFreshness::from_config(config))),
            None => selector,
        }
    }

    /// Drop candidates the strategy judges stale before scoring.
    pub fn with_freshness(mut self, freshness: Box<dyn FreshnessStrategy>) -> Self {
        self.freshness = Some(freshness);
        self
    }

    /// Score one candidate under the given weights.
    pub fn score(&self, candidate: &Candidate, weights: &Weights) -> ScoredCandidate {
        let axes = self.strategy.score(candidate);
        let cost = cost_score(candidate.average_cost(), self.cost_ceiling);
        let total = axes.quality * weights.quality + axes.speed * weights.speed + cost * weights.cost;
        ScoredCandidate {
            candidate: candidate.clone(),
            scores: Scores {
                quality: axes.quality,
                speed: axes.speed,
                cost,
                total,
            },
        }
    }

    /// Filter, score and sort candidates, best first.
    pub fn rank(
        &self,
        candidates: &[Candidate],
        requirements: &Requirements,
    ) -> Result<Vec<ScoredCandidate>> {
        if candidates.is_empty() {
            return Err(Error::EmptyCandidateList);
        }
        requirements.weights.validate()?;

        let mut ranked: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|c| requirements.admits(c))
            .filter(|c| self.is_fresh(c))
            .map(|c| self.score(c, &requirements.weights))
            .collect();

        if ranked.is_empty() {
            return Err(Error::NoEligibleCandidates {
                total: candidates.len(),
                min_context_capacity: requirements.min_context_capacity,
                max_average_cost: requirements.max_average_cost,
            });
        }

        ranked.sort_by(compare_ranked);
        Ok(ranked)
    }

    /// Pick the best candidate and a fallback from a different provider.
    ///
    /// The fallback shares the primary's provider only when no other
    /// provider is eligible. With a single eligible candidate the fallback
    /// is the primary itself and a [`SelectionWarning::SingleCandidate`] is
    /// attached.
    pub fn select(&self, candidates: &[Candidate], requirements: &Requirements) -> Result<Selection> {
        let ranked = self.rank(candidates, requirements)?;
        let eligible = ranked.len();

        let mut iter = ranked.into_iter();
        let primary = iter.next().ok_or(Error::EmptyCandidateList)?;
        let rest: Vec<ScoredCandidate> = iter.collect();

        let (fallback, warning) = match rest
            .iter()
            .position(|c| c.provider() != primary.provider())
        {
            Some(idx) => (rest[idx].clone(), None),
            None => match rest.first() {
                Some(next) => {
                    tracing::debug!(
                        provider = %primary.provider(),
                        "No other provider eligible, fallback shares primary's provider"
                    );
                    (next.clone(), None)
                }
                None => (primary.clone(), Some(SelectionWarning::SingleCandidate)),
            },
        };

        Ok(Selection {
            primary,
            fallback,
            warning,
            eligible,
            total: candidates.len(),
        })
    }

    fn is_fresh(&self, candidate: &Candidate) -> bool {
        let Some(strategy) = &self.freshness else {
            return true;
        };
        match strategy.assess(candidate) {
            Freshness::Stale(reason) => {
                tracing::debug!(candidate = %candidate.identifier(), reason = %reason, "Excluding stale candidate");
                false
            }
            _ => true,
        }
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default(), None)
    }
}

impl std::fmt::Debug for CandidateSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateSelector")
            .field("cost_ceiling", &self.cost_ceiling)
            .field("freshness", &self.freshness.is_some())
            .finish_non_exhaustive()
    }
}

/// Descending total, then larger context, then identifier ascending.
fn compare_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.scores
        .total
        .total_cmp(&a.scores.total)
        .then_with(|| {
            b.candidate
                .context_capacity()
                .cmp(&a.candidate.context_capacity())
        })
        .then_with(|| a.identifier().cmp(b.identifier()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::AxisScores;

    /// Scores every candidate identically so ordering falls to tie-breakers.
    struct FlatScoring;

    impl ScoringStrategy for FlatScoring {
        fn score(&self, _: &Candidate) -> AxisScores {
            AxisScores::new(0.5, 0.5)
        }
    }

    struct RejectAll;

    impl FreshnessStrategy for RejectAll {
        fn assess(&self, _: &Candidate) -> Freshness {
            Freshness::Stale("test".to_string())
        }
    }

    fn c(id: &str, context: u64, input: f64, output: f64) -> Candidate {
        Candidate::new(id, context, input, output).unwrap()
    }

    fn quality_first() -> Requirements {
        Requirements::new(Weights::new(0.7, 0.1, 0.2).unwrap())
    }

    #[test]
    fn test_empty_list_is_error() {
        let selector = CandidateSelector::default();
        let result = selector.select(&[], &quality_first());
        assert!(matches!(result, Err(Error::EmptyCandidateList)));
    }

    #[test]
    fn test_ties_break_on_context_then_identifier() {
        let selector = CandidateSelector::new(Box::new(FlatScoring), 100.0);
        let list = vec![
            c("b/beta", 100_000, 1.0, 1.0),
            c("a/alpha", 100_000, 1.0, 1.0),
            c("z/zeta", 200_000, 1.0, 1.0),
        ];
        let ranked = selector.rank(&list, &quality_first()).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.identifier()).collect();
        assert_eq!(ids, vec!["z/zeta", "a/alpha", "b/beta"]);
    }

    #[test]
    fn test_fallback_skips_same_provider() {
        let selector = CandidateSelector::new(Box::new(FlatScoring), 100.0);
        let list = vec![
            c("openai/a", 300_000, 1.0, 1.0),
            c("openai/b", 200_000, 1.0, 1.0),
            c("google/c", 100_000, 1.0, 1.0),
        ];
        let selection = selector.select(&list, &quality_first()).unwrap();
        assert_eq!(selection.primary.identifier(), "openai/a");
        assert_eq!(selection.fallback.identifier(), "google/c");
        assert!(selection.is_diverse());
        assert_eq!(selection.warning, None);
    }

    #[test]
    fn test_same_provider_fallback_as_last_resort() {
        let selector = CandidateSelector::new(Box::new(FlatScoring), 100.0);
        let list = vec![c("openai/a", 300_000, 1.0, 1.0), c("openai/b", 200_000, 1.0, 1.0)];
        let selection = selector.select(&list, &quality_first()).unwrap();
        assert_eq!(selection.fallback.identifier(), "openai/b");
        assert!(!selection.is_diverse());
        assert_eq!(selection.warning, None);
    }

    #[test]
    fn test_single_candidate_warns() {
        let selector = CandidateSelector::default();
        let list = vec![c("solo/one", 128_000, 1.0, 2.0)];
        let selection = selector.select(&list, &quality_first()).unwrap();
        assert_eq!(selection.primary, selection.fallback);
        assert_eq!(selection.warning, Some(SelectionWarning::SingleCandidate));
        assert_eq!(selection.eligible, 1);
    }

    #[test]
    fn test_total_is_weighted_sum() {
        let selector = CandidateSelector::default();
        let scored = selector.score(&c("b/y", 128_000, 10.0, 30.0), &quality_first().weights);
        let s = scored.scores;
        let expected = s.quality * 0.7 + s.speed * 0.1 + s.cost * 0.2;
        assert!((s.total - expected).abs() < 1e-12);
        assert!((s.cost - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_fall_back_to_tie_breakers() {
        let selector = CandidateSelector::default();
        let req = Requirements::new(Weights::new(0.0, 0.0, 0.0).unwrap());
        let list = vec![c("a/x", 100, 1.0, 1.0), c("b/y", 200, 50.0, 50.0)];
        let selection = selector.select(&list, &req).unwrap();
        assert_eq!(selection.primary.identifier(), "b/y");
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let selector = CandidateSelector::default();
        let req = Requirements::new(Weights {
            quality: -1.0,
            speed: 0.0,
            cost: 0.0,
        });
        let result = selector.select(&[c("a/x", 1, 0.0, 0.0)], &req);
        assert!(matches!(result, Err(Error::InvalidRequirements(_))));
    }

    #[test]
    fn test_freshness_filter_can_exclude_everything() {
        let selector = CandidateSelector::default().with_freshness(Box::new(RejectAll));
        let result = selector.select(&[c("a/x", 1, 0.0, 0.0)], &quality_first());
        assert!(matches!(
            result,
            Err(Error::NoEligibleCandidates { total: 1, .. })
        ));
    }

    #[test]
    fn test_freshness_from_config_drops_stale() {
        let freshness = FreshnessConfig {
            stale_markers: vec!["legacy".to_string()],
            released_after: None,
        };
        let selector = CandidateSelector::from_config(&ScoringConfig::default(), Some(&freshness));
        let list = vec![
            c("openai/gpt-legacy", 2_000_000, 0.0, 0.0),
            c("google/gemini-pro", 1_000_000, 1.0, 1.0),
        ];
        let selection = selector.select(&list, &quality_first()).unwrap();
        assert_eq!(selection.primary.identifier(), "google/gemini-pro");
        assert_eq!(selection.eligible, 1);
        assert_eq!(selection.total, 2);
    }
}
