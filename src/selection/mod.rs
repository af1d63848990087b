//! Candidate scoring and selection.
//!
//! This module ranks a fetched candidate list against role requirements:
//! - Hard filtering on context capacity, average cost and (optionally) freshness
//! - Per-axis scoring (quality, speed, cost) through a pluggable strategy
//! - Primary/fallback selection with provider diversity

mod candidate;
pub mod freshness;
mod requirements;
pub mod scoring;
mod selector;

pub use candidate::{Candidate, CandidateRecord, ScoredCandidate, Scores};
pub use freshness::{Freshness, FreshnessStrategy, MarkerFreshness};
pub use requirements::{Requirements, SizeCategory, Weights};
pub use scoring::{cost_score, AxisScores, LexicalScoring, ScoringStrategy};
pub use selector::{CandidateSelector, Selection, SelectionWarning};
