//! Role requirements: axis weights, hard constraints and descriptive hints.

use serde::{Deserialize, Serialize};

use super::Candidate;
use crate::error::{Error, Result};

/// Relative priorities of the three scoring axes.
///
/// Weights are multipliers; they are expected to sum to roughly 1.0 but
/// this is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub quality: f64,
    pub speed: f64,
    pub cost: f64,
}

impl Weights {
    pub fn new(quality: f64, speed: f64, cost: f64) -> Result<Self> {
        let weights = Self {
            quality,
            speed,
            cost,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [
            ("quality", self.quality),
            ("speed", self.speed),
            ("cost", self.cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidRequirements(format!(
                    "{} weight must be a non-negative number, got {}",
                    axis, value
                )));
            }
        }
        Ok(())
    }
}

/// Repository size hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    Enterprise,
}

impl SizeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
            SizeCategory::Enterprise => "enterprise",
        }
    }
}

/// What a caller needs from the selected candidates.
///
/// `languages` and `size` describe the workload for upstream filtering of
/// the candidate source; they never affect scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub weights: Weights,
    #[serde(default)]
    pub min_context_capacity: Option<u64>,
    #[serde(default)]
    pub max_average_cost: Option<f64>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub size: Option<SizeCategory>,
}

impl Requirements {
    pub fn new(weights: Weights) -> Self {
        Self {
            weights,
            min_context_capacity: None,
            max_average_cost: None,
            languages: Vec::new(),
            size: None,
        }
    }

    pub fn with_min_context_capacity(mut self, min: u64) -> Self {
        self.min_context_capacity = Some(min);
        self
    }

    pub fn with_max_average_cost(mut self, max: f64) -> Self {
        self.max_average_cost = Some(max);
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, size: SizeCategory) -> Self {
        self.size = Some(size);
        self
    }

    /// Whether a candidate passes the hard constraints.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        if let Some(min) = self.min_context_capacity {
            if candidate.context_capacity() < min {
                return false;
            }
        }
        if let Some(max) = self.max_average_cost {
            if candidate.average_cost() > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> Weights {
        Weights::new(0.7, 0.1, 0.2).unwrap()
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(matches!(
            Weights::new(-0.1, 0.5, 0.5),
            Err(Error::InvalidRequirements(_))
        ));
        assert!(Weights::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_unnormalized_weights_allowed() {
        assert!(Weights::new(7.0, 1.0, 2.0).is_ok());
        assert!(Weights::new(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_admits_without_constraints() {
        let req = Requirements::new(weights());
        let c = Candidate::new("a/x", 0, 500.0, 500.0).unwrap();
        assert!(req.admits(&c));
    }

    #[test]
    fn test_admits_bounds_are_inclusive() {
        let req = Requirements::new(weights())
            .with_min_context_capacity(128_000)
            .with_max_average_cost(20.0);
        let exact = Candidate::new("b/y", 128_000, 10.0, 30.0).unwrap();
        assert!(req.admits(&exact));

        let small = Candidate::new("b/small", 127_999, 10.0, 30.0).unwrap();
        assert!(!req.admits(&small));

        let pricey = Candidate::new("b/pricey", 128_000, 10.0, 30.5).unwrap();
        assert!(!req.admits(&pricey));
    }

    #[test]
    fn test_hints_do_not_filter() {
        let req = Requirements::new(weights())
            .with_languages(["rust", "typescript"])
            .with_size(SizeCategory::Enterprise);
        let c = Candidate::new("a/x", 1, 0.0, 0.0).unwrap();
        assert!(req.admits(&c));
        assert_eq!(req.languages.len(), 2);
        assert_eq!(req.size.map(|s| s.as_str()), Some("enterprise"));
    }
}
