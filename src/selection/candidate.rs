//! Candidate records as fetched from a model catalog.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw catalog record, as exchanged with collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub identifier: String,
    #[serde(default)]
    pub context_capacity: u64,
    #[serde(default)]
    pub input_cost: f64,
    #[serde(default)]
    pub output_cost: f64,
}

/// A selectable model with its capacity and price attributes.
///
/// Prices are per million tokens. A `context_capacity` of 0 means the
/// catalog did not report one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    identifier: String,
    provider: String,
    context_capacity: u64,
    input_cost: f64,
    output_cost: f64,
}

impl Candidate {
    /// Validate and build a candidate from an `<provider>/<name>` identifier.
    pub fn new(
        identifier: impl Into<String>,
        context_capacity: u64,
        input_cost: f64,
        output_cost: f64,
    ) -> Result<Self> {
        let identifier = identifier.into();
        let invalid = |reason: &str| Error::InvalidCandidate {
            identifier: identifier.clone(),
            reason: reason.to_string(),
        };

        let (provider, name) = identifier
            .split_once('/')
            .ok_or_else(|| invalid("identifier must be <provider>/<name>"))?;
        if provider.is_empty() || name.is_empty() {
            return Err(invalid("identifier has an empty provider or name"));
        }
        for (side, cost) in [("input", input_cost), ("output", output_cost)] {
            if !cost.is_finite() || cost < 0.0 {
                return Err(invalid(&format!("{} cost {} is not a valid price", side, cost)));
            }
        }

        let provider = provider.to_string();
        Ok(Self {
            identifier,
            provider,
            context_capacity,
            input_cost,
            output_cost,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Namespace before the first `/` of the identifier.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Everything after the first `/` of the identifier.
    pub fn name(&self) -> &str {
        &self.identifier[self.provider.len() + 1..]
    }

    pub fn context_capacity(&self) -> u64 {
        self.context_capacity
    }

    pub fn input_cost(&self) -> f64 {
        self.input_cost
    }

    pub fn output_cost(&self) -> f64 {
        self.output_cost
    }

    pub fn average_cost(&self) -> f64 {
        (self.input_cost + self.output_cost) / 2.0
    }
}

impl TryFrom<CandidateRecord> for Candidate {
    type Error = Error;

    fn try_from(record: CandidateRecord) -> Result<Self> {
        Candidate::new(
            record.identifier,
            record.context_capacity,
            record.input_cost,
            record.output_cost,
        )
    }
}

impl From<&Candidate> for CandidateRecord {
    fn from(candidate: &Candidate) -> Self {
        Self {
            identifier: candidate.identifier.clone(),
            context_capacity: candidate.context_capacity,
            input_cost: candidate.input_cost,
            output_cost: candidate.output_cost,
        }
    }
}

/// Per-axis and composite scores, each in [0, 1] for normalized weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub quality: f64,
    pub speed: f64,
    pub cost: f64,
    pub total: f64,
}

/// A candidate together with the scores computed for one selection call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub scores: Scores,
}

impl ScoredCandidate {
    pub fn identifier(&self) -> &str {
        self.candidate.identifier()
    }

    pub fn provider(&self) -> &str {
        self.candidate.provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_split_on_first_slash() {
        let c = Candidate::new("meta-llama/llama-3/instruct", 8192, 0.1, 0.2).unwrap();
        assert_eq!(c.provider(), "meta-llama");
        assert_eq!(c.name(), "llama-3/instruct");
    }

    #[test]
    fn test_average_cost() {
        let c = Candidate::new("a/x", 200_000, 15.0, 75.0).unwrap();
        assert_eq!(c.average_cost(), 45.0);
    }

    #[test]
    fn test_missing_slash_rejected() {
        let result = Candidate::new("gpt-4o", 128_000, 1.0, 2.0);
        assert!(matches!(result, Err(Error::InvalidCandidate { .. })));
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert!(Candidate::new("/model", 1, 0.0, 0.0).is_err());
        assert!(Candidate::new("provider/", 1, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_negative_or_nan_cost_rejected() {
        assert!(Candidate::new("a/x", 1, -1.0, 0.0).is_err());
        assert!(Candidate::new("a/x", 1, 0.0, f64::NAN).is_err());
        assert!(Candidate::new("a/x", 1, f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_record_uses_camel_case() {
        let json = r#"{"identifier":"b/y","contextCapacity":128000,"inputCost":10,"outputCost":30}"#;
        let record: CandidateRecord = serde_json::from_str(json).unwrap();
        let candidate = Candidate::try_from(record).unwrap();
        assert_eq!(candidate.context_capacity(), 128_000);
        assert_eq!(candidate.output_cost(), 30.0);
    }

    #[test]
    fn test_record_missing_attributes_default_to_zero() {
        let record: CandidateRecord = serde_json::from_str(r#"{"identifier":"c/z"}"#).unwrap();
        let candidate = Candidate::try_from(record).unwrap();
        assert_eq!(candidate.context_capacity(), 0);
        assert_eq!(candidate.average_cost(), 0.0);
    }
}
