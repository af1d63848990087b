//! Optional staleness filtering.
//!
//! Catalogs carry no reliable release metadata, so freshness is a separate,
//! pluggable strategy. The selector only consults one when configured.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::scoring::name_tokens;
use super::Candidate;
use crate::config::FreshnessConfig;

/// Outcome of a freshness assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Evidence the candidate is current.
    Current,
    /// Stale, with the reason it was judged so.
    Stale(String),
    /// No evidence either way. Passes the filter.
    Unknown,
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale(_))
    }
}

/// Judges whether a candidate is too old to select.
///
/// Implementations must be deterministic: no wall clock, no I/O.
pub trait FreshnessStrategy: Send + Sync {
    fn assess(&self, candidate: &Candidate) -> Freshness;
}

/// Runs of digits joined by single dashes, e.g. `20241022` or `2024-10-22`.
fn digit_group_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]+(?:-[0-9]+)*")
            .unwrap_or_else(|e| unreachable!("digit group pattern is valid: {e}"))
    })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    if !year.starts_with("20") {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Full date stamps within one digit group. A stamp is either a whole
/// eight-digit part or three consecutive parts of four, two and two digits.
fn stamps_in_group(group: &str) -> Vec<NaiveDate> {
    let parts: Vec<&str> = group.split('-').collect();
    let compact = parts
        .iter()
        .filter(|p| p.len() == 8)
        .filter_map(|p| ymd(&p[..4], &p[4..6], &p[6..]));
    let dashed = parts.windows(3).filter_map(|w| match w {
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => ymd(y, m, d),
        _ => None,
    });
    compact.chain(dashed).collect()
}

/// Marks candidates stale on configured name markers or an old date stamp.
#[derive(Debug, Clone)]
pub struct MarkerFreshness {
    stale_markers: HashSet<String>,
    released_after: Option<NaiveDate>,
}

impl MarkerFreshness {
    pub fn new<I, S>(stale_markers: I, released_after: Option<NaiveDate>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stale_markers: stale_markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
            released_after,
        }
    }

    pub fn from_config(config: &FreshnessConfig) -> Self {
        Self::new(&config.stale_markers, config.released_after)
    }

    /// Latest valid date stamp embedded in a name.
    fn date_stamp(name: &str) -> Option<NaiveDate> {
        digit_group_regex()
            .find_iter(name)
            .flat_map(|group| stamps_in_group(group.as_str()))
            .max()
    }
}

impl FreshnessStrategy for MarkerFreshness {
    fn assess(&self, candidate: &Candidate) -> Freshness {
        let name = candidate.name();
        if let Some(marker) = name_tokens(name).find(|t| self.stale_markers.contains(t)) {
            return Freshness::Stale(format!("name carries stale marker '{}'", marker));
        }

        match Self::date_stamp(name) {
            Some(stamp) => match self.released_after {
                Some(cutoff) if stamp < cutoff => Freshness::Stale(format!(
                    "date stamp {} predates {}",
                    stamp, cutoff
                )),
                _ => Freshness::Current,
            },
            None => Freshness::Unknown,
        }
    }
}
