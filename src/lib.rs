//! modelscout - Dynamic LLM model selection over a live model catalog
//!
//! This library scores catalog candidates on quality, speed and cost
//! against role requirements and returns a primary/fallback pair, with the
//! fallback drawn from a different provider whenever possible.

pub mod catalog;
pub mod config;
pub mod error;
pub mod scout;
pub mod selection;

pub use config::Config;
pub use error::{Error, Result};
pub use scout::ModelScout;
pub use selection::{Candidate, CandidateSelector, Requirements, Selection, Weights};
