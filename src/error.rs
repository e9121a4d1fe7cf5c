//! Error types
//!
//! The page has no recoverable runtime errors beyond missing elements and bad
//! configuration; everything else is a best-effort visual effect.

use thiserror::Error;

use crate::surface::{Feature, Target};

/// A feature could not be initialized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("{feature}: required element {target} not found")]
    MissingElement { feature: Feature, target: Target },
}

/// An invalid ordered timeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("timeline has no entries")]
    Empty,
    #[error("timeline offset #{index} ({offset_ms}ms) does not come after {previous_ms}ms")]
    NotIncreasing {
        index: usize,
        previous_ms: u32,
        offset_ms: u32,
    },
}

/// Page configuration could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config timeline: {0}")]
    Timeline(#[from] TimelineError),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
