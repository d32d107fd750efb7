//! Error taxonomy for the song-assembly pipeline
//!
//! Every condition the pipeline can surface maps to exactly one
//! [`TaxonomyCode`], and the recovered-vs-fatal decision is made in one
//! place: [`TaxonomyCode::severity`]. The orchestrator consults that
//! table instead of hard-coding the policy per component.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable taxonomy codes surfaced to the delivery layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomyCode {
    /// Empty or invalid lyrics, rejected before the pipeline starts
    Input,
    /// Mood classification failed; run continued with neutral fallback
    AnalysisDegraded,
    /// Music generation failed; run continued with generic backing track
    GenerationDegraded,
    /// Voice synthesis failed; run aborted
    Synthesis,
    /// Duration/format reconciliation impossible; run aborted
    Mixing,
    /// Temporary or artifact storage unavailable; run aborted
    Resource,
}

/// Whether a taxonomy code aborts the run or is absorbed into metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recorded in result metadata; the run continues
    Recovered,
    /// Aborts the run; all resources released, no artifact produced
    Fatal,
}

impl TaxonomyCode {
    /// The single policy table classifying each code.
    pub fn severity(self) -> Severity {
        match self {
            TaxonomyCode::Input => Severity::Fatal,
            TaxonomyCode::AnalysisDegraded => Severity::Recovered,
            TaxonomyCode::GenerationDegraded => Severity::Recovered,
            TaxonomyCode::Synthesis => Severity::Fatal,
            TaxonomyCode::Mixing => Severity::Fatal,
            TaxonomyCode::Resource => Severity::Fatal,
        }
    }

    /// Stable string form for logs and API payloads
    pub fn as_str(self) -> &'static str {
        match self {
            TaxonomyCode::Input => "INPUT_ERROR",
            TaxonomyCode::AnalysisDegraded => "ANALYSIS_DEGRADED",
            TaxonomyCode::GenerationDegraded => "GENERATION_DEGRADED",
            TaxonomyCode::Synthesis => "SYNTHESIS_ERROR",
            TaxonomyCode::Mixing => "MIXING_ERROR",
            TaxonomyCode::Resource => "RESOURCE_ERROR",
        }
    }
}

/// Fatal pipeline errors.
///
/// Recovered conditions never travel as `Error`; they are recorded as
/// [`DegradedReason`] in the run metadata instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid lyrics or request parameters
    #[error("Invalid input: {0}")]
    Input(String),

    /// Voice synthesis provider failed (no fallback exists for vocals)
    #[error("Voice synthesis failed: {0}")]
    Synthesis(String),

    /// Mixing could not reconcile the tracks
    #[error("Mixing failed: {0}")]
    Mixing(String),

    /// Temporary or artifact storage unavailable
    #[error("Resource error: {0}")]
    Resource(String),

    /// I/O operation error (storage paths, scratch files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Run cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// Taxonomy code surfaced to the caller.
    ///
    /// I/O and configuration failures are storage/environment problems
    /// from the caller's point of view and map to `Resource`, as does
    /// cooperative cancellation (the run released its resources and
    /// produced nothing).
    pub fn code(&self) -> TaxonomyCode {
        match self {
            Error::Input(_) => TaxonomyCode::Input,
            Error::Synthesis(_) => TaxonomyCode::Synthesis,
            Error::Mixing(_) => TaxonomyCode::Mixing,
            Error::Resource(_) | Error::Io(_) | Error::Config(_) | Error::Cancelled => {
                TaxonomyCode::Resource
            }
        }
    }
}

/// Recovered degradations carried in run metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Mood classifier failed or timed out; neutral profile used
    AnalysisFallback,
    /// Music provider failed twice; generic backing track used
    GenerationFallback,
}

impl DegradedReason {
    pub fn code(self) -> TaxonomyCode {
        match self {
            DegradedReason::AnalysisFallback => TaxonomyCode::AnalysisDegraded,
            DegradedReason::GenerationFallback => TaxonomyCode::GenerationDegraded,
        }
    }
}
