//! # Songforge Common Library
//!
//! Shared code for the songforge pipeline and its delivery layer:
//! - Error taxonomy and the recovered-vs-fatal severity policy
//! - Pipeline event types and EventBus
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;

pub use config::PipelineConfig;
pub use error::{DegradedReason, Error, Result, Severity, TaxonomyCode};
pub use events::{EventBus, PipelineEvent, RunState};
