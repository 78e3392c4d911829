//! # Trial Docs
//!
//! Download paired Protocol and Informed Consent Form (ICF) documents for
//! clinical trials registered on ClinicalTrials.gov.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (StudyRecord, StudyDocuments, SearchCriteria, etc.)
//! - [`sources`]: The registry seam ([`TrialSource`]) and its ClinicalTrials.gov and mock implementations
//! - [`classifier`]: Turns a raw study record into its Protocol/ICF documents
//! - [`pipeline`]: Paginated search, downloads, manifest and the run orchestrator
//! - [`utils`]: Paced HTTP client, progress output and filename sanitization
//! - [`config`]: Configuration management
//! - [`ui`]: Banner, status icons and the run summary

pub mod classifier;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{PairingRequirement, SearchCriteria, StudyDocuments};
pub use pipeline::{Orchestrator, RunOptions, RunReport};
pub use sources::{ClinicalTrialsSource, TrialSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
