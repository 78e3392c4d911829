//! The search → download → manifest workflow.
//!
//! Everything here is strictly sequential: one request is in flight at a time
//! and pacing is left to the [`TrialSource`](crate::sources::TrialSource).

mod download;
mod manifest;
mod orchestrator;
mod search;

pub use download::{document_path, Downloader};
pub use manifest::{Manifest, ManifestEntry, ManifestError, MANIFEST_FILE};
pub use orchestrator::{Orchestrator, RunOptions, RunReport};
pub use search::Searcher;
