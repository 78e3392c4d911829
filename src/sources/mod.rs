//! Registry adapters.
//!
//! The [`TrialSource`] trait is the seam between the search/download pipeline
//! and the outside world. [`ClinicalTrialsSource`] talks to the ClinicalTrials.gov
//! v2 REST API; [`MockSource`] replays scripted pages for tests.
//!
//! Implementations are expected to pace their own requests (see
//! [`crate::utils::RequestPacer`]); callers issue one request at a time and
//! never retry.

mod clinicaltrials;
pub mod mock;

pub use clinicaltrials::{ClinicalTrialsSource, CLINICALTRIALS_API_BASE, CLINICALTRIALS_SITE};
pub use mock::MockSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{SearchCriteria, SearchMode, StudyRecord};

/// One page request against the study search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// Condition/disease filter (`query.cond`)
    pub condition: Option<String>,

    /// Free-text filter used for investigator names (`query.term`)
    pub term: Option<String>,

    pub page_size: usize,

    /// Continuation token from the previous page
    pub page_token: Option<String>,
}

impl PageQuery {
    /// Query for `criteria`: the subject filters on condition, the
    /// investigator goes through the free-text term.
    pub fn for_criteria(
        criteria: &SearchCriteria,
        page_size: usize,
        page_token: Option<String>,
    ) -> Self {
        let subject = criteria.subject_term().map(str::to_string);
        let investigator = criteria.investigator_term().map(str::to_string);

        let (condition, term) = match criteria.mode() {
            SearchMode::Subject => (subject, None),
            SearchMode::Investigator => (None, investigator),
            SearchMode::Both => (subject, investigator),
        };

        Self {
            condition,
            term,
            page_size,
            page_token,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyPage {
    pub studies: Vec<StudyRecord>,

    /// Token for the next page; `None` once the results are exhausted
    pub next_page_token: Option<String>,

    /// Total hits reported by the registry, when requested
    pub total_count: Option<u64>,
}

impl StudyPage {
    pub fn new(studies: Vec<StudyRecord>, next_page_token: Option<String>) -> Self {
        Self {
            studies,
            next_page_token,
            total_count: None,
        }
    }
}

/// A registry of clinical-trial studies and their uploaded documents
#[async_trait]
pub trait TrialSource: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Base URL of the public site, used to build document and study links
    fn site_base_url(&self) -> &str;

    /// Fetch one page of studies
    async fn search_page(&self, query: &PageQuery) -> Result<StudyPage, SourceError>;

    /// Stream the document at `url` into `dest`, returning the bytes written.
    ///
    /// On failure `dest` may hold a partial file; removing it is the caller's job.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Document or study not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
