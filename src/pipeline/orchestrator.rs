//! One complete run: search, download, manifest.

use std::path::PathBuf;
use std::sync::Arc;

use crate::models::{
    PairingRequirement, SearchCriteria, SearchRequest, SearchStats, StudyOutcome,
};
use crate::pipeline::{Downloader, Manifest, Searcher};
use crate::sources::TrialSource;
use crate::ui::{status_icon, Status};
use crate::utils::{ProgressReporter, ValidationError};

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub criteria: SearchCriteria,

    /// Number of studies to download
    pub pairs: usize,

    /// Root of the output tree; documents land in `<output_dir>/<label>/`
    pub output_dir: PathBuf,

    pub requirement: PairingRequirement,
    pub page_size: usize,

    /// Matches searched for per requested pair, to cover failed downloads
    pub search_multiplier: usize,

    /// Studies examined per searched match before giving up
    pub scan_multiplier: usize,

    pub write_manifest: bool,
}

impl RunOptions {
    pub fn new(
        criteria: SearchCriteria,
        pairs: usize,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ValidationError> {
        if pairs == 0 {
            return Err(ValidationError::InvalidPairCount);
        }

        Ok(Self {
            criteria,
            pairs,
            output_dir: output_dir.into(),
            requirement: PairingRequirement::default(),
            page_size: 20,
            search_multiplier: 2,
            scan_multiplier: 50,
            write_manifest: true,
        })
    }

    pub fn requirement(mut self, requirement: PairingRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn multipliers(mut self, search: usize, scan: usize) -> Self {
        self.search_multiplier = search.max(1);
        self.scan_multiplier = scan.max(1);
        self
    }

    pub fn write_manifest(mut self, write_manifest: bool) -> Self {
        self.write_manifest = write_manifest;
        self
    }

    /// Matching studies the search looks for
    pub fn search_target(&self) -> usize {
        self.pairs.saturating_mul(self.search_multiplier)
    }

    /// Upper bound on studies examined
    pub fn scan_limit(&self) -> usize {
        self.search_target().saturating_mul(self.scan_multiplier)
    }
}

/// Everything the summary needs to know about a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub criteria: SearchCriteria,
    pub requirement: PairingRequirement,
    pub pairs_requested: usize,
    pub label: String,
    pub output_dir: PathBuf,
    pub label_dir: PathBuf,
    pub stats: SearchStats,
    pub outcomes: Vec<StudyOutcome>,

    /// Error that stopped the search early
    pub search_error: Option<String>,

    pub manifest_path: Option<PathBuf>,
}

impl RunReport {
    /// Studies with a protocol on disk, in download order
    pub fn downloaded(&self) -> impl Iterator<Item = &StudyOutcome> {
        self.outcomes.iter().filter(|o| o.is_downloaded())
    }

    pub fn downloaded_count(&self) -> usize {
        self.downloaded().count()
    }

    /// The search ran to completion
    pub fn is_success(&self) -> bool {
        self.search_error.is_none()
    }
}

/// Wires the searcher, downloader and manifest writer together
#[derive(Debug, Clone)]
pub struct Orchestrator {
    source: Arc<dyn TrialSource>,
    progress: ProgressReporter,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn TrialSource>, progress: ProgressReporter) -> Self {
        Self { source, progress }
    }

    pub async fn run(&self, options: &RunOptions) -> RunReport {
        let label = options.criteria.label();
        let label_dir = options.output_dir.join(&label);
        let requirement = options.requirement;

        tracing::info!(
            label = %label,
            pairs = options.pairs,
            target = options.search_target(),
            scan_limit = options.scan_limit(),
            "starting run"
        );

        self.progress.line(format!(
            "\nSearching for studies {} with {}...",
            options.criteria.describe(),
            match requirement {
                PairingRequirement::ProtocolAndIcf => "both Protocol and ICF documents",
                PairingRequirement::ProtocolOnly => "Protocol documents",
            }
        ));

        let request = SearchRequest::new(
            options.criteria.clone(),
            requirement,
            options.search_target(),
        )
        .page_size(options.page_size)
        .scan_limit(options.scan_limit());

        let search = Searcher::new(self.source.clone(), self.progress.clone())
            .search(&request)
            .await;

        let outcomes = if search.studies.is_empty() {
            self.progress.line(match requirement {
                PairingRequirement::ProtocolAndIcf => "No studies found with both document types.",
                PairingRequirement::ProtocolOnly => "No studies found with protocol documents.",
            });
            Vec::new()
        } else {
            Downloader::new(self.source.clone(), self.progress.clone())
                .limit(options.pairs)
                .download_pairs(&search.studies, &options.output_dir, &label, requirement)
                .await
        };

        let manifest_path = if options.write_manifest && outcomes.iter().any(|o| o.is_downloaded())
        {
            let manifest = Manifest::build(
                &options.criteria,
                requirement,
                &outcomes,
                &label_dir,
                self.source.site_base_url(),
            );
            match manifest.write(&label_dir).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(dir = %label_dir.display(), "{}", e);
                    self.progress
                        .line(format!("  {} {}", status_icon(Status::Warning), e));
                    None
                }
            }
        } else {
            None
        };

        RunReport {
            criteria: options.criteria.clone(),
            requirement,
            pairs_requested: options.pairs,
            label,
            output_dir: options.output_dir.clone(),
            label_dir,
            stats: search.stats,
            outcomes,
            search_error: search.error.map(|e| e.to_string()),
            manifest_path,
        }
    }
}
