//! Sequential document downloads with cleanup of partial results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::{
    DocumentInfo, DocumentKind, DownloadStatus, PairingRequirement, StudyDocuments, StudyOutcome,
};
use crate::sources::{SourceError, TrialSource};
use crate::ui::{status_icon, Status};
use crate::utils::{validate_nct_id, ProgressReporter};

/// Title characters shown in per-study progress lines
const TITLE_PREVIEW_CHARS: usize = 60;

/// Downloads the protocol (and ICF) of each study into
/// `<output_root>/<label>/<NCT id>/`.
#[derive(Debug, Clone)]
pub struct Downloader {
    source: Arc<dyn TrialSource>,
    progress: ProgressReporter,
    limit: Option<usize>,
}

impl Downloader {
    pub fn new(source: Arc<dyn TrialSource>, progress: ProgressReporter) -> Self {
        Self {
            source,
            progress,
            limit: None,
        }
    }

    /// Stop once this many studies have a downloaded protocol
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Download documents for each study in order.
    ///
    /// A failed study never aborts the batch. The returned outcomes cover
    /// every study that was attempted.
    pub async fn download_pairs(
        &self,
        studies: &[StudyDocuments],
        output_root: &Path,
        label: &str,
        requirement: PairingRequirement,
    ) -> Vec<StudyOutcome> {
        let label_dir = output_root.join(label);
        let total = self.limit.unwrap_or(studies.len());
        let mut outcomes = Vec::with_capacity(studies.len().min(total));
        let mut downloaded = 0usize;

        for (i, study) in studies.iter().enumerate() {
            if self.limit.is_some_and(|limit| downloaded >= limit) {
                break;
            }

            let title: String = study.brief_title.chars().take(TITLE_PREVIEW_CHARS).collect();
            self.progress.line(format!(
                "\n[{}/{}] {}: {}...",
                downloaded + 1,
                total,
                study.nct_id,
                title
            ));

            let outcome = self
                .download_study(i + 1, study, &label_dir, label, requirement)
                .await;

            if outcome.is_downloaded() {
                downloaded += 1;
            }
            outcomes.push(outcome);
        }

        tracing::debug!(
            attempted = outcomes.len(),
            downloaded,
            "download batch finished"
        );
        outcomes
    }

    async fn download_study(
        &self,
        index: usize,
        study: &StudyDocuments,
        label_dir: &Path,
        label: &str,
        requirement: PairingRequirement,
    ) -> StudyOutcome {
        let Some(protocol) = &study.protocol else {
            self.fail_line();
            return StudyOutcome::failed(
                index,
                &study.nct_id,
                &study.brief_title,
                "No protocol document listed",
            );
        };

        let study_dir = match validate_nct_id(&study.nct_id) {
            Ok(id) => label_dir.join(id),
            Err(e) => {
                tracing::warn!(title = %study.brief_title, "refusing to download: {}", e);
                self.fail_line();
                return StudyOutcome::failed(index, &study.nct_id, &study.brief_title, e.to_string());
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(&study_dir).await {
            tracing::warn!(dir = %study_dir.display(), "cannot create study directory: {}", e);
            self.fail_line();
            return StudyOutcome::failed(
                index,
                &study.nct_id,
                &study.brief_title,
                format!("Cannot create {}: {}", study_dir.display(), e),
            );
        }

        let protocol_path = document_path(&study_dir, DocumentKind::Protocol, label, index);
        if let Err(e) = self.fetch(protocol, &protocol_path).await {
            remove_partial(&protocol_path).await;
            remove_dir_if_empty(&study_dir).await;
            self.fail_line();
            return StudyOutcome::failed(
                index,
                &study.nct_id,
                &study.brief_title,
                format!("Protocol download failed: {}", e),
            );
        }

        let mut outcome = StudyOutcome {
            index,
            nct_id: study.nct_id.clone(),
            brief_title: study.brief_title.clone(),
            status: DownloadStatus::Complete,
            protocol_path: Some(protocol_path.clone()),
            icf_path: None,
            note: None,
        };

        match &study.icf {
            Some(icf) => {
                let icf_path = document_path(&study_dir, DocumentKind::Icf, label, index);
                match self.fetch(icf, &icf_path).await {
                    Ok(_) => outcome.icf_path = Some(icf_path),
                    Err(e) => {
                        remove_partial(&icf_path).await;
                        if requirement.requires_icf() {
                            remove_partial(&protocol_path).await;
                            remove_dir_if_empty(&study_dir).await;
                            self.fail_line();
                            return StudyOutcome::failed(
                                index,
                                &study.nct_id,
                                &study.brief_title,
                                format!("ICF download failed: {}", e),
                            );
                        }
                        outcome.note = Some(format!("ICF download failed: {}", e));
                    }
                }
            }
            None if requirement.requires_icf() => {
                self.progress.line("  Note: No ICF document available");
                outcome.status = DownloadStatus::Partial;
                outcome.note = Some("No ICF document available".to_string());
            }
            None => {}
        }

        let what = if outcome.icf_path.is_some() {
            "pair"
        } else {
            "protocol"
        };
        self.progress.line(format!(
            "  {} Successfully downloaded {}",
            status_icon(Status::Success),
            what
        ));

        outcome
    }

    async fn fetch(&self, doc: &DocumentInfo, dest: &Path) -> Result<u64, SourceError> {
        self.progress
            .line(format!("  Downloading {}: {}", doc.kind, doc.filename));

        match self.source.download(&doc.url, dest).await {
            Ok(bytes) => {
                tracing::debug!(url = %doc.url, bytes, "document saved");
                Ok(bytes)
            }
            Err(e) => {
                tracing::warn!(url = %doc.url, kind = %doc.kind, "download failed: {}", e);
                self.progress
                    .line(format!("    Error downloading {}: {}", doc.filename, e));
                Err(e)
            }
        }
    }

    fn fail_line(&self) {
        self.progress
            .line(format!("  {} Failed to download", status_icon(Status::Error)));
    }
}

/// `<study_dir>/<kind>_<label>_<index>.pdf`
pub fn document_path(study_dir: &Path, kind: DocumentKind, label: &str, index: usize) -> PathBuf {
    study_dir.join(format!("{}_{}_{}.pdf", kind.file_prefix(), label, index))
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "cannot remove partial download: {}", e),
    }
}

async fn remove_dir_if_empty(dir: &Path) {
    let empty = match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    };

    if empty {
        if let Err(e) = tokio::fs::remove_dir(dir).await {
            tracing::debug!(dir = %dir.display(), "cannot remove empty directory: {}", e);
        }
    }
}
