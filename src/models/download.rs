//! Per-study download outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How far the downloads for one study got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// Every document the pairing requirement needs is on disk
    Complete,
    /// The protocol is on disk but a required ICF was not available
    Partial,
    /// Nothing was kept for this study
    Failed,
}

/// Result of downloading one study's documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyOutcome {
    /// 1-based position of the study in the batch
    pub index: usize,

    pub nct_id: String,
    pub brief_title: String,
    pub status: DownloadStatus,
    pub protocol_path: Option<PathBuf>,
    pub icf_path: Option<PathBuf>,

    /// Explanation for partial or failed outcomes
    pub note: Option<String>,
}

impl StudyOutcome {
    pub(crate) fn failed(
        index: usize,
        nct_id: impl Into<String>,
        brief_title: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            index,
            nct_id: nct_id.into(),
            brief_title: brief_title.into(),
            status: DownloadStatus::Failed,
            protocol_path: None,
            icf_path: None,
            note: Some(note.into()),
        }
    }

    /// Whether a protocol file was kept for this study
    pub fn is_downloaded(&self) -> bool {
        self.status != DownloadStatus::Failed && self.protocol_path.is_some()
    }

    /// `Protocol + ICF` or `Protocol only`
    pub fn composition(&self) -> &'static str {
        if self.icf_path.is_some() {
            "Protocol + ICF"
        } else {
            "Protocol only"
        }
    }
}
