//! `manifest.json` describing a completed download run.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::study_url;
use crate::models::{PairingRequirement, SearchCriteria, StudyOutcome};

/// File name of the manifest inside the label directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors that can occur while writing the manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write manifest: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// RFC 3339 timestamp of the run
    pub download_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigator: Option<String>,

    pub pairing: PairingRequirement,
    pub total_pairs: usize,
    pub pairs: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub nct_id: String,
    pub brief_title: String,

    /// Path relative to the label directory
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icf: Option<String>,

    pub clinicaltrials_url: String,
}

impl Manifest {
    /// Build a manifest from the downloaded studies of a run.
    ///
    /// Failed outcomes are left out. Paths are stored relative to `label_dir`.
    pub fn build(
        criteria: &SearchCriteria,
        requirement: PairingRequirement,
        outcomes: &[StudyOutcome],
        label_dir: &Path,
        site_base: &str,
    ) -> Self {
        let pairs: Vec<ManifestEntry> = outcomes
            .iter()
            .filter(|o| o.is_downloaded())
            .filter_map(|o| {
                let protocol = o.protocol_path.as_deref()?;
                Some(ManifestEntry {
                    nct_id: o.nct_id.clone(),
                    brief_title: o.brief_title.clone(),
                    protocol: relative(protocol, label_dir),
                    icf: o.icf_path.as_deref().map(|p| relative(p, label_dir)),
                    clinicaltrials_url: study_url(site_base, &o.nct_id),
                })
            })
            .collect();

        Self {
            download_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            subject: criteria.subject_term().map(str::to_string),
            investigator: criteria.investigator_term().map(str::to_string),
            pairing: requirement,
            total_pairs: pairs.len(),
            pairs,
        }
    }

    /// Write the manifest as pretty JSON into `dir`, returning its path
    pub async fn write(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!(path = %path.display(), pairs = self.total_pairs, "manifest written");
        Ok(path)
    }
}

fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadStatus;
    use tempfile::TempDir;

    fn outcome(index: usize, nct_id: &str, label_dir: &Path, icf: bool) -> StudyOutcome {
        let study_dir = label_dir.join(nct_id);
        StudyOutcome {
            index,
            nct_id: nct_id.to_string(),
            brief_title: format!("Study {}", index),
            status: if icf {
                DownloadStatus::Complete
            } else {
                DownloadStatus::Partial
            },
            protocol_path: Some(study_dir.join(format!("protocol_asthma_{}.pdf", index))),
            icf_path: icf.then(|| study_dir.join(format!("icf_asthma_{}.pdf", index))),
            note: None,
        }
    }

    #[test]
    fn test_build_skips_failures() {
        let label_dir = Path::new("/data/out/asthma");
        let criteria = SearchCriteria::subject("asthma").unwrap();
        let outcomes = vec![
            outcome(1, "NCT00000001", label_dir, true),
            StudyOutcome::failed(2, "NCT00000002", "Broken", "refused"),
            outcome(3, "NCT00000003", label_dir, false),
        ];

        let manifest = Manifest::build(
            &criteria,
            PairingRequirement::ProtocolAndIcf,
            &outcomes,
            label_dir,
            "https://clinicaltrials.gov",
        );

        assert_eq!(manifest.total_pairs, 2);
        assert_eq!(manifest.subject.as_deref(), Some("asthma"));
        assert!(manifest.investigator.is_none());

        let first = &manifest.pairs[0];
        assert_eq!(first.protocol, "NCT00000001/protocol_asthma_1.pdf");
        assert_eq!(first.icf.as_deref(), Some("NCT00000001/icf_asthma_1.pdf"));
        assert_eq!(
            first.clinicaltrials_url,
            "https://clinicaltrials.gov/study/NCT00000001"
        );
        assert!(manifest.pairs[1].icf.is_none());
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let label_dir = dir.path().join("investigator_frank_moler");
        let criteria = SearchCriteria::investigator("Frank Moler").unwrap();
        let outcomes = vec![outcome(1, "NCT00000001", &label_dir, true)];

        let manifest = Manifest::build(
            &criteria,
            PairingRequirement::ProtocolAndIcf,
            &outcomes,
            &label_dir,
            "https://clinicaltrials.gov",
        );
        let path = manifest.write(&label_dir).await.unwrap();

        assert_eq!(path, label_dir.join(MANIFEST_FILE));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["investigator"], "Frank Moler");
        assert!(json.get("subject").is_none());
        assert_eq!(json["pairing"], "protocol_and_icf");
        assert_eq!(json["total_pairs"], 1);
        assert_eq!(json["pairs"][0]["nct_id"], "NCT00000001");
        assert!(chrono::DateTime::parse_from_rfc3339(json["download_date"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_write_creates_missing_label_dir() {
        let dir = TempDir::new().unwrap();
        let label_dir = dir.path().join("nested").join("asthma");
        let criteria = SearchCriteria::subject("asthma").unwrap();
        let outcomes = vec![outcome(1, "NCT00000001", &label_dir, false)];

        let manifest = Manifest::build(
            &criteria,
            PairingRequirement::ProtocolOnly,
            &outcomes,
            &label_dir,
            "https://clinicaltrials.gov",
        );
        let path = manifest.write(&label_dir).await.unwrap();

        assert!(path.exists());
        let parsed: Manifest =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }
}
