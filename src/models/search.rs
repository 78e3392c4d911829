//! Search criteria, requests and results.

use serde::{Deserialize, Serialize};

use crate::models::{PairingRequirement, StudyDocuments};
use crate::sources::SourceError;
use crate::utils::{sanitize_filename, ValidationError};

/// Label used when no search term survives sanitization
const FALLBACK_LABEL: &str = "all_studies";

/// Which fields a search filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Subject,
    Investigator,
    Both,
}

/// What to search for: a condition/subject, an investigator name, or both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    subject: Option<String>,
    investigator: Option<String>,
}

impl SearchCriteria {
    /// Build criteria from optional terms.
    ///
    /// Blank terms are treated as absent; at least one term must remain.
    pub fn new(
        subject: Option<String>,
        investigator: Option<String>,
    ) -> Result<Self, ValidationError> {
        let subject = normalize(subject);
        let investigator = normalize(investigator);

        if subject.is_none() && investigator.is_none() {
            return Err(ValidationError::MissingCriteria);
        }

        Ok(Self {
            subject,
            investigator,
        })
    }

    /// Criteria with only a subject
    pub fn subject(subject: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Some(subject.into()), None)
    }

    /// Criteria with only an investigator
    pub fn investigator(investigator: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(None, Some(investigator.into()))
    }

    pub fn subject_term(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn investigator_term(&self) -> Option<&str> {
        self.investigator.as_deref()
    }

    pub fn mode(&self) -> SearchMode {
        match (&self.subject, &self.investigator) {
            (Some(_), Some(_)) => SearchMode::Both,
            (None, Some(_)) => SearchMode::Investigator,
            _ => SearchMode::Subject,
        }
    }

    /// Directory label for these criteria.
    ///
    /// `<subject>`, `investigator_<name>` or `<subject>_investigator_<name>`,
    /// each component sanitized.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();

        if let Some(subject) = &self.subject {
            let subject = sanitize_filename(subject);
            if !subject.is_empty() {
                parts.push(subject);
            }
        }

        if let Some(investigator) = &self.investigator {
            let investigator = sanitize_filename(investigator);
            if !investigator.is_empty() {
                parts.push(format!("investigator_{}", investigator));
            }
        }

        if parts.is_empty() {
            FALLBACK_LABEL.to_string()
        } else {
            parts.join("_")
        }
    }

    /// Human description, e.g. `about 'diabetes' and by investigator 'Frank Moler'`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(subject) = &self.subject {
            parts.push(format!("about '{}'", subject));
        }
        if let Some(investigator) = &self.investigator {
            parts.push(format!("by investigator '{}'", investigator));
        }
        parts.join(" and ")
    }
}

fn normalize(term: Option<String>) -> Option<String> {
    term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Parameters for one paginated search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub criteria: SearchCriteria,
    pub requirement: PairingRequirement,

    /// Stop once this many matching studies are found
    pub target_count: usize,

    /// Studies requested per page
    pub page_size: usize,

    /// Upper bound on studies examined, if any
    pub scan_limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(criteria: SearchCriteria, requirement: PairingRequirement, target_count: usize) -> Self {
        Self {
            criteria,
            requirement,
            target_count,
            page_size: 20,
            scan_limit: None,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = Some(scan_limit);
        self
    }
}

/// Running counters for one search session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Studies retrieved from the API
    pub retrieved: usize,

    /// Studies listing at least one document
    pub with_documents: usize,

    /// Studies satisfying the pairing requirement (kept in the result)
    pub matching: usize,

    /// Page requests that returned successfully
    pub pages: usize,
}

/// Result of a search: the matches found, the counters, and the error that
/// stopped the search early, if any
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub studies: Vec<StudyDocuments>,
    pub stats: SearchStats,
    pub error: Option<SourceError>,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_requires_a_term() {
        assert_eq!(
            SearchCriteria::new(None, None),
            Err(ValidationError::MissingCriteria)
        );
        assert_eq!(
            SearchCriteria::new(Some("   ".into()), Some(String::new())),
            Err(ValidationError::MissingCriteria)
        );
    }

    #[test]
    fn test_criteria_mode() {
        assert_eq!(
            SearchCriteria::subject("diabetes").unwrap().mode(),
            SearchMode::Subject
        );
        assert_eq!(
            SearchCriteria::investigator("Frank Moler").unwrap().mode(),
            SearchMode::Investigator
        );
        assert_eq!(
            SearchCriteria::new(Some("cardiac arrest".into()), Some("Frank Moler".into()))
                .unwrap()
                .mode(),
            SearchMode::Both
        );
    }

    #[test]
    fn test_label_subject_only() {
        let criteria = SearchCriteria::subject("Diabetes Type 2").unwrap();
        assert_eq!(criteria.label(), "diabetes_type_2");
    }

    #[test]
    fn test_label_investigator_only() {
        let criteria = SearchCriteria::investigator("Frank Moler").unwrap();
        assert_eq!(criteria.label(), "investigator_frank_moler");
    }

    #[test]
    fn test_label_both() {
        let criteria =
            SearchCriteria::new(Some("cardiac arrest".into()), Some("Frank Moler".into())).unwrap();
        assert_eq!(criteria.label(), "cardiac_arrest_investigator_frank_moler");
    }

    #[test]
    fn test_label_fallback() {
        let criteria = SearchCriteria::subject("!!!").unwrap();
        assert_eq!(criteria.label(), "all_studies");
    }

    #[test]
    fn test_terms_are_trimmed() {
        let criteria = SearchCriteria::new(Some("  asthma ".into()), None).unwrap();
        assert_eq!(criteria.subject_term(), Some("asthma"));
        assert!(criteria.investigator_term().is_none());
    }

    #[test]
    fn test_describe() {
        let criteria =
            SearchCriteria::new(Some("diabetes".into()), Some("John Smith".into())).unwrap();
        assert_eq!(
            criteria.describe(),
            "about 'diabetes' and by investigator 'John Smith'"
        );
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new(
            SearchCriteria::subject("asthma").unwrap(),
            PairingRequirement::ProtocolOnly,
            3,
        )
        .page_size(0)
        .scan_limit(150);

        assert_eq!(request.page_size, 1);
        assert_eq!(request.scan_limit, Some(150));
        assert_eq!(request.target_count, 3);
    }
}
