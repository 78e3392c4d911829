//! Input validation and filename sanitization.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Must provide at least one of --subject or --investigator")]
    MissingCriteria,

    #[error("Number of pairs must be at least 1")]
    InvalidPairCount,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid study identifier: {0:?}")]
    InvalidStudyId(String),
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9_\-\s]").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("valid regex"))
}

fn nct_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^NCT\d{8}$").expect("valid regex"))
}

/// Check that a registry identifier has the `NCT` + 8 digits form.
///
/// The identifier becomes a directory name, so anything else (empty, path
/// separators, `..`) is rejected.
pub fn validate_nct_id(id: &str) -> Result<&str, ValidationError> {
    if nct_id_pattern().is_match(id) {
        Ok(id)
    } else {
        Err(ValidationError::InvalidStudyId(id.to_string()))
    }
}

/// Turn a search term into a safe path component.
///
/// Lowercases, drops anything outside `[a-z0-9_-]` and whitespace, replaces
/// whitespace runs with a single underscore, collapses repeated underscores
/// and strips leading/trailing underscores. The result is stable under
/// repeated application.
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_lowercase();
    let kept = disallowed_chars().replace_all(&lowered, "");
    let joined = whitespace_runs().replace_all(kept.trim(), "_");
    let collapsed = underscore_runs().replace_all(&joined, "_");
    collapsed.trim_matches('_').to_string()
}

/// Validate a base URL taken from configuration
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("empty URL".to_string()));
    }

    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(url.trim_end_matches('/').to_string()),
        other => Err(ValidationError::InvalidUrl(format!(
            "invalid scheme: {}",
            other
        ))),
    }
}
