//! Terminal output: status icons, the banner and the run summary.
//!
//! Rendering functions return strings so the summary can be asserted in tests;
//! color is applied only when asked for (normally when stdout is a terminal).

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;

use crate::models::PairingRequirement;
use crate::pipeline::{RunOptions, RunReport};

const RULE_WIDTH: usize = 60;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
    }
}

/// Color `text` according to `status` when `color` is set.
pub fn paint(status: Status, text: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }

    match status {
        Status::Success => text.green().bold().to_string(),
        Status::Error => text.red().bold().to_string(),
        Status::Warning => text.yellow().bold().to_string(),
    }
}

fn rule(color: bool) -> String {
    let line = "=".repeat(RULE_WIDTH);
    if color {
        line.dimmed().to_string()
    } else {
        line
    }
}

fn heading(title: &str, color: bool) -> String {
    let title = if color {
        title.bold().to_string()
    } else {
        title.to_string()
    };
    format!("{}\n{}\n{}", rule(color), title, rule(color))
}

fn display_dir(path: &Path) -> String {
    let shown = path.display().to_string();
    if shown.ends_with('/') {
        shown
    } else {
        format!("{}/", shown)
    }
}

/// Banner printed before a run.
pub fn render_banner(options: &RunOptions, color: bool) -> String {
    let mut lines = vec![heading("ClinicalTrials.gov Document Pair Downloader", color)];

    if let Some(subject) = options.criteria.subject_term() {
        lines.push(format!("Subject: {}", subject));
    }
    if let Some(investigator) = options.criteria.investigator_term() {
        lines.push(format!("Investigator: {}", investigator));
    }
    lines.push(format!("Pairs requested: {}", options.pairs));
    lines.push(format!("Documents: {}", options.requirement.describe()));
    lines.push(format!("Output directory: {}", options.output_dir.display()));

    lines.join("\n")
}

/// Final summary of a run. Printed regardless of `--quiet`.
pub fn render_summary(report: &RunReport, color: bool) -> String {
    let stats = &report.stats;
    let mut lines = vec![String::new(), heading("Summary", color)];

    lines.push(format!("Studies retrieved from API: {}", stats.retrieved));
    lines.push(format!(
        "Studies with document sections: {}",
        stats.with_documents
    ));
    lines.push(format!(
        "Studies with {}: {}",
        report.requirement.describe(),
        stats.matching
    ));

    if let Some(error) = &report.search_error {
        lines.push(format!(
            "{} Search stopped early: {}",
            paint(Status::Warning, status_icon(Status::Warning), color),
            error
        ));
    }

    let downloaded: Vec<_> = report.downloaded().collect();

    if downloaded.is_empty() {
        lines.push("Successfully downloaded: 0".to_string());
        lines.push(String::new());
        lines.push("No documents were downloaded. This could be due to:".to_string());
        lines.push("  - No studies found matching the search criteria".to_string());
        lines.push("  - Network issues during download".to_string());
        lines.push("  - Rate limiting by the API".to_string());
        lines.push("Try a different search term or try again later.".to_string());
        return lines.join("\n");
    }

    let unit = match report.requirement {
        PairingRequirement::ProtocolAndIcf => "document pairs",
        PairingRequirement::ProtocolOnly => "protocol documents",
    };
    lines.push(format!(
        "Successfully downloaded: {} {}",
        paint(Status::Success, &downloaded.len().to_string(), color),
        unit
    ));
    if downloaded.len() < report.pairs_requested {
        lines.push(format!(
            "{} Only {} of {} requested studies were downloaded",
            paint(Status::Warning, status_icon(Status::Warning), color),
            downloaded.len(),
            report.pairs_requested
        ));
    }

    lines.push(String::new());
    lines.push(format!("Documents saved to: {}", display_dir(&report.label_dir)));
    if let Some(manifest) = &report.manifest_path {
        lines.push(format!("Manifest: {}", manifest.display()));
    }

    lines.push(String::new());
    lines.push("Downloaded studies:".to_string());
    for outcome in downloaded {
        lines.push(format!("  - {} ({})", outcome.nct_id, outcome.composition()));
    }

    let failed = report.outcomes.len() - report.downloaded_count();
    if failed > 0 {
        lines.push(format!(
            "{} {} studies could not be downloaded",
            paint(Status::Error, status_icon(Status::Error), color),
            failed
        ));
    }

    lines.join("\n")
}
