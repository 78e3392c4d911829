//! Paginated search for studies that satisfy a pairing requirement.

use std::sync::Arc;

use crate::classifier::classify_study;
use crate::models::{PairingRequirement, SearchOutcome, SearchRequest};
use crate::sources::{PageQuery, TrialSource};
use crate::utils::{validate_nct_id, ProgressReporter};

/// Drives the search endpoint page by page and keeps the matching studies.
///
/// Matches stop accumulating exactly at the target count, but the page on
/// which the target is reached is still counted in full in the statistics.
/// No page is requested after the target is met.
#[derive(Debug, Clone)]
pub struct Searcher {
    source: Arc<dyn TrialSource>,
    progress: ProgressReporter,
}

impl Searcher {
    pub fn new(source: Arc<dyn TrialSource>, progress: ProgressReporter) -> Self {
        Self { source, progress }
    }

    /// Run the search.
    ///
    /// A failed page request ends the search; whatever was found before the
    /// failure is returned together with the error.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        if request.target_count == 0 {
            return outcome;
        }

        let site_base = self.source.site_base_url().to_string();
        let mut page_token: Option<String> = None;

        loop {
            let page_size = match request.scan_limit {
                Some(limit) => {
                    let remaining = limit.saturating_sub(outcome.stats.retrieved);
                    if remaining == 0 {
                        tracing::debug!(limit, "scan limit reached");
                        break;
                    }
                    request.page_size.min(remaining)
                }
                None => request.page_size,
            };

            let query = PageQuery::for_criteria(&request.criteria, page_size, page_token.take());

            let page = match self.source.search_page(&query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        source = self.source.name(),
                        retrieved = outcome.stats.retrieved,
                        "search aborted: {}",
                        e
                    );
                    self.progress
                        .line(format!("  Error searching studies: {}", e));
                    outcome.error = Some(e);
                    break;
                }
            };

            if page.studies.is_empty() {
                self.progress.line("  No more studies found.");
                break;
            }

            outcome.stats.pages += 1;
            if let Some(total) = page.total_count {
                tracing::debug!(total, "registry reported total hits");
            }

            for record in &page.studies {
                let study = classify_study(record, &site_base);
                outcome.stats.retrieved += 1;

                if study.has_any_document() {
                    outcome.stats.with_documents += 1;
                }

                if outcome.studies.len() < request.target_count
                    && request.requirement.is_satisfied_by(&study)
                {
                    if let Err(e) = validate_nct_id(&study.nct_id) {
                        tracing::warn!(title = %study.brief_title, "skipping study: {}", e);
                        continue;
                    }
                    tracing::debug!(nct_id = %study.nct_id, "study matches requirement");
                    outcome.studies.push(study);
                    outcome.stats.matching += 1;
                }
            }

            self.progress.line(format!(
                "  Searching... (retrieved {} so far, {} matching)",
                outcome.stats.retrieved, outcome.stats.matching
            ));

            if outcome.studies.len() >= request.target_count {
                break;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        self.report(&outcome, request.requirement);
        outcome
    }

    fn report(&self, outcome: &SearchOutcome, requirement: PairingRequirement) {
        let stats = &outcome.stats;
        tracing::debug!(
            retrieved = stats.retrieved,
            with_documents = stats.with_documents,
            matching = stats.matching,
            pages = stats.pages,
            "search finished"
        );

        self.progress
            .line(format!("  Retrieved {} studies total", stats.retrieved));
        self.progress.line(format!(
            "  {} studies have document sections",
            stats.with_documents
        ));
        self.progress.line(match requirement {
            PairingRequirement::ProtocolAndIcf => format!(
                "  Found {} studies with both Protocol and ICF documents",
                stats.matching
            ),
            PairingRequirement::ProtocolOnly => format!(
                "  Found {} studies with Protocol documents",
                stats.matching
            ),
        });
    }
}
