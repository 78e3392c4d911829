//! Classify a study record's uploaded documents into Protocol and ICF.
//!
//! This is the only place that interprets the registry's document tags. The
//! registry describes each uploaded file three ways: boolean `hasProtocol` /
//! `hasIcf` flags, a long `label` ("Study Protocol and Statistical Analysis
//! Plan"), and a short `typeAbbrev` made of `_`-joined tokens (`Prot_SAP_ICF`).
//! A file counts as a type if any of the three says so, so a combined file can
//! be both the protocol and the ICF.

use crate::models::{DocumentInfo, DocumentKind, LargeDoc, StudyDocuments, StudyRecord};

/// Placeholder for records without identification data
pub const UNKNOWN: &str = "Unknown";

/// Classify one study record.
///
/// The first document of each type wins. Documents without a file name are
/// skipped since there is nothing to download.
pub fn classify_study(record: &StudyRecord, site_base: &str) -> StudyDocuments {
    let nct_id = record
        .nct_id()
        .filter(|id| !id.is_empty())
        .unwrap_or(UNKNOWN);
    let brief_title = record.brief_title().unwrap_or(UNKNOWN);

    let docs = record.large_docs();
    let mut study = StudyDocuments::new(nct_id, brief_title);
    study.listed_documents = docs.len();

    for doc in docs {
        let Some(filename) = doc.filename.as_deref().filter(|f| !f.is_empty()) else {
            tracing::trace!(nct_id, "skipping document without filename");
            continue;
        };

        if study.protocol.is_none() && is_kind(doc, DocumentKind::Protocol) {
            study.protocol = Some(document_info(doc, DocumentKind::Protocol, nct_id, filename, site_base));
        }

        if study.icf.is_none() && is_kind(doc, DocumentKind::Icf) {
            study.icf = Some(document_info(doc, DocumentKind::Icf, nct_id, filename, site_base));
        }
    }

    study
}

/// Download URL for an uploaded document.
///
/// Documents live under `/ProvidedDocs/<last two chars of the NCT id>/<NCT id>/`.
pub fn document_url(site_base: &str, nct_id: &str, filename: &str) -> String {
    let suffix = if nct_id.len() >= 2 && nct_id.is_char_boundary(nct_id.len() - 2) {
        &nct_id[nct_id.len() - 2..]
    } else {
        "00"
    };

    format!(
        "{}/ProvidedDocs/{}/{}/{}",
        site_base.trim_end_matches('/'),
        suffix,
        nct_id,
        urlencoding::encode(filename)
    )
}

/// Public study page link
pub fn study_url(site_base: &str, nct_id: &str) -> String {
    format!("{}/study/{}", site_base.trim_end_matches('/'), nct_id)
}

fn is_kind(doc: &LargeDoc, kind: DocumentKind) -> bool {
    let flagged = match kind {
        DocumentKind::Protocol => doc.has_protocol,
        DocumentKind::Icf => doc.has_icf,
    };

    flagged
        || doc
            .label
            .as_deref()
            .is_some_and(|label| label.to_lowercase().contains(&kind.label().to_lowercase()))
        || doc.type_abbrev.as_deref().is_some_and(|abbrev| {
            abbrev
                .split('_')
                .any(|token| token.eq_ignore_ascii_case(kind.abbrev()))
        })
}

fn document_info(
    doc: &LargeDoc,
    kind: DocumentKind,
    nct_id: &str,
    filename: &str,
    site_base: &str,
) -> DocumentInfo {
    DocumentInfo {
        kind,
        filename: filename.to_string(),
        size: doc.size,
        url: document_url(site_base, nct_id, filename),
        type_abbrev: doc.type_abbrev.clone().unwrap_or_default(),
    }
}
