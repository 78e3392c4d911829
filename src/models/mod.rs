//! Core data models for clinical-trial studies, searches and downloads.

mod download;
mod record;
mod search;
mod study;

pub use download::{DownloadStatus, StudyOutcome};
pub use record::{
    DocumentSection, IdentificationModule, LargeDoc, LargeDocumentModule, ProtocolSection,
    StudyRecord,
};
pub use search::{SearchCriteria, SearchMode, SearchOutcome, SearchRequest, SearchStats};
pub use study::{DocumentInfo, DocumentKind, PairingRequirement, StudyDocuments};
