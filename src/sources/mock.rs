//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use crate::models::{
    DocumentSection, IdentificationModule, LargeDoc, LargeDocumentModule, ProtocolSection,
    StudyRecord,
};
use crate::sources::{PageQuery, SourceError, StudyPage, TrialSource};

/// Body written for every successful mock download
pub const MOCK_PDF: &[u8] = b"%PDF-1.4\n% mock document\n";

/// Scripted response for one page request
#[derive(Debug, Clone)]
enum PageResponse {
    Page(StudyPage),
    Fail(String),
}

/// How a scripted download fails
#[derive(Debug, Clone)]
enum DownloadFailure {
    /// Fails before anything is written
    Immediate(String),
    /// Writes these bytes, then fails
    AfterPartialWrite(Vec<u8>, String),
}

/// A mock source that replays scripted pages and downloads.
#[derive(Debug, Default)]
pub struct MockSource {
    pages: Mutex<VecDeque<PageResponse>>,
    download_failures: Mutex<HashMap<String, DownloadFailure>>,
    page_requests: Mutex<Vec<PageQuery>>,
    download_requests: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that serves `pages` in order, chaining continuation tokens.
    ///
    /// Every page but the last carries a `next_page_token`.
    pub fn with_pages(pages: Vec<Vec<StudyRecord>>) -> Self {
        let source = Self::new();
        let count = pages.len();
        for (i, studies) in pages.into_iter().enumerate() {
            let token = (i + 1 < count).then(|| format!("page-{}", i + 2));
            source.push_page(StudyPage::new(studies, token));
        }
        source
    }

    /// Queue a page response.
    pub fn push_page(&self, page: StudyPage) {
        self.lock_pages().push_back(PageResponse::Page(page));
    }

    /// Queue a transport failure for the next page request.
    pub fn push_page_failure(&self, message: impl Into<String>) {
        self.lock_pages()
            .push_back(PageResponse::Fail(message.into()));
    }

    /// Make downloads of `url` fail without writing anything.
    pub fn fail_download(&self, url: impl Into<String>, message: impl Into<String>) {
        self.lock_failures()
            .insert(url.into(), DownloadFailure::Immediate(message.into()));
    }

    /// Make downloads of `url` write `partial` bytes and then fail.
    pub fn fail_download_after(
        &self,
        url: impl Into<String>,
        partial: &[u8],
        message: impl Into<String>,
    ) {
        self.lock_failures().insert(
            url.into(),
            DownloadFailure::AfterPartialWrite(partial.to_vec(), message.into()),
        );
    }

    /// Page requests received so far.
    pub fn page_requests(&self) -> Vec<PageQuery> {
        self.page_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Download URLs requested so far.
    pub fn download_requests(&self) -> Vec<String> {
        self.download_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn lock_pages(&self) -> std::sync::MutexGuard<'_, VecDeque<PageResponse>> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, DownloadFailure>> {
        self.download_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TrialSource for MockSource {
    fn name(&self) -> &str {
        "Mock Source"
    }

    fn site_base_url(&self) -> &str {
        "https://mock.invalid"
    }

    async fn search_page(&self, query: &PageQuery) -> Result<StudyPage, SourceError> {
        if let Ok(mut requests) = self.page_requests.lock() {
            requests.push(query.clone());
        }

        match self.lock_pages().pop_front() {
            Some(PageResponse::Page(page)) => Ok(page),
            Some(PageResponse::Fail(message)) => Err(SourceError::Network(message)),
            None => Ok(StudyPage::default()),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, SourceError> {
        if let Ok(mut requests) = self.download_requests.lock() {
            requests.push(url.to_string());
        }

        let failure = self.lock_failures().get(url).cloned();
        match failure {
            Some(DownloadFailure::Immediate(message)) => Err(SourceError::Network(message)),
            Some(DownloadFailure::AfterPartialWrite(bytes, message)) => {
                tokio::fs::write(dest, &bytes).await?;
                Err(SourceError::Network(message))
            }
            None => {
                tokio::fs::write(dest, MOCK_PDF).await?;
                Ok(MOCK_PDF.len() as u64)
            }
        }
    }
}

/// Helper function to create a mock study record for testing.
///
/// `protocol` and `icf` are file names; when given, a matching `largeDocs`
/// entry is added.
pub fn make_study(
    nct_id: &str,
    title: &str,
    protocol: Option<&str>,
    icf: Option<&str>,
) -> StudyRecord {
    let mut docs = Vec::new();

    if let Some(filename) = protocol {
        docs.push(LargeDoc {
            type_abbrev: Some("Prot".to_string()),
            label: Some("Study Protocol".to_string()),
            has_protocol: true,
            filename: Some(filename.to_string()),
            ..LargeDoc::default()
        });
    }

    if let Some(filename) = icf {
        docs.push(LargeDoc {
            type_abbrev: Some("ICF".to_string()),
            label: Some("Informed Consent Form".to_string()),
            has_icf: true,
            filename: Some(filename.to_string()),
            ..LargeDoc::default()
        });
    }

    make_study_with_docs(nct_id, title, docs)
}

/// Helper function to create a mock study record with arbitrary documents.
pub fn make_study_with_docs(nct_id: &str, title: &str, docs: Vec<LargeDoc>) -> StudyRecord {
    let document_section = (!docs.is_empty()).then(|| DocumentSection {
        large_document_module: Some(LargeDocumentModule { large_docs: docs }),
    });

    StudyRecord {
        protocol_section: Some(ProtocolSection {
            identification_module: Some(IdentificationModule {
                nct_id: Some(nct_id.to_string()),
                brief_title: Some(title.to_string()),
            }),
        }),
        document_section,
    }
}
