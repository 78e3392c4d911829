//! Integration tests for Trial Docs
//!
//! These tests run the ClinicalTrials.gov adapter and the full pipeline
//! against a local mockito server.

use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::assert_ok;
use trial_docs::config::Config;
use trial_docs::models::{PairingRequirement, SearchCriteria};
use trial_docs::pipeline::{Orchestrator, RunOptions, MANIFEST_FILE};
use trial_docs::sources::{ClinicalTrialsSource, PageQuery, SourceError, TrialSource};
use trial_docs::ui::render_summary;
use trial_docs::utils::{HttpClient, ProgressReporter};

const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

/// Source pointed at the mock server, without pacing
fn source_for(server: &Server) -> ClinicalTrialsSource {
    let client = HttpClient::builder()
        .request_delay(Duration::ZERO)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    ClinicalTrialsSource::with_client(
        Arc::new(client),
        format!("{}/api/v2", server.url()),
        server.url(),
    )
}

fn query(condition: Option<&str>, term: Option<&str>) -> PageQuery {
    PageQuery {
        condition: condition.map(str::to_string),
        term: term.map(str::to_string),
        page_size: 20,
        page_token: None,
    }
}

fn paired_study() -> serde_json::Value {
    json!({
        "protocolSection": {
            "identificationModule": { "nctId": "NCT12345678", "briefTitle": "Test Study" }
        },
        "documentSection": {
            "largeDocumentModule": {
                "largeDocs": [
                    {
                        "typeAbbrev": "Prot_SAP",
                        "hasProtocol": true,
                        "hasSap": true,
                        "hasIcf": false,
                        "label": "Study Protocol and Statistical Analysis Plan",
                        "date": "2020-01-01",
                        "uploadDate": "2020-02-01T10:00",
                        "filename": "Prot_SAP_000.pdf",
                        "size": 1024000
                    },
                    {
                        "typeAbbrev": "ICF",
                        "hasProtocol": false,
                        "hasSap": false,
                        "hasIcf": true,
                        "label": "Informed Consent Form",
                        "filename": "ICF_001.pdf",
                        "size": 512000
                    }
                ]
            }
        }
    })
}

fn bare_study(nct_id: &str) -> serde_json::Value {
    json!({
        "protocolSection": {
            "identificationModule": { "nctId": nct_id, "briefTitle": "No documents" }
        }
    })
}

#[tokio::test]
async fn test_search_page_sends_query_params() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query.cond".into(), "diabetes".into()),
            Matcher::UrlEncoded("query.term".into(), "Frank Moler".into()),
            Matcher::UrlEncoded("pageSize".into(), "20".into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("countTotal".into(), "true".into()),
            Matcher::UrlEncoded("fields".into(), "NCTId|BriefTitle|DocumentSection".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "studies": [paired_study(), bare_study("NCT00000002")],
                "nextPageToken": "abc",
                "totalCount": 42
            })
            .to_string(),
        )
        .create_async()
        .await;

    let source = source_for(&server);
    let page = assert_ok!(
        source
            .search_page(&query(Some("diabetes"), Some("Frank Moler")))
            .await
    );

    mock.assert_async().await;
    assert_eq!(page.studies.len(), 2);
    assert_eq!(page.studies[0].nct_id(), Some("NCT12345678"));
    assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    assert_eq!(page.total_count, Some(42));
}

#[tokio::test]
async fn test_search_page_passes_token_and_detects_last_page() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "tok-2".into()))
        .with_status(200)
        .with_body(json!({ "studies": [bare_study("NCT00000003")] }).to_string())
        .create_async()
        .await;

    let source = source_for(&server);
    let mut q = query(Some("asthma"), None);
    q.page_token = Some("tok-2".into());
    let page = assert_ok!(source.search_page(&q).await);

    mock.assert_async().await;
    assert_eq!(page.studies.len(), 1);
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_search_page_server_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let result = source_for(&server)
        .search_page(&query(Some("diabetes"), None))
        .await;
    assert!(matches!(result, Err(SourceError::Api(_))));
}

#[tokio::test]
async fn test_search_page_rate_limited() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let result = source_for(&server)
        .search_page(&query(Some("diabetes"), None))
        .await;
    assert!(matches!(result, Err(SourceError::RateLimit)));
}

#[tokio::test]
async fn test_search_page_invalid_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = source_for(&server)
        .search_page(&query(Some("diabetes"), None))
        .await;
    assert!(matches!(result, Err(SourceError::Parse(_))));
}

#[tokio::test]
async fn test_download_writes_file() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ProvidedDocs/78/NCT12345678/Prot_SAP_000.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(PDF)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("protocol.pdf");
    let url = format!("{}/ProvidedDocs/78/NCT12345678/Prot_SAP_000.pdf", server.url());

    let written = assert_ok!(source_for(&server).download(&url, &dest).await);

    mock.assert_async().await;
    assert_eq!(written, PDF.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), PDF);
}

#[tokio::test]
async fn test_download_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/ProvidedDocs/00/X/missing.pdf")
        .with_status(404)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("missing.pdf");
    let url = format!("{}/ProvidedDocs/00/X/missing.pdf", server.url());

    let result = source_for(&server).download(&url, &dest).await;
    assert!(matches!(result, Err(SourceError::NotFound(_))));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_source_from_config() {
    let server = Server::new_async().await;
    let mut config = Config::default();
    config.api.base_url = format!("{}/api/v2/", server.url());
    config.api.site_url = server.url();
    config.rate_limits.request_delay_ms = 0;

    let source = assert_ok!(ClinicalTrialsSource::from_config(&config));
    assert_eq!(source.site_base_url(), server.url());

    config.api.base_url = "not a url".into();
    assert!(ClinicalTrialsSource::from_config(&config).is_err());
}

#[tokio::test]
async fn test_end_to_end_run() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::UrlEncoded("query.cond".into(), "diabetes".into()))
        .with_status(200)
        .with_body(
            json!({
                "studies": [bare_study("NCT00000001"), paired_study()],
                "totalCount": 2
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let protocol = server
        .mock("GET", "/ProvidedDocs/78/NCT12345678/Prot_SAP_000.pdf")
        .with_body(PDF)
        .create_async()
        .await;
    let icf = server
        .mock("GET", "/ProvidedDocs/78/NCT12345678/ICF_001.pdf")
        .with_body(PDF)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let options =
        RunOptions::new(SearchCriteria::subject("Diabetes").unwrap(), 1, dir.path()).unwrap();
    let progress = ProgressReporter::capturing(true);

    let report = Orchestrator::new(Arc::new(source_for(&server)), progress.clone())
        .run(&options)
        .await;

    search.assert_async().await;
    protocol.assert_async().await;
    icf.assert_async().await;

    let study_dir = dir.path().join("diabetes").join("NCT12345678");
    assert!(study_dir.join("protocol_diabetes_1.pdf").exists());
    assert!(study_dir.join("icf_diabetes_1.pdf").exists());
    assert!(progress.captured().is_empty());

    let manifest_path = dir.path().join("diabetes").join(MANIFEST_FILE);
    assert_eq!(report.manifest_path.as_deref(), Some(manifest_path.as_path()));
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["subject"], "Diabetes");
    assert_eq!(manifest["total_pairs"], 1);
    assert_eq!(
        manifest["pairs"][0]["protocol"],
        "NCT12345678/protocol_diabetes_1.pdf"
    );
    assert_eq!(
        manifest["pairs"][0]["clinicaltrials_url"],
        format!("{}/study/NCT12345678", server.url())
    );

    let summary = render_summary(&report, false);
    assert!(summary.contains("Studies retrieved from API: 2"));
    assert!(summary.contains("Studies with document sections: 1"));
    assert!(summary.contains("Studies with Protocol + ICF: 1"));
    assert!(summary.contains("Successfully downloaded: 1 document pairs"));
    assert!(summary.contains("  - NCT12345678 (Protocol + ICF)"));
}

#[tokio::test]
async fn test_end_to_end_failed_document_leaves_no_files() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "studies": [paired_study()] }).to_string())
        .create_async()
        .await;
    let _protocol = server
        .mock("GET", "/ProvidedDocs/78/NCT12345678/Prot_SAP_000.pdf")
        .with_status(503)
        .create_async()
        .await;
    let icf = server
        .mock("GET", "/ProvidedDocs/78/NCT12345678/ICF_001.pdf")
        .with_body(PDF)
        .expect(0)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let options = RunOptions::new(SearchCriteria::subject("diabetes").unwrap(), 1, dir.path())
        .unwrap()
        .requirement(PairingRequirement::ProtocolAndIcf);

    let report = Orchestrator::new(Arc::new(source_for(&server)), ProgressReporter::quiet())
        .run(&options)
        .await;

    icf.assert_async().await;
    assert!(report.is_success());
    assert_eq!(report.downloaded_count(), 0);
    assert!(report.manifest_path.is_none());
    assert!(!dir.path().join("diabetes").join("NCT12345678").exists());
    assert!(render_summary(&report, false).contains("Successfully downloaded: 0"));
}

#[tokio::test]
async fn test_end_to_end_search_failure() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/api/v2/studies")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let options =
        RunOptions::new(SearchCriteria::investigator("Frank Moler").unwrap(), 2, dir.path())
            .unwrap();

    let report = Orchestrator::new(Arc::new(source_for(&server)), ProgressReporter::quiet())
        .run(&options)
        .await;

    assert!(!report.is_success());
    assert!(report.outcomes.is_empty());
    assert_eq!(report.label, "investigator_frank_moler");
    assert!(render_summary(&report, false).contains("Search stopped early"));
}
