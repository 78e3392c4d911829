//! ClinicalTrials.gov source implementation using the v2 REST API.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::models::StudyRecord;
use crate::sources::{PageQuery, SourceError, StudyPage, TrialSource};
use crate::utils::{validate_url, HttpClient};

/// ClinicalTrials.gov v2 API base URL
pub const CLINICALTRIALS_API_BASE: &str = "https://clinicaltrials.gov/api/v2";

/// Public site, also the host of uploaded documents
pub const CLINICALTRIALS_SITE: &str = "https://clinicaltrials.gov";

/// Fields requested for every study; the document section is all we classify
const STUDY_FIELDS: &str = "NCTId|BriefTitle|DocumentSection";

/// ClinicalTrials.gov research registry
#[derive(Debug, Clone)]
pub struct ClinicalTrialsSource {
    client: Arc<HttpClient>,
    api_base: String,
    site_base: String,
}

impl ClinicalTrialsSource {
    /// Create a source against the public API with default pacing
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::new()?),
            CLINICALTRIALS_API_BASE,
            CLINICALTRIALS_SITE,
        ))
    }

    /// Create with a custom HTTP client and base URLs (for testing)
    pub fn with_client(
        client: Arc<HttpClient>,
        api_base: impl Into<String>,
        site_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            site_base: site_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let api_base =
            validate_url(&config.api.base_url).map_err(|e| SourceError::Api(e.to_string()))?;
        let site_base =
            validate_url(&config.api.site_url).map_err(|e| SourceError::Api(e.to_string()))?;

        let client = HttpClient::builder()
            .user_agent(config.api.user_agent.clone())
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .request_delay(Duration::from_millis(config.rate_limits.request_delay_ms))
            .build()?;

        Ok(Self::with_client(Arc::new(client), api_base, site_base))
    }

    fn studies_url(&self) -> String {
        format!("{}/studies", self.api_base)
    }

    /// Query string for one page request
    fn build_params(query: &PageQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("pageSize", query.page_size.to_string()),
            ("fields", STUDY_FIELDS.to_string()),
            ("countTotal", "true".to_string()),
        ];

        if let Some(condition) = &query.condition {
            params.push(("query.cond", condition.clone()));
        }

        // Investigator names live in ResponsibleParty, OverallOfficial and
        // contact fields, which only the free-text query reaches.
        if let Some(term) = &query.term {
            params.push(("query.term", term.clone()));
        }

        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.clone()));
        }

        params
    }

    fn check_status(status: StatusCode, what: &str) -> Result<(), SourceError> {
        if status.is_success() {
            return Ok(());
        }

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimit,
            StatusCode::NOT_FOUND => SourceError::NotFound(what.to_string()),
            _ => SourceError::Api(format!(
                "ClinicalTrials.gov returned status {} for {}",
                status, what
            )),
        })
    }
}

#[async_trait]
impl TrialSource for ClinicalTrialsSource {
    fn name(&self) -> &str {
        "ClinicalTrials.gov"
    }

    fn site_base_url(&self) -> &str {
        &self.site_base
    }

    async fn search_page(&self, query: &PageQuery) -> Result<StudyPage, SourceError> {
        let url = self.studies_url();
        let params = Self::build_params(query);

        tracing::debug!(
            url = %url,
            page_token = query.page_token.as_deref().unwrap_or("-"),
            page_size = query.page_size,
            "requesting study page"
        );

        let response = self
            .client
            .send(self.client.get(&url).query(&params))
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search ClinicalTrials.gov: {}", e)))?;

        Self::check_status(response.status(), "study search")?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        let data: StudiesResponse = serde_json::from_str(&body)?;

        Ok(StudyPage {
            studies: data.studies,
            next_page_token: data.next_page_token.filter(|t| !t.is_empty()),
            total_count: data.total_count,
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, SourceError> {
        tracing::debug!(url = %url, dest = %dest.display(), "downloading document");

        let mut response = self
            .client
            .send(self.client.get(url).header(ACCEPT, "application/pdf, */*"))
            .await
            .map_err(|e| SourceError::Network(format!("Failed to download document: {}", e)))?;

        Self::check_status(response.status(), url)?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read document: {}", e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

/// Response envelope of `GET /studies`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiesResponse {
    #[serde(default)]
    studies: Vec<StudyRecord>,

    #[serde(default)]
    next_page_token: Option<String>,

    #[serde(default)]
    total_count: Option<u64>,
}
