//! HTTP client utilities.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;

use super::RequestPacer;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (Research Tool)"
);

/// Shared HTTP client that paces every request it sends
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    pacer: Arc<RequestPacer>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    /// Start configuring a client
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, pacer: RequestPacer) -> Self {
        Self {
            client,
            pacer: Arc::new(pacer),
        }
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// Begin a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a request once the pacer admits it
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        self.pacer.ready().await;
        request.send().await
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    user_agent: String,
    timeout: Duration,
    request_delay: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            request_delay: super::pacer::DEFAULT_REQUEST_DELAY,
        }
    }
}

impl HttpClientBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Spacing between consecutive requests; zero disables pacing
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(self.user_agent)
            .default_headers(headers)
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(HttpClient::from_client(
            Arc::new(client),
            RequestPacer::new(self.request_delay),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let builder = HttpClient::builder();
        assert_eq!(builder.timeout, Duration::from_secs(30));
        assert_eq!(builder.request_delay, Duration::from_millis(1500));
        assert!(builder.user_agent.starts_with("trial-docs/"));
    }

    #[test]
    fn test_build_without_delay() {
        let client = HttpClient::builder()
            .request_delay(Duration::ZERO)
            .build()
            .unwrap();
        assert!(!client.pacer().is_enabled());
    }

    #[test]
    fn test_build_with_delay() {
        let client = HttpClient::builder()
            .request_delay(Duration::from_millis(250))
            .timeout(Duration::from_secs(5))
            .user_agent("custom/1.0")
            .build()
            .unwrap();
        assert!(client.pacer().is_enabled());
        assert_eq!(client.pacer().interval(), Duration::from_millis(250));
    }
}
