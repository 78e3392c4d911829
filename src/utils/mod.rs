//! Utility modules supporting searches and downloads.
//!
//! - [`HttpClient`]: reqwest client that paces every request
//! - [`RequestPacer`]: fixed-interval pacing built on `governor`
//! - [`ProgressReporter`]: user-facing progress lines, silenced by `--quiet`
//! - [`sanitize_filename`]: turn search terms into safe path components
//!
//! # Pacing
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use trial_docs::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::builder()
//!     .request_delay(Duration::from_millis(1500))
//!     .build()?;
//! let response = client.send(client.get("https://clinicaltrials.gov/api/v2/version")).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

mod http;
mod pacer;
mod progress;
mod validate;

pub use http::{HttpClient, HttpClientBuilder, DEFAULT_USER_AGENT};
pub use pacer::{RequestPacer, DEFAULT_REQUEST_DELAY};
pub use progress::ProgressReporter;
pub use validate::{sanitize_filename, validate_nct_id, validate_url, ValidationError};
