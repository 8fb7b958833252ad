//! Picogen API client

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ErrorPayload, PicogenError, Result};
use crate::progress::Progress;
use crate::types::*;

const DEFAULT_TIMEOUT: u64 = 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const USER_AGENT: &str = concat!("picogen-rust/", env!("CARGO_PKG_VERSION"));

/// Picogen API client
///
/// # Example
///
/// ```no_run
/// use picogen::{GenerateParams, Picogen, PicogenConfig, Progress};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Picogen::with_config(
///         PicogenConfig::new("https://picogen.example", "pg_xxx"),
///         Progress::silent(),
///     )?;
///
///     let job = client.submit_job(GenerateParams::new("A lighthouse at dusk")).await?;
///     let status = client.poll_job(&job.id).await?;
///
///     println!("Image URL: {:?}", status.result);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Picogen {
    api_key: String,
    api_url: String,
    client: Client,
    max_attempts: u32,
    poll_interval: Duration,
    progress: Progress,
}

/// Where the poll loop stands between two steps
#[derive(Debug)]
enum PollState {
    /// About to send status request number `attempt` (1-based)
    Requesting { attempt: u32 },
    /// Request `attempt` did not produce a result but may be retried
    Retryable { attempt: u32 },
    Succeeded(JobStatus),
    Failed(PicogenError),
}

impl Picogen {
    /// Create a new client, validating the configuration
    ///
    /// # Errors
    ///
    /// Returns `PicogenError::InvalidConfig` if the URL is not an absolute
    /// http(s) URL, the API key is empty, or `max_attempts` is zero.
    pub fn with_config(config: PicogenConfig, progress: Progress) -> Result<Self> {
        let api_url = config.api_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&api_url).map_err(|e| {
            PicogenError::InvalidConfig(format!("api_url '{}' is not a valid URL: {}", api_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PicogenError::InvalidConfig(format!(
                "api_url '{}' must use http or https",
                api_url
            )));
        }

        if config.api_key.is_empty() {
            return Err(PicogenError::InvalidConfig("api_key is empty".to_string()));
        }

        let max_attempts = config.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(PicogenError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT)))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            api_key: config.api_key,
            api_url,
            client,
            max_attempts,
            poll_interval: config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            progress,
        })
    }

    // ============ Jobs ============

    /// Submit a prompt with the default ratio and no seed
    pub async fn generate(&self, prompt: impl Into<String>) -> Result<GenerateResponse> {
        self.submit_job(GenerateParams::new(prompt)).await
    }

    /// Submit a generation job.
    ///
    /// Failures are reported to the progress sink and returned; nothing is
    /// retried here.
    pub async fn submit_job(&self, params: GenerateParams) -> Result<GenerateResponse> {
        self.progress.in_progress("Generating job").await;

        match self
            .post_first::<GenerateResponse, _>("/job/generate", &params)
            .await
        {
            Ok(response) => {
                tracing::info!(job_id = %response.id, cost = response.cost, "Job generated");
                self.progress.done("Job generated").await;
                Ok(response)
            }
            Err(e) => {
                let description = match &e {
                    PicogenError::Http { payload, .. } => format!("Error generating job: {}", payload),
                    other => format!("Error generating job: {}", other),
                };
                tracing::error!("{}", description);
                self.progress.error(description).await;
                Err(e)
            }
        }
    }

    /// Poll a job until it has a result.
    ///
    /// HTTP failures and missing results are retried up to the attempt cap,
    /// sleeping between requests. Any other failure aborts at once.
    /// There is no pause after the final attempt.
    pub async fn poll_job(&self, job_id: &str) -> Result<JobStatus> {
        let mut state = PollState::Requesting { attempt: 1 };

        loop {
            state = match state {
                PollState::Requesting { attempt } => self.poll_once(job_id, attempt).await,
                PollState::Retryable { attempt } if attempt < self.max_attempts => {
                    tokio::time::sleep(self.poll_interval).await;
                    PollState::Requesting {
                        attempt: attempt + 1,
                    }
                }
                PollState::Retryable { attempt } => {
                    tracing::error!(job_id, attempts = attempt, "Job not completed");
                    PollState::Failed(PicogenError::Exhausted {
                        job_id: job_id.to_string(),
                        attempts: attempt,
                    })
                }
                PollState::Succeeded(status) => return Ok(status),
                PollState::Failed(e) => return Err(e),
            };
        }
    }

    async fn poll_once(&self, job_id: &str, attempt: u32) -> PollState {
        self.progress.in_progress(format!("Getting job {}", job_id)).await;

        match self.get_first::<JobStatus>(&format!("/job/get/{}", job_id)).await {
            Ok(status) if status.is_complete() => {
                tracing::info!(job_id, attempt, "Job retrieved");
                self.progress.done(format!("Job {} retrieved", job_id)).await;
                PollState::Succeeded(status)
            }
            Ok(status) => {
                tracing::debug!(job_id, attempt, status = %status.status, "Job has no result yet");
                if attempt < self.max_attempts {
                    self.progress
                        .in_progress(format!("Retrying get job {}", job_id))
                        .await;
                }
                PollState::Retryable { attempt }
            }
            Err(PicogenError::Http { status, payload }) => {
                tracing::warn!(job_id, attempt, status, "Error getting job: {}", payload);
                self.progress
                    .error(format!("Error getting job: {}", payload))
                    .await;
                PollState::Retryable { attempt }
            }
            Err(e) => {
                tracing::error!(job_id, attempt, "Error getting job: {}", e);
                self.progress.error(format!("Error getting job: {}", e)).await;
                PollState::Failed(PicogenError::Aborted {
                    job_id: job_id.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    // ============ Internal Methods ============

    async fn get_first<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_first(reqwest::Method::GET, path, None::<&()>)
            .await
    }

    async fn post_first<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request_first(reqwest::Method::POST, path, Some(body))
            .await
    }

    /// Send one request and return the first usable record of the JSON array
    /// the API answers with
    async fn request_first<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        tracing::debug!("Sending {} request to Picogen: {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("API-Token", &self.api_key)
            .header("Content-Type", "application/json");

        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(http_failure(status.as_u16(), response.text().await));
        }

        let text = response.text().await?;

        first_record(&text).ok_or_else(|| PicogenError::EmptyResponse {
            endpoint: path.to_string(),
        })?
    }
}

/// Builds the error for a non-2xx response. An unreadable body still counts
/// as an HTTP failure so polling keeps retrying it.
fn http_failure(status: u16, body: reqwest::Result<String>) -> PicogenError {
    let payload = match body {
        Ok(text) => ErrorPayload::from_body(&text),
        Err(e) => {
            tracing::warn!(status, "Failed to read error body: {}", e);
            ErrorPayload(serde_json::Value::Null)
        }
    };
    PicogenError::Http { status, payload }
}

/// Picks the first entry of a JSON array that is neither null nor empty.
///
/// Returns `None` when there is no such entry.
fn first_record<T: DeserializeOwned>(text: &str) -> Option<Result<T>> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(records) => records,
        Err(e) => return Some(Err(e.into())),
    };

    records
        .into_iter()
        .find(|record| !is_blank(record))
        .map(|record| serde_json::from_value(record).map_err(PicogenError::from))
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
