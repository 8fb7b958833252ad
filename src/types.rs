//! Picogen API types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PicogenError, Result};

// ============ Configuration ============

/// Configuration for the Picogen client
#[derive(Debug, Clone)]
pub struct PicogenConfig {
    /// Base URL for the API
    pub api_url: String,
    /// API key sent as the `API-Token` header
    pub api_key: String,
    /// Request timeout in seconds (default: 60)
    pub timeout: Option<u64>,
    /// Number of status requests before polling gives up (default: 10)
    pub max_attempts: Option<u32>,
    /// Pause between status requests (default: 2 seconds)
    pub poll_interval: Option<Duration>,
}

impl PicogenConfig {
    /// Create a new configuration from the API URL and key
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            timeout: None,
            max_attempts: None,
            poll_interval: None,
        }
    }

    /// Load configuration from `PICOGEN_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// `PICOGEN_API_URL` and `PICOGEN_API_KEY` are required,
    /// `PICOGEN_TIMEOUT_SECS` is optional.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_url = std::env::var("PICOGEN_API_URL")
            .map_err(|_| PicogenError::InvalidConfig("PICOGEN_API_URL not set".to_string()))?;
        let api_key = std::env::var("PICOGEN_API_KEY")
            .map_err(|_| PicogenError::InvalidConfig("PICOGEN_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_url, api_key);
        if let Ok(raw) = std::env::var("PICOGEN_TIMEOUT_SECS") {
            let secs = raw.parse().map_err(|_| {
                PicogenError::InvalidConfig(format!("PICOGEN_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config = config.with_timeout(secs);
        }
        Ok(config)
    }

    /// Set a custom timeout in seconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum number of status requests per job
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the pause between status requests
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

// ============ Generation ============

/// Aspect ratio used when none is given
pub const DEFAULT_RATIO: &str = "1:1";

/// Parameters for submitting a generation job
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerateParams {
    /// Text prompt for image generation
    pub prompt: String,
    /// Aspect ratio, e.g. "1:1" or "16:9"
    pub ratio: String,
    /// Seed for reproducible output; zero counts as unset
    #[serde(skip_serializing_if = "seed_is_unset")]
    pub seed: Option<i64>,
}

fn seed_is_unset(seed: &Option<i64>) -> bool {
    matches!(seed, None | Some(0))
}

impl GenerateParams {
    /// Create new generation parameters with just a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ratio: DEFAULT_RATIO.to_string(),
            seed: None,
        }
    }

    /// Set the aspect ratio
    pub fn with_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.ratio = ratio.into();
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A submitted job, as returned by `/job/generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    /// Job identifier used for polling
    pub id: String,
    /// Credits charged for the job
    pub cost: f64,
}

// ============ Jobs ============

/// State of a job, as returned by `/job/get/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatus {
    /// Job identifier
    pub id: String,
    /// Server-side status label
    pub status: String,
    /// Opaque job parameters echoed by the server
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// Image URL once the job has finished
    #[serde(default)]
    pub result: Option<String>,
    /// Processing time in milliseconds
    pub duration_ms: i64,
    /// Creation time (epoch)
    pub created_at: i64,
}

impl JobStatus {
    /// The result URL, if the job has produced one
    pub fn image_url(&self) -> Option<&str> {
        self.result.as_deref().filter(|url| !url.is_empty())
    }

    /// True once the job has a non-empty result
    pub fn is_complete(&self) -> bool {
        self.image_url().is_some()
    }
}

// ============ Progress Events ============

/// Status carried by a progress event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Done,
    Error,
}

/// Body of a status event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusData {
    pub status: ProgressStatus,
    pub description: String,
    pub done: bool,
}

/// Event delivered to a progress sink.
///
/// Serializes as `{"type": "status", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StatusEvent {
    Status(StatusData),
}

impl StatusEvent {
    /// Create a status event
    pub fn new(description: impl Into<String>, status: ProgressStatus, done: bool) -> Self {
        StatusEvent::Status(StatusData {
            status,
            description: description.into(),
            done,
        })
    }

    /// The event body
    pub fn data(&self) -> &StatusData {
        match self {
            StatusEvent::Status(data) => data,
        }
    }
}
