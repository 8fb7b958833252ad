//! Assistant-facing `generate_image` tool

use std::sync::Arc;

use serde_json::{json, Value};

use crate::client::Picogen;
use crate::error::{PicogenError, Result};
use crate::progress::{Progress, ProgressSink};
use crate::types::PicogenConfig;

const ERROR_PREFIX: &str = "Error generating image";

/// The image generation tool a chat assistant calls.
///
/// Every invocation builds its own client; nothing is shared between calls.
#[derive(Debug, Clone)]
pub struct PicogenTool {
    config: PicogenConfig,
}

impl PicogenTool {
    pub fn new(config: PicogenConfig) -> Self {
        Self { config }
    }

    /// Build the tool from `PICOGEN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(PicogenConfig::from_env()?))
    }

    pub fn config(&self) -> &PicogenConfig {
        &self.config
    }

    /// True if `answer` is an error message from [`generate_image`](Self::generate_image)
    pub fn is_error(answer: &str) -> bool {
        answer
            .strip_prefix(ERROR_PREFIX)
            .is_some_and(|rest| rest.starts_with(": "))
    }

    /// Function-calling description shown to the model
    pub fn schema() -> Value {
        json!({
            "name": "generate_image",
            "description": "Generate an image using Picogen. Returns the generated image url.",
            "parameters": {
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The prompt to generate an image from."
                    }
                },
                "required": ["prompt"]
            }
        })
    }

    /// Generate an image and return its URL.
    ///
    /// Never fails: any error is returned as a message starting with
    /// `"Error generating image: "`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use picogen::{PicogenConfig, PicogenTool};
    ///
    /// # async fn example() {
    /// let tool = PicogenTool::new(PicogenConfig::new("https://picogen.example", "pg_xxx"));
    /// let answer = tool.generate_image("A red fox in the snow", None).await;
    /// println!("{}", answer);
    /// # }
    /// ```
    pub async fn generate_image(
        &self,
        prompt: &str,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> String {
        match self.run(prompt, Progress::new(sink)).await {
            Ok(url) => url,
            Err(PicogenError::Http { payload, .. }) => format!("{}: {}", ERROR_PREFIX, payload),
            Err(e) => format!("{}: {}", ERROR_PREFIX, e),
        }
    }

    async fn run(&self, prompt: &str, progress: Progress) -> Result<String> {
        let service = Picogen::with_config(self.config.clone(), progress)?;

        let job = service.generate(prompt).await?;
        let status = service.poll_job(&job.id).await?;

        // poll_job only succeeds once the result is non-empty
        Ok(status.result.unwrap_or_default())
    }
}
