//! # Picogen
//!
//! Chat-assistant tool for the Picogen image generation API.
//!
//! ## Quick Start
//!
//! ```no_run
//! use picogen::{PicogenConfig, PicogenTool};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tool = PicogenTool::new(PicogenConfig::new("https://picogen.example", "pg_xxx"));
//!
//!     // Either the image URL or "Error generating image: ..."
//!     let answer = tool.generate_image("A beautiful sunset over mountains", None).await;
//!     println!("{}", answer);
//! }
//! ```
//!
//! ## Progress Events
//!
//! Hosts that show progress pass a sink. Any
//! `tokio::sync::mpsc::UnboundedSender<StatusEvent>` works, as does a closure
//! wrapped in [`FnSink`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use picogen::{PicogenConfig, PicogenTool, StatusEvent};
//!
//! # async fn example() {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<StatusEvent>();
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         println!("{}", serde_json::to_string(&event).unwrap());
//!     }
//! });
//!
//! let tool = PicogenTool::new(PicogenConfig::new("https://picogen.example", "pg_xxx"));
//! let answer = tool.generate_image("A lighthouse at dusk", Some(Arc::new(tx))).await;
//! # }
//! ```
//!
//! ## Lower-level Client
//!
//! ```no_run
//! use picogen::{GenerateParams, Picogen, PicogenConfig, PicogenError, Progress};
//!
//! # async fn example() -> picogen::Result<()> {
//! let client = Picogen::with_config(
//!     PicogenConfig::new("https://picogen.example", "pg_xxx").with_max_attempts(20),
//!     Progress::silent(),
//! )?;
//!
//! let job = client
//!     .submit_job(GenerateParams::new("A castle").with_ratio("16:9").with_seed(42))
//!     .await?;
//!
//! match client.poll_job(&job.id).await {
//!     Ok(status) => println!("Image: {}", status.image_url().unwrap_or_default()),
//!     Err(PicogenError::Exhausted { attempts, .. }) => {
//!         eprintln!("Gave up after {} attempts", attempts);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod progress;
mod tool;
mod types;

// Re-export main types
pub use client::Picogen;
pub use error::{ErrorPayload, PicogenError, Result};
pub use progress::{FnSink, Progress, ProgressSink};
pub use tool::PicogenTool;
pub use types::{
    // Configuration
    PicogenConfig,
    // Generation
    GenerateParams,
    GenerateResponse,
    DEFAULT_RATIO,
    // Jobs
    JobStatus,
    // Progress
    ProgressStatus,
    StatusData,
    StatusEvent,
};
