use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use picogen::{PicogenConfig, PicogenTool, ProgressStatus, StatusEvent};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "picogen")]
#[command(about = "Generate an image with Picogen and print its URL")]
struct CliArgs {
    /// Text prompt to generate an image from.
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// API base URL (overrides PICOGEN_API_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// API key (overrides PICOGEN_API_KEY).
    #[arg(long)]
    api_key: Option<String>,
}

fn resolve_config(args: &CliArgs) -> picogen::Result<PicogenConfig> {
    match (&args.api_url, &args.api_key) {
        (Some(url), Some(key)) => Ok(PicogenConfig::new(url, key)),
        _ => {
            let mut config = PicogenConfig::from_env()?;
            if let Some(url) = &args.api_url {
                config.api_url = url.clone();
            }
            if let Some(key) = &args.api_key {
                config.api_key = key.clone();
            }
            Ok(config)
        }
    }
}

fn log_event(event: &StatusEvent) {
    let data = event.data();
    match data.status {
        ProgressStatus::InProgress => info!("{}", data.description),
        ProgressStatus::Done => info!("{} (done)", data.description),
        ProgressStatus::Error => warn!("{}", data.description),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picogen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<StatusEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let tool = PicogenTool::new(config);
    let answer = tool.generate_image(&args.prompt, Some(Arc::new(tx))).await;

    // The tool dropped its sender, so the printer drains and stops.
    printer.await?;

    println!("{}", answer);
    if PicogenTool::is_error(&answer) {
        std::process::exit(1);
    }
    Ok(())
}
