use std::sync::Arc;

use anyhow::Context;

use interview_sim::cli::InterviewCli;
use interview_sim::config::InterviewConfig;
use interview_sim::interview::{InterviewController, SimulatedCaptureDevice};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the transcript on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = InterviewConfig::from_env().context("Failed to read INTERVIEW_* settings")?;

    eprintln!("🎤 Interview Simulator v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Spoken questions: {}",
        if config.audio_enabled { "on" } else { "off" }
    );
    if let Some(seed) = config.seed {
        eprintln!("   Seed: {}", seed);
    }
    eprintln!();

    let device = Arc::new(SimulatedCaptureDevice::new());
    let controller = InterviewController::with_defaults(config, device.clone());

    InterviewCli::new(controller, device).run().await?;

    eprintln!("Goodbye.");
    Ok(())
}
