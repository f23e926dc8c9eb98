use anyhow::Context;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use voxarm_app::config::{AppConfig, CliArgs};
use voxarm_app::runtime;

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs").context("creating logs directory")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "voxarm.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    // Keep the appender worker alive for the process lifetime.
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("Starting VoxArm");

    let args = CliArgs::parse();
    let cfg = AppConfig::resolve(&args).context("resolving configuration")?;
    tracing::debug!(?cfg, "Effective configuration");

    runtime::run(cfg).await.context("running pipeline")?;
    Ok(())
}
