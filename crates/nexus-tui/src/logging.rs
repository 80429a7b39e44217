use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use nexus_core::Config;

const TUI_FILTER: &str = "ai_nexus=info,nexus_core=info";
const CLI_FILTER: &str = "ai_nexus=warn,nexus_core=warn";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The terminal owns stderr while the UI is up, so logs go to
/// `<config dir>/ai-nexus/ai-nexus.log` instead.
pub fn init_file_logging() -> Result<PathBuf> {
    let log_dir = Config::config_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("ai-nexus.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    Registry::default()
        .with(env_filter(TUI_FILTER))
        .with(
            fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .init();

    Ok(log_path)
}

/// One-shot commands print their result to stdout; diagnostics go to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(CLI_FILTER))
        .with_writer(std::io::stderr)
        .init();
}
