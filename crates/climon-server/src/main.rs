use anyhow::Result;
use climon_server::app;
use climon_server::config::{ServerConfig, DEFAULT_CONFIG_PATH};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  climon-server [config.toml]    Start the alerting service (default: {DEFAULT_CONFIG_PATH})");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if matches!(args.get(1).map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let (config, found) = ServerConfig::load_or_default(Path::new(config_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("climon={}", config.log_level).parse()?),
        )
        .init();

    if !found {
        tracing::warn!(path = config_path, "Config file not found, using defaults");
    }
    config.validate()?;

    app::run_server(config).await
}
