//! org-archiver CLI
//!
//! Entry point for the org-archiver command-line application.

use anyhow::Result;
use clap::Parser;

use org_archiver::cli::output::display_error;
use org_archiver::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_config = cli.output_config();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into())
                .add_directive(
                    format!("org_archiver={}", output_config.log_level())
                        .to_lowercase()
                        .parse()?,
                ),
        )
        .init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
