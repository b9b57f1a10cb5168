//! CLI implementation of the backup run
//!
//! Wires the stage callback to a spinner and prints the final summary.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use indicatif::ProgressBar;

use crate::cli::output::{create_spinner, format_duration, status, OutputConfig};
use crate::config::BackupConfig;
use crate::core::backup::{Backup, BackupStage, BackupSummary};

/// Execute the backup
pub async fn execute(config: BackupConfig, output: &OutputConfig) -> Result<()> {
    let org = config.org.clone();
    let spinner: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));

    let mut backup = Backup::new(config);
    if output.show_progress() {
        let slot = Arc::clone(&spinner);
        backup = backup.on_stage(Box::new(move |stage| {
            let Ok(mut slot) = slot.lock() else {
                return;
            };
            match stage {
                BackupStage::Packaging => {
                    *slot = Some(create_spinner("Preparing zip archive..."));
                }
                BackupStage::Packaged => {
                    if let Some(pb) = slot.take() {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }));
    }

    let result = backup.run().await;

    if let Ok(mut slot) = spinner.lock() {
        if let Some(pb) = slot.take() {
            pb.abandon();
        }
    }

    let summary = result.with_context(|| format!("Backup of '{org}' failed"))?;
    print_summary(&summary, output);
    Ok(())
}

fn print_summary(summary: &BackupSummary, output: &OutputConfig) {
    if output.quiet {
        return;
    }

    println!(
        "{} Archived {}/{} repositories into {}",
        status::SUCCESS,
        summary.pool.succeeded.len(),
        summary.repositories,
        summary.archive_path.display()
    );

    if !summary.pool.failed.is_empty() {
        println!(
            "{} Failed to clone {} repositories:",
            status::WARNING,
            summary.pool.failed.len()
        );
        for (url, error) in &summary.pool.failed {
            println!("    {url}: {error}");
        }
    }

    println!("Done in {}!", format_duration(summary.elapsed));
}
