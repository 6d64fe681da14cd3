///
/// This module implements the CLI interface for layerkit: command parsing and the
/// async entrypoint shared by `main()` and the integration tests.
///
/// All document and storage logic lives in the [`layerkit-core`] crate; this module is
/// strictly glue between the loaded config and the core entrypoints.
///
/// ## Commands
/// - `render`: run the configured document job and write the merged PDF
/// - `buckets`: print every accessible bucket name, one per line
///
/// [`layerkit-core`]: ../../layerkit-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use layerkit_core::chromium::ChromiumLauncher;
use layerkit_core::render::generate_pdf;
use layerkit_core::storage::BucketLister;
use std::path::PathBuf;

/// CLI for layerkit: render HTML into one PDF, list storage buckets.
#[derive(Parser)]
#[clap(
    name = "layerkit",
    version,
    about = "Render HTML sources into one merged PDF and list S3 buckets"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the configured HTML sources and merge them into one PDF
    Render {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Overrides `render.output` from the config file
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the names of all accessible buckets
    Buckets {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Render { config, output } => {
            let config = load_config(config)?;
            let mut job = config
                .render
                .context("Config file has no `render` section")?;
            if let Some(output) = output {
                job = job.with_output(output);
            }
            tracing::info!(command = "render", sources = job.sources.len(), "Starting render");

            let launcher = ChromiumLauncher::new(config.browser);
            match generate_pdf(&launcher, &job).await {
                Ok(report) => {
                    tracing::info!(command = "render", ?report, "Render complete");
                    println!(
                        "Wrote {} ({} sources, {} bytes)",
                        report.output.display(),
                        report.sources,
                        report.bytes
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "render", error = %e, "Render failed");
                    Err(anyhow::Error::new(e).context("Render failed"))
                }
            }
        }
        Commands::Buckets { config } => {
            let config = load_config(config)?;
            tracing::info!(
                command = "buckets",
                region = %config.storage.region,
                "Listing buckets"
            );

            let lister = BucketLister::connect(&config.storage).await;
            match lister.get_all_bucket_names().await {
                Ok(names) => {
                    for name in &names {
                        println!("{name}");
                    }
                    tracing::info!(command = "buckets", count = names.len(), "Listing complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "buckets", error = %e, "Listing failed");
                    Err(anyhow::Error::new(e).context("Listing buckets failed"))
                }
            }
        }
    }
}
