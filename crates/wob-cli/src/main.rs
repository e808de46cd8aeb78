use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wob_sync::{load_source_registry, report_recent_runs, NormalizePipeline, SyncConfig};

#[derive(Debug, Parser)]
#[command(name = "wob-cli")]
#[command(about = "Normalize scraped Wob records into canonical index items")]
struct Cli {
    /// Source registry (overrides WOB_SOURCES_FILE)
    #[arg(long, global = true)]
    sources: Option<PathBuf>,
    /// Run output directory (overrides WOB_OUTPUT_DIR)
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Normalize every enabled source, or a single one
    Normalize {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List the source registry
    Sources,
    /// Summarize the most recent runs
    Report {
        #[arg(long, default_value_t = 5)]
        runs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = SyncConfig::from_env();
    if let Some(sources) = cli.sources {
        config.sources_file = sources;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    let command = cli.command.unwrap_or(Commands::Normalize {
        source: None,
        workers: None,
    });
    match command {
        Commands::Normalize { source, workers } => {
            if let Some(workers) = workers.filter(|n| *n > 0) {
                config.workers = workers;
            }
            let summary = NormalizePipeline::new(config)
                .run_once(source.as_deref())
                .await?;
            println!(
                "normalize complete: run_id={} sources={} records={} items={} failures={} output={}",
                summary.run_id,
                summary.sources,
                summary.records,
                summary.items,
                summary.failures,
                summary.output_dir
            );
        }
        Commands::Sources => {
            let registry = load_source_registry(&config.sources_file)?;
            for source in registry.sources {
                println!(
                    "{}\tindex={}\thidden={}\tenabled={}\tbundle={}",
                    source.source_id, source.index_name, source.hidden, source.enabled, source.bundle
                );
            }
        }
        Commands::Report { runs } => {
            println!("{}", report_recent_runs(&config.output_dir, runs)?);
        }
    }

    Ok(())
}
