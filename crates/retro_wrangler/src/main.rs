//! Retrosheet Wrangler CLI
//!
//! Collected parser CSVs → tidy tables + consistency report

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use retro_core::{FieldSelection, WrangleConfig};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing::error;
#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "cli")]
const DEFAULT_FILTER: &str = "retro_wrangler=info,retro_core=info";

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "retro_wrangler")]
#[command(about = "Tidy parsed Retrosheet data and check it for consistency", long_about = None)]
struct Cli {
    /// Debug logging (shorthand for --log debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Wrangle the collected datasets and run the consistency checks
    Wrangle {
        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data root holding retrosheet/collected
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Play-by-play fields: default, all, or a comma-separated list
        #[arg(long)]
        fields: Option<String>,

        /// Skip play-by-play decoding
        #[arg(long, default_value = "false")]
        no_events: bool,

        /// Season totals CSV (year_id, team_id, lg_id, stats)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Relative tolerance against the reference (e.g. 0.01)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Decode transaction codes and print the derived fields as JSON
    Decode {
        /// Codes such as "S7/G.1-2" or "K+SB2"
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool, log: Option<&str>) {
    let filter = match (log, verbose) {
        (Some(level), _) => tracing_subscriber::EnvFilter::new(level),
        (None, true) => tracing_subscriber::EnvFilter::new("debug"),
        (None, false) => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_FILTER.into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log.as_deref());

    match cli.command {
        Commands::Wrangle {
            config,
            data_dir,
            fields,
            no_events,
            reference,
            tolerance,
        } => {
            let mut cfg = match config {
                Some(path) => WrangleConfig::load(&path)?,
                None => WrangleConfig::default(),
            };
            if let Some(dir) = data_dir {
                cfg.data_dir = dir;
            }
            if let Some(fields) = fields {
                cfg.event.fields = FieldSelection::parse(&fields);
            }
            if no_events {
                cfg.event.enabled = false;
            }
            if let Some(path) = reference {
                cfg.reference.path = Some(path);
            }
            if let Some(t) = tolerance {
                cfg.reference.tolerance = t;
            }

            let summary = match retro_wrangler::run(&cfg) {
                Ok(summary) => summary,
                Err(e) => {
                    error!("{:#}", e);
                    return Err(e);
                }
            };

            for line in summary.report.summary() {
                println!("{}", line);
            }
            println!(
                "\nOutputs in {} ({} files)",
                cfg.wrangled_dir().display(),
                summary.manifest.files.len()
            );

            if !summary.passed() {
                anyhow::bail!(
                    "consistency checks failed ({} failing results)",
                    summary.report.failure_count()
                );
            }
        }

        Commands::Decode { codes } => {
            let mut decoded = serde_json::Map::new();
            for code in codes {
                let fields = retro_core::decode(&code)?;
                decoded.insert(code, serde_json::to_value(fields)?);
            }
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("retro_wrangler CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
