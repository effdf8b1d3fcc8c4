//! # KYC Intake CLI (`kyc`)
//!
//! Provisions client folders from a client table, collects matching
//! documents into them, and exports the result.
//!
//! ## Usage
//!
//! ```bash
//! kyc --config ./config/kyc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kyc intake <table>` | Create one folder per client row under today's root |
//! | `kyc collect <source>` | Sweep every client folder against a source tree |
//! | `kyc collect-one <source> <folder>` | Retry collection for a single client folder |
//! | `kyc inventory` | List empty client folders |
//! | `kyc archive` | Zip today's root |
//! | `kyc report` | Write a CSV summary of today's root |
//! | `kyc serve` | Start the local HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! kyc intake clients.xlsx
//! kyc collect ~/Scans --progress human
//! kyc collect-one /mnt/share/hr "Jane Doe 123"
//! kyc --date 2024-05-01 report --output ./summary.csv
//! ```

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kyc_intake::archive;
use kyc_intake::collector::Collector;
use kyc_intake::config::{self, Config};
use kyc_intake::dated_root::{parse_date, DatedRoot};
use kyc_intake::intake::{self, TableFormat};
use kyc_intake::inventory;
use kyc_intake::logging;
use kyc_intake::progress::ProgressMode;
use kyc_intake::report;
use kyc_intake::server;

/// KYC intake: provision client folders and collect their documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "kyc",
    about = "KYC intake — provision client folders and collect their documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kyc.toml")]
    config: PathBuf,

    /// Operate on the root for this day (YYYY-MM-DD) instead of today.
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create client folders from a header-less CSV or Excel table of
    /// `identifier,name` rows.
    ///
    /// Idempotent: folders that already exist are counted, not recreated.
    Intake {
        /// Path to the client table (.csv, .xlsx, .xlsm, .xls, .ods).
        table: PathBuf,
    },

    /// Sweep every client folder under the root against a source tree.
    Collect {
        /// Directory tree to search for client documents.
        source: PathBuf,

        /// Copy files even when their names contain exclusion words.
        #[arg(long)]
        no_exclusions: bool,

        /// Progress output on stderr (defaults to human on a TTY, off otherwise).
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Collect documents for one client folder from a source tree.
    CollectOne {
        /// Directory tree to search.
        source: PathBuf,
        /// Client folder name, e.g. "Jane Doe 123".
        folder: String,
    },

    /// List empty client folders, one per line.
    Inventory,

    /// Zip the whole root.
    Archive {
        /// Output path (defaults to `{base_dir}/{archive_name}`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a CSV summary of every client folder.
    Report {
        /// Output path (defaults to `{base_dir}/{summary_name}`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Start the local HTTP API on `[server].bind`.
    Serve,
}

fn load(path: &std::path::Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = match cli.command {
        Commands::Serve => cli.verbose.max(1),
        _ => cli.verbose,
    };
    logging::init_logging(verbosity);

    let cfg = load(&cli.config)?;
    let root = DatedRoot::resolve(&cfg.workspace, cli.date);

    match cli.command {
        Commands::Intake { table } => {
            let file_name = table.file_name().unwrap_or_default().to_string_lossy();
            let Some(format) = TableFormat::from_file_name(&file_name) else {
                bail!(
                    "Unsupported client table {}: expected one of {}",
                    table.display(),
                    TableFormat::ACCEPTED
                );
            };
            let bytes = std::fs::read(&table)
                .with_context(|| format!("Failed to read client table: {}", table.display()))?;
            let report = intake::run_intake(&root, format, &bytes)?;
            println!("intake {}", root.path().display());
            println!("  folders created: {}", report.created);
            println!("  already present: {}", report.existing);
            println!("  rows skipped: {}", report.skipped);
            println!("  failed: {}", report.failed);
            println!("ok");
        }
        Commands::Collect {
            source,
            no_exclusions,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let exclusions = if no_exclusions { Some(false) } else { None };
            let collector = Collector::from_config(&cfg, exclusions)?.with_progress(mode.reporter());
            let report = tokio::task::spawn_blocking({
                let root = root.clone();
                move || collector.collect_all(&root, &source)
            })
            .await??;

            let empty = inventory::empty_folders(&root);
            println!("collect {}", root.path().display());
            println!("  folders processed: {}", report.folders_processed);
            println!("  folders skipped: {}", report.folders_skipped);
            println!("  files copied: {}", report.files_copied);
            println!("  total size: {} KB", report.total_size_kb());
            print_empty_folders(&empty);
            println!("ok");
        }
        Commands::CollectOne { source, folder } => {
            let collector = Collector::from_config(&cfg, None)?;
            let outcome = collector.collect_single(&root, &source, &folder)?;
            println!("collect-one {}", folder);
            println!("  files copied: {}", outcome.files_copied);
            print_empty_folders(&inventory::empty_folders(&root));
            println!("ok");
        }
        Commands::Inventory => {
            for name in inventory::empty_folders(&root) {
                println!("{}", name);
            }
        }
        Commands::Archive { output } => {
            let dest = output.unwrap_or_else(|| cfg.archive_path());
            let summary = archive::export_archive(&root, &dest)?;
            println!(
                "Archived {} files ({} bytes) in {} folders to {}",
                summary.files,
                summary.bytes,
                summary.directories,
                dest.display()
            );
        }
        Commands::Report { output } => {
            let dest = output.unwrap_or_else(|| cfg.summary_path());
            let rows = report::export_summary(&root, &dest)?;
            println!("Wrote summary of {} folders to {}", rows, dest.display());
        }
        Commands::Serve => {
            server::run_server(&cfg, cli.date).await?;
        }
    }

    Ok(())
}

fn print_empty_folders(empty: &[String]) {
    println!("  empty folders: {}", empty.len());
    for name in empty {
        println!("    - {}", name);
    }
}
