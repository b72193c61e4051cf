//! Command-line entry point
//!
//! Parses flags, layers them over the loaded [`Config`], picks the variable
//! source and hands the batch to a [`Stamper`] on a blocking thread.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Config;
use crate::errors::StampError;
use crate::observability::telemetry::init_tracing;
use crate::targets::{RunSummary, Stamper};
use crate::variables::select_provider;

#[derive(Parser, Debug)]
#[command(name = "json-stamp")]
#[command(about = "Substitute values in JSON configuration files by dotted key path")]
#[command(version)]
pub struct Cli {
    /// Directory searched for targets
    #[arg(short = 'w', long, value_name = "DIR", alias = "workingDirectory")]
    pub working_directory: Option<PathBuf>,

    /// Glob for zip files or directories to process [default: **/*.zip]
    #[arg(short = 'f', long, value_name = "GLOB", alias = "zipFilesOrDirectories")]
    pub targets: Option<String>,

    /// Glob for JSON files inside each target [default: **/*.json]
    #[arg(short = 'j', long, value_name = "GLOB", alias = "jsonTargetFiles")]
    pub json_files: Option<String>,

    /// Where zip files are extracted while processing
    #[arg(short = 't', long, value_name = "DIR", alias = "tempDirectory")]
    pub temp_directory: Option<PathBuf>,

    /// Explicit KEY=VALUE pairs; environment variables are used when omitted
    #[arg(short = 'v', long, value_name = "KEY=VALUE", num_args = 1..)]
    pub variables: Vec<String>,

    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Write single-line JSON instead of indented output
    #[arg(long)]
    pub compact: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Only log warnings and errors, skip the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Command-line flags take precedence over file and environment settings.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(targets) = &self.targets {
            config.discovery.targets = targets.clone();
        }
        if let Some(json_files) = &self.json_files {
            config.discovery.json_files = json_files.clone();
        }
        if let Some(temp_dir) = &self.temp_directory {
            config.discovery.temp_dir = Some(temp_dir.clone());
        }
        if self.compact {
            config.output.pretty = false;
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                e.print()?;
                return Ok(());
            }
            _ => return Err(StampError::Usage(e.render().to_string().trim().to_string()).into()),
        },
    };

    run_with(cli).await.map(|_| ())
}

/// Execute a parsed command line.
pub async fn run_with(cli: Cli) -> Result<RunSummary> {
    init_tracing(cli.quiet, cli.verbose);

    // Apply --no-color early to disable all color output
    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let working_directory = cli
        .working_directory
        .clone()
        .ok_or(StampError::MissingWorkingDirectory)?;

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let provider = select_provider(&cli.variables, &config.variables.separator)?;

    if !working_directory.is_dir() {
        return Err(StampError::WorkingDirectoryNotFound {
            path: working_directory,
        }
        .into());
    }

    let variables = provider.variables();
    tracing::debug!("Loaded {} variable(s)", variables.len());

    let stamper = Stamper::from_config(&config, variables).with_dry_run(cli.dry_run);
    let targets = config.discovery.targets.clone();
    let root = working_directory.clone();
    let summary = tokio::task::spawn_blocking(move || stamper.run(&root, &targets))
        .await
        .context("Substitution task failed")??;

    if !cli.quiet {
        print_summary(&summary, cli.dry_run);
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let docs = &summary.documents;
    let mark = if docs.failed > 0 {
        "!".yellow().bold()
    } else {
        "✓".green().bold()
    };
    println!(
        "{} {} target(s), {} document(s) scanned, {} changed, {} failed",
        mark,
        summary.targets,
        docs.scanned,
        docs.changed.to_string().green(),
        if docs.failed > 0 {
            docs.failed.to_string().red()
        } else {
            docs.failed.to_string().normal()
        }
    );
    if summary.archives_repacked > 0 {
        println!("  {} archive(s) repacked", summary.archives_repacked);
    }
    if dry_run {
        println!("  {}", "Dry run: no files were written".dimmed());
    }
    if summary.interrupted {
        println!("  {}", "Interrupted before all targets were processed".yellow());
    }
}
