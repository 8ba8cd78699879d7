// cardex CLI - headless catalog consolidation and spec merging

mod catalog;
mod exit_codes;
mod specs;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cardex")]
#[command(about = "Multi-source automotive catalog consolidation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate brand/model payloads into a unified catalog
    #[command(after_help = "\
Examples:
  cardex consolidate as24.json cargurus.json
  cardex consolidate *.json --json
  cardex consolidate *.json --prior catalog.json --output catalog.json
  cardex consolidate *.json --csv catalog.csv")]
    Consolidate {
        /// Source payload files (JSON, one per source)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Existing consolidated catalog to fold the sources into
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Output full result JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write the consolidated catalog JSON to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the catalog as CSV to file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Report cross-source model overlaps without modifying anything
    #[command(after_help = "\
Exit code 5 indicates overlaps were found. The audit is read-only: no
catalog is written either way.

Examples:
  cardex duplicates cargurus.json --against as24.json
  cardex duplicates new.json --against a.json --against b.json --json")]
    Duplicates {
        /// Candidate source payload to audit
        candidate: PathBuf,

        /// Existing source payloads to compare against (repeatable)
        #[arg(long, required = true)]
        against: Vec<PathBuf>,

        /// Output duplicate records as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Merge per-model specification payloads under a policy config
    #[command(after_help = "\
Examples:
  cardex merge-specs specs/*.json --config policy.toml
  cardex merge-specs specs/*.json --config policy.toml --json
  cardex merge-specs specs/*.json --config policy.toml --output merged.json
  cardex merge-specs specs/*.json --config policy.toml --csv merged.csv")]
    MergeSpecs {
        /// Specification payload files (JSON, one record per file)
        #[arg(required = true)]
        payloads: Vec<PathBuf>,

        /// Merge policy config (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Output merged result JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write merged result JSON to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write merged fields as long-format CSV to file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Validate a merge policy config without running
    #[command(after_help = "\
Examples:
  cardex validate policy.toml")]
    Validate {
        /// Merge policy config (TOML)
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Consolidate { sources, prior, json, output, csv } => {
            catalog::cmd_consolidate(sources, prior, json, output, csv)
        }
        Commands::Duplicates { candidate, against, json } => {
            catalog::cmd_duplicates(candidate, against, json)
        }
        Commands::MergeSpecs { payloads, config, json, output, csv } => {
            specs::cmd_merge_specs(payloads, config, json, output, csv)
        }
        Commands::Validate { config } => specs::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Read and decode one JSON payload file.
pub(crate) fn load_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| CliError::parse(format!("{}: invalid JSON: {e}", path.display())))
}

/// Read and decode a batch of JSON payload files, in argument order.
pub(crate) fn load_payloads(paths: &[PathBuf]) -> Result<Vec<serde_json::Value>, CliError> {
    paths.iter().map(|p| load_json(p)).collect()
}
