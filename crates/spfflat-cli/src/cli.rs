//! Clap derive structures for the `spfflat` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// spfflat -- flatten and reconcile SPF TXT records across DNS providers
#[derive(Debug, Parser)]
#[command(
    name = "spfflat",
    version,
    about = "Flatten SPF DNS records for multiple domains",
    long_about = "Resolves published SPF records into concrete IP mechanisms,\n\
        packs them into 255-octet TXT chains, and reconciles the result\n\
        against the records hosted at your DNS provider.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the YAML configuration file
    #[arg(
        long,
        short = 'c',
        env = "SPFFLAT_CONFIG",
        default_value = "config.yaml",
        global = true
    )]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Flatten SPF records for all configured domains
    #[command(alias = "f")]
    Flatten(FlattenArgs),

    /// Test DNS API credentials for each configured domain
    Ping(PingArgs),

    /// Export DNS records to backup files
    Export(ExportArgs),

    /// Import DNS records from backup files
    Import(ImportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── flatten ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FlattenArgs {
    /// Simulate changes without applying them (the default)
    #[arg(long, conflicts_with = "production")]
    pub dry_run: bool,

    /// Apply changes to live DNS records
    #[arg(long)]
    pub production: bool,

    /// Update DNS records even when no change is detected
    #[arg(long)]
    pub force: bool,

    /// Merge contiguous flattened addresses into CIDR blocks
    #[arg(long)]
    pub aggregate: bool,

    /// Use the spf-unflat.<domain> TXT record as the SPF source
    #[arg(long = "spf-unflat")]
    pub spf_unflat: bool,

    /// Write the final reports to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

// ── ping ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PingArgs {
    /// Write output to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

// ── export ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum ExportFormat {
    /// Machine-readable JSON
    Json,
    /// Human-readable text
    Txt,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Directory for backup files (default: current directory)
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Restrict the export to these domains (comma-separated)
    #[arg(long, short = 'd', value_delimiter = ',')]
    pub domains: Vec<String>,

    /// Restrict the export to these record types (comma-separated)
    #[arg(long, short = 't', value_delimiter = ',')]
    pub record_types: Vec<String>,

    /// Test connectivity and preview without writing files (the default)
    #[arg(long, conflicts_with = "production")]
    pub dry_run: bool,

    /// Write actual backup files
    #[arg(long)]
    pub production: bool,
}

// ── import ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImportStrategy {
    /// Skip existing records, import only new ones (safest)
    Skip,
    /// Replace existing records with the backup version
    Replace,
    /// Create missing records, leave the rest untouched
    Merge,
    /// Stop at the first conflict
    Abort,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Backup files to import (JSON format)
    #[arg(long, short = 'f', value_delimiter = ',', required = true)]
    pub files: Vec<PathBuf>,

    /// Conflict resolution strategy
    #[arg(long, short = 's', value_enum, default_value = "skip")]
    pub strategy: ImportStrategy,

    /// Restrict the import to these record types (comma-separated)
    #[arg(long, short = 't', value_delimiter = ',')]
    pub record_types: Vec<String>,

    /// Export the current records before importing
    #[arg(long)]
    pub backup_before: bool,

    /// Test the import without changing any records (the default)
    #[arg(long, conflicts_with = "production")]
    pub dry_run: bool,

    /// Apply the import to live DNS records
    #[arg(long)]
    pub production: bool,
}

// ── completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

impl From<ImportStrategy> for spfflat_core::ConflictStrategy {
    fn from(strategy: ImportStrategy) -> Self {
        match strategy {
            ImportStrategy::Skip => Self::Skip,
            ImportStrategy::Replace => Self::Replace,
            ImportStrategy::Merge => Self::Merge,
            ImportStrategy::Abort => Self::Abort,
        }
    }
}
