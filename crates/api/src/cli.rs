//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use domain::models::{ExportContent, ExportFormat, ExportScope, StatusFilter};
use uuid::Uuid;

/// Operator tool for generating, listing and exporting access codes.
#[derive(Parser, Debug)]
#[command(name = "access-codes", version, about)]
pub struct Cli {
    /// Identity recorded on exports; defaults to `operator.default_identity`.
    #[arg(long, global = true, env = "AC_OPERATOR")]
    pub operator: Option<String>,

    /// Write a Prometheus text snapshot of query and pool metrics to this file.
    #[arg(long, global = true, env = "AC_METRICS_OUT")]
    pub metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,

    /// List codes with filters and pagination.
    List(ListArgs),

    /// Create codes.
    #[command(subcommand)]
    Create(CreateCommand),

    /// Update expiry, usage cap or description of a code.
    Update(UpdateArgs),

    /// Delete a code.
    Delete {
        /// Code id.
        id: Uuid,
    },

    /// Show the most recent generation batches.
    Batches {
        /// Number of batches to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export codes by batch or creation range.
    Export(ExportArgs),

    /// Print dashboard statistics.
    Dashboard,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Case-insensitive substring of the description.
    #[arg(long)]
    pub search: Option<String>,

    /// all, active or inactive.
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Inclusive lower bound on expiry (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    pub expires_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on expiry (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    pub expires_to: Option<DateTime<Utc>>,
}

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    /// Generate a batch of random codes.
    Random {
        /// Number of codes; clamped to the bulk limit.
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        quantity: i32,

        #[command(flatten)]
        common: CreateArgs,
    },

    /// Create one code with a chosen plaintext.
    Custom {
        /// Plaintext code; trimmed and uppercased.
        code: String,

        #[command(flatten)]
        common: CreateArgs,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Expiry instant (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    pub expires_at: DateTime<Utc>,

    /// Usage cap; omit or pass 0 for unlimited.
    #[arg(long, allow_negative_numbers = true)]
    pub max_uses: Option<i32>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Code id.
    pub id: Uuid,

    #[arg(long, value_parser = parse_timestamp)]
    pub expires_at: Option<DateTime<Utc>>,

    #[arg(long, allow_negative_numbers = true)]
    pub max_uses: Option<i32>,

    /// New description; an empty value clears it.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ContentArg::Summary)]
    pub content: ContentArg,

    #[arg(long, value_enum, default_value_t = ScopeArg::Batch)]
    pub scope: ScopeArg,

    /// Batch creation timestamp, as printed by `batches`.
    #[arg(long, value_parser = parse_timestamp)]
    pub batch_key: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_timestamp)]
    pub range_start: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_timestamp)]
    pub range_end: Option<DateTime<Utc>>,

    /// csv or json.
    #[arg(long, default_value = "csv")]
    pub format: ExportFormat,

    /// Output file; defaults to the suggested file name in the working directory.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentArg {
    All,
    Summary,
}

impl From<ContentArg> for ExportContent {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::All => ExportContent::All,
            ContentArg::Summary => ExportContent::Summary,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeArg {
    Batch,
    Range,
}

impl From<ScopeArg> for ExportScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Batch => ExportScope::Batch,
            ScopeArg::Range => ExportScope::Range,
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    shared::validation::parse_instant(value)
        .ok_or_else(|| format!("invalid RFC 3339 timestamp: {}", value))
}
