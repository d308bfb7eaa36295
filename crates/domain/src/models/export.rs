//! Export request and report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of rows written to one export.
pub const MAX_EXPORT_RECORDS: i64 = 10_000;

/// Which columns to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportContent {
    All,
    Summary,
}

impl ExportContent {
    pub fn columns(&self) -> &'static [ExportColumn] {
        match self {
            ExportContent::Summary => &SUMMARY_COLUMNS,
            ExportContent::All => &ALL_COLUMNS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportContent::All => "all fields",
            ExportContent::Summary => "core fields",
        }
    }
}

/// Row selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    Batch,
    Range,
}

impl ExportScope {
    pub fn label(&self) -> &'static str {
        match self {
            ExportScope::Batch => "by batch",
            ExportScope::Range => "by time range",
        }
    }
}

/// Caller-supplied export options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportOptions {
    pub content: ExportContent,
    pub scope: ExportScope,
    #[serde(default)]
    pub batch_key: Option<DateTime<Utc>>,
    #[serde(default)]
    pub range_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub range_end: Option<DateTime<Utc>>,
}

/// Output encoding of a rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

/// Data sheet columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportColumn {
    Code,
    Status,
    ExpiresAt,
    Usage,
    CreatedAt,
    Description,
}

const SUMMARY_COLUMNS: [ExportColumn; 4] = [
    ExportColumn::Code,
    ExportColumn::Status,
    ExportColumn::ExpiresAt,
    ExportColumn::Usage,
];

const ALL_COLUMNS: [ExportColumn; 6] = [
    ExportColumn::Code,
    ExportColumn::Status,
    ExportColumn::ExpiresAt,
    ExportColumn::Usage,
    ExportColumn::CreatedAt,
    ExportColumn::Description,
];

impl ExportColumn {
    /// Machine key, used for JSON object fields.
    pub fn key(&self) -> &'static str {
        match self {
            ExportColumn::Code => "code",
            ExportColumn::Status => "status",
            ExportColumn::ExpiresAt => "expires_at",
            ExportColumn::Usage => "usage",
            ExportColumn::CreatedAt => "created_at",
            ExportColumn::Description => "description",
        }
    }

    /// Human header, used for CSV.
    pub fn header(&self) -> &'static str {
        match self {
            ExportColumn::Code => "Code",
            ExportColumn::Status => "Status",
            ExportColumn::ExpiresAt => "Expires At",
            ExportColumn::Usage => "Usage",
            ExportColumn::CreatedAt => "Created At",
            ExportColumn::Description => "Description",
        }
    }
}

/// The two-part report: data rows plus run metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub columns: Vec<ExportColumn>,
    pub rows: Vec<Vec<String>>,
    /// Ordered `(label, value)` pairs.
    pub metadata: Vec<(String, String)>,
}

impl ExportReport {
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Looks up a metadata value by label.
    pub fn metadata_value(&self, label: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// Rendered report ready for the caller to persist or transmit.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
    pub record_count: usize,
}
