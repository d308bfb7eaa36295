//! Export builder.
//!
//! Selects rows by batch or creation range and produces a two-part report:
//! one data row per code and a metadata section describing the run.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use super::codes::CodeLimits;
use crate::error::{DomainError, ValidationError};
use crate::models::{
    AccessCode, ExportColumn, ExportFile, ExportFormat, ExportOptions, ExportReport, ExportScope,
};
use crate::repository::{AccessCodeStore, ExportSelection};

/// Metadata value for an absent range bound.
pub const UNBOUNDED_LABEL: &str = "unbounded";

/// Metadata field present only when rows were cut at the row cap.
pub const TRUNCATED_FIELD: &str = "Truncated";

/// Formats an instant with microsecond precision so batch keys round-trip.
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Resolves options into a storage selection.
pub fn selection_for(options: &ExportOptions) -> Result<ExportSelection, ValidationError> {
    match options.scope {
        ExportScope::Batch => options
            .batch_key
            .map(ExportSelection::Batch)
            .ok_or(ValidationError::MissingBatchKey),
        ExportScope::Range => {
            shared::validation::validate_time_range(options.range_start, options.range_end)
                .map_err(ValidationError::from_range)?;
            Ok(ExportSelection::Range {
                start: options.range_start,
                end: options.range_end,
            })
        }
    }
}

fn cell(code: &AccessCode, column: ExportColumn, now: DateTime<Utc>) -> String {
    match column {
        ExportColumn::Code => code.export_code().to_string(),
        ExportColumn::Status => code.status_at(now).to_string(),
        ExportColumn::ExpiresAt => format_instant(code.expires_at),
        ExportColumn::Usage => code.usage(),
        ExportColumn::CreatedAt => format_instant(code.created_at),
        ExportColumn::Description => code.description.clone().unwrap_or_default(),
    }
}

/// Builds the report for `options` on behalf of `operator`.
pub async fn build_report(
    store: &dyn AccessCodeStore,
    options: &ExportOptions,
    operator: &str,
    limits: &CodeLimits,
    now: DateTime<Utc>,
) -> Result<ExportReport, DomainError> {
    let selection = selection_for(options)?;
    // One extra row tells a full export apart from a truncated one
    let cap = limits.export_row_cap;
    let mut codes = store
        .select_for_export(&selection, cap.saturating_add(1))
        .await?;
    let truncated = codes.len() as i64 > cap;
    if truncated {
        codes.truncate(cap as usize);
        tracing::warn!(cap, "Export reached the row cap; output is truncated");
    }

    let columns = options.content.columns().to_vec();
    let rows: Vec<Vec<String>> = codes
        .iter()
        .map(|code| columns.iter().map(|c| cell(code, *c, now)).collect())
        .collect();

    let mut metadata = vec![
        ("Operator".to_string(), operator.to_string()),
        ("Field scope".to_string(), options.content.label().to_string()),
        ("Export mode".to_string(), options.scope.label().to_string()),
    ];
    match &selection {
        ExportSelection::Batch(key) => {
            metadata.push(("Batch time".to_string(), format_instant(*key)));
        }
        ExportSelection::Range { start, end } => {
            let bound = |b: &Option<DateTime<Utc>>| {
                b.map(format_instant)
                    .unwrap_or_else(|| UNBOUNDED_LABEL.to_string())
            };
            metadata.push(("Range start".to_string(), bound(start)));
            metadata.push(("Range end".to_string(), bound(end)));
        }
    }
    metadata.push(("Total records".to_string(), rows.len().to_string()));
    if truncated {
        metadata.push((
            TRUNCATED_FIELD.to_string(),
            format!("true; {} of at least {}", rows.len(), rows.len() + 1),
        ));
    }
    metadata.push(("Exported at".to_string(), format_instant(now)));

    Ok(ExportReport {
        columns,
        rows,
        metadata,
    })
}

/// Escape a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(values: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let mut line = values
        .into_iter()
        .map(|v| escape_csv(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Renders the report as CSV: data section, blank line, metadata section.
/// Includes UTF-8 BOM for spreadsheet compatibility.
pub fn render_csv(report: &ExportReport) -> String {
    let mut csv = String::new();
    csv.push('\u{FEFF}');

    csv.push_str(&csv_line(report.columns.iter().map(|c| c.header())));
    for row in &report.rows {
        csv.push_str(&csv_line(row));
    }

    csv.push('\n');
    csv.push_str(&csv_line(["Field", "Value"]));
    for (label, value) in &report.metadata {
        csv.push_str(&csv_line([label, value]));
    }
    csv
}

/// Renders the report as `{"data": {...}, "metadata": [{"field", "value"}, ...]}`.
///
/// Metadata is an array so the field order matches the CSV section.
pub fn render_json(report: &ExportReport) -> Result<String, DomainError> {
    let rows: Vec<Value> = report
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = report
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.key().to_string(), Value::String(value.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();
    let metadata: Vec<Value> = report
        .metadata
        .iter()
        .map(|(label, value)| json!({ "field": label, "value": value }))
        .collect();

    let body = json!({
        "data": {
            "columns": report.columns.iter().map(|c| c.key()).collect::<Vec<_>>(),
            "rows": rows,
        },
        "metadata": metadata,
    });
    serde_json::to_string_pretty(&body)
        .map_err(|e| DomainError::Storage(format!("Failed to serialize export: {}", e)))
}

/// Renders the report into a file buffer.
pub fn render(
    report: &ExportReport,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<ExportFile, DomainError> {
    let body = match format {
        ExportFormat::Csv => render_csv(report),
        ExportFormat::Json => render_json(report)?,
    };

    Ok(ExportFile {
        bytes: body.into_bytes(),
        content_type: format.content_type(),
        file_name: format!(
            "access-codes-{}.{}",
            now.format("%Y%m%d-%H%M%S"),
            format.extension()
        ),
        record_count: report.record_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExportContent, UNLIMITED_MAX_USES};
    use crate::repository::InMemoryCodeStore;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn row(
        created_at: DateTime<Utc>,
        plain: Option<&str>,
        description: Option<&str>,
    ) -> AccessCode {
        AccessCode {
            id: Uuid::new_v4(),
            code_hash: "$argon2id$stored".to_string(),
            plain_code: plain.map(str::to_string),
            expires_at: Utc::now() + Duration::days(3),
            max_uses: UNLIMITED_MAX_USES,
            used_count: 2,
            description: description.map(str::to_string),
            created_at,
        }
    }

    fn batch_key() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::microseconds(123_456)
    }

    fn seeded_store() -> InMemoryCodeStore {
        let key = batch_key();
        let store = InMemoryCodeStore::new();
        store
            .seed(vec![
                row(key, Some("AAAAAAAAAAAA"), Some("bulk, first")),
                row(key, Some("BBBBBBBBBBBB"), None),
                row(key + Duration::minutes(5), None, Some("later")),
            ])
            .unwrap();
        store
    }

    fn batch_options(content: ExportContent) -> ExportOptions {
        ExportOptions {
            content,
            scope: ExportScope::Batch,
            batch_key: Some(batch_key()),
            range_start: None,
            range_end: None,
        }
    }

    #[tokio::test]
    async fn test_summary_batch_export() {
        let store = seeded_store();
        let report = build_report(
            &store,
            &batch_options(ExportContent::Summary),
            "ops@example.com",
            &CodeLimits::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(report.columns.len(), 4);
        assert_eq!(report.record_count(), 2);
        assert!(report.rows.iter().all(|r| r.len() == 4));
        assert!(report.rows.iter().all(|r| r[3] == "2/∞"));
        assert_eq!(report.metadata_value("Operator"), Some("ops@example.com"));
        assert_eq!(report.metadata_value("Export mode"), Some("by batch"));
        assert_eq!(
            report.metadata_value("Batch time"),
            Some("2024-05-01T10:00:00.123456Z")
        );
        assert_eq!(report.metadata_value("Total records"), Some("2"));
    }

    #[tokio::test]
    async fn test_all_fields_range_export_falls_back_to_hash() {
        let store = seeded_store();
        let options = ExportOptions {
            content: ExportContent::All,
            scope: ExportScope::Range,
            batch_key: None,
            range_start: Some(batch_key() + Duration::minutes(1)),
            range_end: None,
        };
        let report = build_report(&store, &options, "ops", &CodeLimits::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(report.columns.len(), 6);
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.rows[0][0], "$argon2id$stored");
        assert_eq!(report.rows[0][5], "later");
        assert_eq!(report.metadata_value("Range end"), Some(UNBOUNDED_LABEL));
        assert_eq!(report.metadata_value("Field scope"), Some("all fields"));
    }

    #[tokio::test]
    async fn test_batch_export_without_key_rejected() {
        let store = seeded_store();
        let mut options = batch_options(ExportContent::Summary);
        options.batch_key = None;
        let result =
            build_report(&store, &options, "ops", &CodeLimits::default(), Utc::now()).await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MissingBatchKey))
        ));
    }

    #[tokio::test]
    async fn test_export_marks_truncation_at_row_cap() {
        let store = seeded_store();
        let limits = CodeLimits {
            export_row_cap: 1,
            ..Default::default()
        };
        let report = build_report(
            &store,
            &batch_options(ExportContent::Summary),
            "ops",
            &limits,
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(report.record_count(), 1);
        assert_eq!(report.metadata_value("Total records"), Some("1"));
        assert_eq!(
            report.metadata_value(TRUNCATED_FIELD),
            Some("true; 1 of at least 2")
        );

        let csv = render_csv(&report);
        assert!(csv.contains("Truncated,true; 1 of at least 2\n"));
    }

    #[tokio::test]
    async fn test_export_exactly_at_row_cap_is_not_truncated() {
        let store = seeded_store();
        let limits = CodeLimits {
            export_row_cap: 2,
            ..Default::default()
        };
        let report = build_report(
            &store,
            &batch_options(ExportContent::Summary),
            "ops",
            &limits,
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(report.record_count(), 2);
        assert_eq!(report.metadata_value(TRUNCATED_FIELD), None);
    }

    #[test]
    fn test_render_json_keeps_metadata_order() {
        let report = ExportReport {
            columns: vec![ExportColumn::Code],
            rows: Vec::new(),
            metadata: vec![
                ("Operator".to_string(), "ops".to_string()),
                ("Field scope".to_string(), "summary".to_string()),
                ("Export mode".to_string(), "by batch".to_string()),
                ("Total records".to_string(), "0".to_string()),
                ("Exported at".to_string(), "2024-05-01T10:00:00.000000Z".to_string()),
            ],
        };
        let value: Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        let fields: Vec<&str> = value["metadata"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["field"].as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["Operator", "Field scope", "Export mode", "Total records", "Exported at"]
        );
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_render_csv_layout() {
        let report = ExportReport {
            columns: vec![ExportColumn::Code, ExportColumn::Usage],
            rows: vec![vec!["ABC".to_string(), "0/5".to_string()]],
            metadata: vec![("Operator".to_string(), "ops, inc".to_string())],
        };
        let csv = render_csv(&report);

        assert!(csv.starts_with('\u{FEFF}'));
        let body = csv.trim_start_matches('\u{FEFF}');
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            vec!["Code,Usage", "ABC,0/5", "", "Field,Value", "Operator,\"ops, inc\""]
        );
    }

    #[test]
    fn test_render_json_shape() {
        let report = ExportReport {
            columns: vec![ExportColumn::Code, ExportColumn::Status],
            rows: vec![vec!["ABC".to_string(), "active".to_string()]],
            metadata: vec![("Total records".to_string(), "1".to_string())],
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let file = render(&report, ExportFormat::Json, now).unwrap();

        assert_eq!(file.content_type, "application/json");
        assert_eq!(file.file_name, "access-codes-20240501-100000.json");
        let value: Value = serde_json::from_slice(&file.bytes).unwrap();
        assert_eq!(value["data"]["rows"][0]["code"], "ABC");
        assert_eq!(value["data"]["rows"][0]["status"], "active");
        assert_eq!(value["metadata"][0]["field"], "Total records");
        assert_eq!(value["metadata"][0]["value"], "1");
    }
}
