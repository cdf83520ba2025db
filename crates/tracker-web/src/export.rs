//! CSV and JSON export of client and follow-up records.
//!
//! Records are flattened through their JSON form, so exported field names
//! match the API's camelCase names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// Exportable client fields, in column order.
pub const CLIENT_FIELDS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone",
    "company",
    "status",
    "priority",
    "category",
    "source",
    "tags",
    "notes",
    "createdAt",
    "updatedAt",
];

/// Exportable follow-up fields, in column order.
pub const FOLLOW_UP_FIELDS: &[&str] = &[
    "id",
    "clientId",
    "clientName",
    "title",
    "description",
    "dueDate",
    "status",
    "priority",
    "createdAt",
    "completedAt",
];

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Resolve a comma-separated field list against the allowed fields.
///
/// `None` or a blank list selects everything. Duplicates are dropped and the
/// requested order is kept.
pub fn select_fields(
    requested: Option<&str>,
    allowed: &[&'static str],
) -> Result<Vec<&'static str>> {
    let Some(requested) = requested.filter(|r| !r.trim().is_empty()) else {
        return Ok(allowed.to_vec());
    };

    let mut selected: Vec<&'static str> = Vec::new();
    for name in requested.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let field = *allowed
            .iter()
            .find(|f| **f == name)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown export field: {name}")))?;
        if !selected.contains(&field) {
            selected.push(field);
        }
    }

    Ok(selected)
}

/// Flatten records into JSON objects holding only `fields`.
pub fn project<T: Serialize>(records: &[T], fields: &[&str]) -> Result<Vec<Map<String, Value>>> {
    records
        .iter()
        .map(|record| {
            let Value::Object(mut object) = serde_json::to_value(record)
                .map_err(|e| ApiError::Internal(format!("Failed to serialize record: {e}")))?
            else {
                return Err(ApiError::Internal("Record is not an object".to_string()));
            };

            Ok(fields
                .iter()
                .map(|f| (f.to_string(), object.remove(*f).unwrap_or(Value::Null)))
                .collect())
        })
        .collect()
}

/// Render projected rows in `format`.
pub fn render(
    format: ExportFormat,
    rows: &[Map<String, Value>],
    fields: &[&str],
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(rows)
            .map_err(|e| ApiError::Internal(format!("Failed to encode JSON: {e}"))),
        ExportFormat::Csv => to_csv(rows, fields),
    }
}

fn to_csv(rows: &[Map<String, Value>], fields: &[&str]) -> Result<Vec<u8>> {
    let csv_error = |e: csv::Error| ApiError::Internal(format!("Failed to write CSV: {e}"));

    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(fields).map_err(csv_error)?;

    for row in rows {
        writer
            .write_record(fields.iter().map(|f| cell(row.get(*f))))
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("Failed to flush CSV: {e}")))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell(Some(item)))
            .collect::<Vec<_>>()
            .join(";"),
        Some(other) => other.to_string(),
    }
}

/// Attachment filename, e.g. `clients-2025-01-12.csv`.
pub fn filename(kind: &str, date: chrono::NaiveDate, format: ExportFormat) -> String {
    format!("{}-{}.{}", kind, date.format("%Y-%m-%d"), format.extension())
}
