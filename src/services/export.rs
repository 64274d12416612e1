//! Result export in CSV and JSON.
//!
//! Serializes query results for download endpoints. Small exports are
//! returned inline; handing larger payloads to blob storage is the
//! embedding service's job.

use crate::models::ContentItem;
use crate::{Error, Result};

/// Columns emitted by CSV exports, in output order. Field selection picks
/// a subset of these; unknown names are dropped.
const COLUMNS: [&str; 16] = [
    "id",
    "platform",
    "title",
    "body",
    "url",
    "likes",
    "collects",
    "comments",
    "shares",
    "views",
    "reposts",
    "author",
    "author_id",
    "publish_time",
    "crawl_time",
    "tags",
];

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

impl ExportFormat {
    /// Returns the format as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Parses a format string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything but `csv`/`json`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An export payload and the number of records it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Number of records serialized.
    pub total_records: usize,
    /// Serialized data, inline.
    pub data: String,
}

/// Serializes items in the given format, optionally restricted to a field
/// subset.
///
/// # Errors
///
/// Returns [`Error::ExportFailed`] if serialization fails.
pub fn export_items(
    items: &[ContentItem],
    format: ExportFormat,
    fields: Option<&[String]>,
) -> Result<String> {
    match format {
        ExportFormat::Csv => export_csv(items, fields),
        ExportFormat::Json => export_json(items, fields),
    }
}

fn export_csv(items: &[ContentItem], fields: Option<&[String]>) -> Result<String> {
    if items.is_empty() {
        return Ok(String::new());
    }
    let columns = selected_columns(fields);

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(&columns)
        .map_err(export_err("write_csv_headers"))?;
    for item in items {
        let record: Vec<String> = columns.iter().map(|c| column_value(item, c)).collect();
        writer.write_record(&record).map_err(export_err("write_csv"))?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::ExportFailed {
        operation: "flush_csv".to_string(),
        cause: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::ExportFailed {
        operation: "flush_csv".to_string(),
        cause: e.to_string(),
    })
}

fn export_json(items: &[ContentItem], fields: Option<&[String]>) -> Result<String> {
    let Some(fields) = fields else {
        return serde_json::to_string_pretty(items).map_err(export_err("write_json"));
    };
    let selected = selected_columns(Some(fields));

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let value = serde_json::to_value(item).map_err(export_err("write_json"))?;
        let serde_json::Value::Object(mut map) = value else {
            return Err(Error::ExportFailed {
                operation: "write_json".to_string(),
                cause: "item did not serialize to an object".to_string(),
            });
        };
        map.retain(|key, _| selected.contains(&key.as_str()));
        records.push(serde_json::Value::Object(map));
    }
    serde_json::to_string_pretty(&records).map_err(export_err("write_json"))
}

/// Resolves a field selection against the known columns, keeping output
/// order stable. An empty selection falls back to the full set.
fn selected_columns(fields: Option<&[String]>) -> Vec<&'static str> {
    let all: Vec<&'static str> = COLUMNS.to_vec();
    let Some(fields) = fields else {
        return all;
    };
    let picked: Vec<&'static str> = all
        .iter()
        .copied()
        .filter(|column| fields.iter().any(|f| f.eq_ignore_ascii_case(column)))
        .collect();
    if picked.is_empty() { all } else { picked }
}

fn column_value(item: &ContentItem, column: &str) -> String {
    match column {
        "id" => item.id.as_str().to_string(),
        "platform" => item.platform.as_str().to_string(),
        "title" => item.title.clone().unwrap_or_default(),
        "body" => item.body.clone(),
        "url" => item.url.clone(),
        "likes" => item.likes.to_string(),
        "collects" => item.collects.to_string(),
        "comments" => item.comments.to_string(),
        "shares" => item.shares.to_string(),
        "views" => item.views.map(|v| v.to_string()).unwrap_or_default(),
        "reposts" => item.reposts.map(|v| v.to_string()).unwrap_or_default(),
        "author" => item.author.clone(),
        "author_id" => item.author_id.clone(),
        "publish_time" => item.publish_time.to_rfc3339(),
        "crawl_time" => item.crawl_time.to_rfc3339(),
        "tags" => item.tags.join(","),
        _ => String::new(),
    }
}

fn export_err<E: std::fmt::Display>(operation: &'static str) -> impl Fn(E) -> Error {
    move |e| Error::ExportFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentId, Platform};
    use chrono::{TimeZone, Utc};

    fn item(id: &str) -> ContentItem {
        ContentItem {
            id: ContentId::new(id),
            platform: Platform::Weibo,
            title: Some(format!("title {id}")),
            body: format!("body {id}"),
            url: format!("https://example.com/{id}"),
            likes: 7,
            collects: 1,
            comments: 2,
            shares: 0,
            views: Some(300),
            reposts: None,
            author: "alice".to_string(),
            author_id: "alice-1".to_string(),
            publish_time: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().unwrap(),
            crawl_time: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().unwrap(),
            tags: vec!["news".to_string(), "daily".to_string()],
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("json").unwrap(), ExportFormat::Json);
        assert!(matches!(
            ExportFormat::parse("excel").unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_csv_has_headers_and_rows() {
        let out = export_items(&[item("a"), item("b")], ExportFormat::Csv, None).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap().split(',').next(), Some("id"));
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("title a"));
        assert!(out.contains("\"news,daily\""));
    }

    #[test]
    fn test_csv_empty_input_is_empty_string() {
        assert_eq!(export_items(&[], ExportFormat::Csv, None).unwrap(), "");
    }

    #[test]
    fn test_csv_field_selection_keeps_column_order() {
        let fields = vec!["likes".to_string(), "id".to_string()];
        let out = export_items(&[item("a")], ExportFormat::Csv, Some(&fields)).unwrap();
        // Selection follows column order, not request order.
        assert_eq!(out.lines().next(), Some("id,likes"));
        assert_eq!(out.lines().nth(1), Some("a,7"));
    }

    #[test]
    fn test_unknown_fields_fall_back_to_full_set() {
        let fields = vec!["nonsense".to_string()];
        let out = export_items(&[item("a")], ExportFormat::Csv, Some(&fields)).unwrap();
        assert!(out.starts_with("id,platform"));
    }

    #[test]
    fn test_json_round_trips_items() {
        let items = vec![item("a"), item("b")];
        let out = export_items(&items, ExportFormat::Json, None).unwrap();
        let back: Vec<ContentItem> = serde_json::from_str(&out).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn test_json_field_selection() {
        let fields = vec!["id".to_string(), "likes".to_string()];
        let out = export_items(&[item("a")], ExportFormat::Json, Some(&fields)).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        let record = parsed[0].as_object().unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record["id"], "a");
        assert_eq!(record["likes"], 7);
    }
}
