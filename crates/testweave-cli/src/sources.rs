//! File-backed collaborators: CSV tables and page snapshots on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use testweave::{
    DomNode, MarkupSnapshot, MarkupSnapshotSource, Record, SourceError, SourceResult,
    TabularDataSource,
};

/// Parse CSV text into records keyed by header.
///
/// Rows may have fewer or more cells than the header; extra cells are
/// dropped and blank cells are left out of the record. Rows the reader
/// cannot decode are skipped with a warning.
pub fn parse_csv_records(content: &str) -> SourceResult<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::Parse(format!("Failed to parse CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::Parse("CSV table has no headers".to_string()));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_number, result) in reader.records().enumerate() {
        match result {
            Ok(row) => {
                let record: Record = headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(header, value)| !header.is_empty() && !value.is_empty())
                    .map(|(header, value)| (header.clone(), value.to_string()))
                    .collect();
                if !record.is_empty() {
                    records.push(record);
                }
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!("Skipping malformed row {} in CSV: {}", line_number + 2, e);
            }
        }
    }

    if skipped > 0 {
        tracing::info!("Parsed {} rows, skipped {}", records.len(), skipped);
    }
    Ok(records)
}

/// One or more CSV exports, flattened by concatenation.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    paths: Vec<PathBuf>,
}

impl CsvTableSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[async_trait]
impl TabularDataSource for CsvTableSource {
    async fn records(&self) -> SourceResult<Vec<Record>> {
        let mut all = Vec::new();
        for path in &self.paths {
            let content = tokio::fs::read_to_string(path).await?;
            let records = parse_csv_records(&content)
                .map_err(|e| SourceError::Parse(format!("{}: {e}", path.display())))?;
            tracing::debug!("Loaded {} records from {}", records.len(), path.display());
            all.extend(records);
        }
        Ok(all)
    }
}

/// A page snapshot stored in a file.
///
/// Files ending in `.json` hold a serialized DOM tree, either bare or wrapped
/// as a tagged snapshot. Anything else is read as HTML.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

/// Parse a DOM-JSON document as a snapshot.
pub fn parse_snapshot_json(json: &str) -> SourceResult<MarkupSnapshot> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))?;
    if value.get("format").is_some() {
        return serde_json::from_value(value).map_err(|e| SourceError::Parse(e.to_string()));
    }
    let root: DomNode =
        serde_json::from_value(value).map_err(|e| SourceError::Parse(e.to_string()))?;
    Ok(MarkupSnapshot::Tree(root))
}

#[async_trait]
impl MarkupSnapshotSource for FileSnapshotSource {
    async fn snapshot(&self) -> SourceResult<MarkupSnapshot> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        if self.is_json() {
            parse_snapshot_json(&content)
        } else {
            Ok(MarkupSnapshot::Markup(content))
        }
    }
}
