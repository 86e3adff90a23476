// src/output/csv_sink.rs

use crate::core::fields::FieldList;
use crate::core::models::FlatRow;
use crate::error::ConvertError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Renders one input file's rows as a CSV block.
///
/// Columns follow `fields`; a cell missing from a row is written empty.
/// Non-numeric cells (and the header) are quoted.
pub fn render_block(rows: &[FlatRow], fields: &FieldList, with_header: bool) -> Result<Vec<u8>, ConvertError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(fields.headers())?;
    }
    for row in rows {
        writer.write_record(fields.iter().map(|field| row.text(field).unwrap_or_default()))?;
    }

    writer.into_inner().map_err(|e| ConvertError::Csv(e.into_error().into()))
}

/// Appends CSV blocks to one target file; only the first block carries a header.
pub struct CsvSink {
    path: PathBuf,
    fields: FieldList,
    header_written: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, fields: FieldList) -> Self {
        Self { path: path.into(), fields, header_written: false }
    }

    pub fn write_block(&mut self, rows: &[FlatRow]) -> Result<(), ConvertError> {
        let block = render_block(rows, &self.fields, !self.header_written)?;

        let output_error = |source| ConvertError::Output { path: self.path.clone(), source };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(output_error)?;
        file.write_all(&block).map_err(output_error)?;

        debug!(path = %self.path.display(), rows = rows.len(), header = !self.header_written, "CSV block appended.");
        self.header_written = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Field;
    use serde_json::json;

    fn row(server: &str, cve: &str, score: f64) -> FlatRow {
        let mut row = FlatRow::new();
        row.insert(Field::ServerName, json!(server));
        row.insert(Field::CveId, json!(cve));
        row.insert(Field::CvssScore, json!(score));
        row
    }

    fn fields() -> FieldList {
        FieldList::new([Field::ServerName, Field::CveId, Field::CvssScore, Field::Summary])
    }

    #[test]
    fn header_block_lists_columns_in_order() {
        let block = render_block(&[row("web01", "CVE-2017-0001", 7.5)], &fields(), true).unwrap();
        let text = String::from_utf8(block).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], r#""ServerName","CveID","CVSS_Score","Summary""#);
        assert!(lines[1].starts_with(r#""web01","CVE-2017-0001",7.5,"#));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn block_without_header_has_only_rows() {
        let block = render_block(&[row("web01", "CVE-2017-0001", 10.0)], &fields(), false).unwrap();
        let text = String::from_utf8(block).unwrap();

        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with(r#""web01","CVE-2017-0001",10,"#));
    }

    #[test]
    fn sink_writes_header_once_across_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let mut sink = CsvSink::new(&path, fields());

        sink.write_block(&[row("web01", "CVE-2017-0001", 7.5)]).unwrap();
        sink.write_block(&[row("db01", "CVE-2017-0002", 4.3), row("db01", "CVE-2017-0003", 5.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(r#""ServerName""#));
        assert_eq!(lines.iter().filter(|l| l.starts_with(r#""ServerName""#)).count(), 1);
        assert!(lines[3].contains("CVE-2017-0003"));
    }

    #[test]
    fn unwritable_target_is_an_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path().join("missing").join("output.csv"), fields());

        let err = sink.write_block(&[]).unwrap_err();
        assert!(matches!(err, ConvertError::Output { .. }));
    }
}
