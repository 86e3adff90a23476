// src/output/mod.rs

/// Appends per-file CSV blocks to a single report file.
pub mod csv_sink;

/// Submits rows to an Elasticsearch `_bulk` endpoint.
pub mod bulk_sink;

use crate::cli::OutputTarget;
use crate::core::fields::FieldList;
use crate::core::models::FlatRow;
use crate::error::ConvertError;
use std::path::Path;

use self::bulk_sink::BulkSink;
use self::csv_sink::CsvSink;

/// The sink selected by `--type`.
pub enum Emitter {
    Csv(CsvSink),
    Bulk(BulkSink),
}

impl Emitter {
    pub fn from_target(target: &OutputTarget, fields: &FieldList) -> Result<Self, ConvertError> {
        match target {
            OutputTarget::Csv { path } => Ok(Emitter::Csv(CsvSink::new(path, fields.clone()))),
            OutputTarget::Elasticsearch { endpoint, index, doc_type } => {
                Ok(Emitter::Bulk(BulkSink::new(endpoint, index, doc_type)?))
            }
        }
    }

    /// Hands one input file's rows to the sink.
    ///
    /// CSV blocks are written before returning; bulk submissions are only spawned.
    pub fn emit(&mut self, rows: &[FlatRow], source: &Path) -> Result<(), ConvertError> {
        match self {
            Emitter::Csv(sink) => sink.write_block(rows),
            Emitter::Bulk(sink) => sink.submit(rows, &source.display().to_string()),
        }
    }

    /// Flushes the sink; returns the number of failed bulk submissions.
    pub async fn finish(self) -> usize {
        match self {
            Emitter::Csv(_) => 0,
            Emitter::Bulk(sink) => sink.finish().await,
        }
    }
}
