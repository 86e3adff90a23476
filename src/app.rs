// src/app.rs

use crate::cli::Settings;
use crate::core::enumerator::list_json_files;
use crate::core::flattener::read_rows;
use crate::error::ConvertError;
use crate::output::Emitter;
use tracing::{error, info, warn};

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub files_found: usize,
    pub files_converted: usize,
    pub files_skipped: usize,
    pub rows: usize,
    pub failed_submissions: usize,
}

pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Converts every result file in the input directory, one file at a time.
    ///
    /// A file that cannot be read or parsed is logged and skipped. Listing the
    /// directory or writing the CSV target are the only failures that end the run.
    pub async fn run(&self) -> Result<ConvertSummary, ConvertError> {
        let settings = &self.settings;
        let files = list_json_files(&settings.input).await?;
        let mut emitter = Emitter::from_target(&settings.target, &settings.fields)?;

        info!("Convert start.");
        let mut summary = ConvertSummary { files_found: files.len(), ..Default::default() };

        for path in &files {
            let rows = match read_rows(path, settings.schema, &settings.fields) {
                Ok(rows) => rows,
                Err(e) => {
                    error!(path = %path.display(), error = %e, cause = ?e, "Skipping result file.");
                    summary.files_skipped += 1;
                    continue;
                }
            };
            emitter.emit(&rows, path)?;
            summary.files_converted += 1;
            summary.rows += rows.len();
        }

        summary.failed_submissions = emitter.finish().await;
        if summary.failed_submissions > 0 {
            warn!(failed = summary.failed_submissions, "Some bulk submissions failed.");
        }
        info!(
            files = summary.files_converted,
            skipped = summary.files_skipped,
            rows = summary.rows,
            "Convert success."
        );
        Ok(summary)
    }
}
