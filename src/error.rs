// src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the converter can surface, grouped by how the run reacts to it.
///
/// Configuration and input-access errors abort the run before any file is
/// processed. Read/parse errors are per-document and only skip that document.
/// Sink errors are logged by the bulk sink and never stop the batch.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{0}")]
    Config(String),

    #[error("Access denied or File not found [{}]", path.display())]
    InputAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to render CSV block")]
    Csv(#[from] csv::Error),

    #[error("bulk request failed")]
    Transport(#[from] reqwest::Error),

    #[error("bulk request rejected: {0}")]
    Sink(String),
}

impl ConvertError {
    pub fn config(message: impl Into<String>) -> Self {
        ConvertError::Config(message.into())
    }

    /// Process exit status for an error that ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_usage_status() {
        assert_eq!(ConvertError::config("unknown type.").exit_code(), 2);
    }

    #[test]
    fn input_access_message_names_the_directory() {
        let err = ConvertError::InputAccess {
            path: PathBuf::from("/opt/vuls/results"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "Access denied or File not found [/opt/vuls/results]");
        assert_eq!(err.exit_code(), 1);
    }
}
