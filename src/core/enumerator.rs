// src/core/enumerator.rs

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lists the `.json` regular files directly inside `dir`.
///
/// The scan is not recursive. Paths are returned sorted, so the processing order
/// (and with it the CSV block order) does not depend on the filesystem.
///
/// # Errors
/// `ConvertError::InputAccess` when the directory cannot be listed.
pub async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let access_error = |source| ConvertError::InputAccess { path: dir.to_path_buf(), source };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(access_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(access_error)? {
        let path = entry.path();
        let is_json = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".json"));
        if !is_json {
            continue;
        }

        // Follows symlinks, so a link to a result file still counts.
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "Skipping non-regular entry."),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable entry."),
        }
    }

    files.sort();
    info!(dir = %dir.display(), count = files.len(), "Result files found.");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn lists_only_json_files_at_top_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web01.json"), "{}").unwrap();
        fs::write(dir.path().join("db01.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("web01.json.bak"), "").unwrap();
        fs::create_dir(dir.path().join("archive.json")).unwrap();
        fs::write(dir.path().join("archive.json").join("old.json"), "{}").unwrap();

        let files = list_json_files(dir.path()).await.unwrap();
        assert_eq!(files, vec![dir.path().join("db01.json"), dir.path().join("web01.json")]);
    }

    #[tokio::test]
    async fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_json_files(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_input_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("current");

        let err = list_json_files(&missing).await.unwrap_err();
        assert!(matches!(err, ConvertError::InputAccess { .. }));
        assert!(err.to_string().starts_with("Access denied or File not found ["));
    }
}
