// src/core/flattener/mod.rs

// Public interface of the flattener: one sub-module per Vuls result layout,
// plus the row builder they share.
pub mod current;
pub mod legacy;
pub mod row;

use crate::core::fields::{FieldList, Schema};
use crate::core::models::{AffectedPackage, FlatRow, LegacyScanDocument, ScanDocument};
use crate::error::ConvertError;
use std::path::Path;
use tracing::{debug, info};

/// A package a finding applies to, after choosing between CPE names and packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef<'a> {
    pub name: &'a str,
    pub not_fixed_yet: Option<bool>,
    pub is_cpe: bool,
}

/// CPE names win when the finding has any; otherwise the package list is used.
pub fn package_set<'a>(cpe_names: &'a [String], packages: &'a [AffectedPackage]) -> Vec<PackageRef<'a>> {
    if cpe_names.is_empty() {
        packages
            .iter()
            .map(|p| PackageRef { name: p.name(), not_fixed_yet: p.not_fixed_yet(), is_cpe: false })
            .collect()
    } else {
        cpe_names
            .iter()
            .map(|c| PackageRef { name: c.as_str(), not_fixed_yet: None, is_cpe: true })
            .collect()
    }
}

/// Flattens an already-read document according to `schema`.
pub fn flatten_str(
    content: &str,
    schema: Schema,
    fields: &FieldList,
) -> Result<Vec<FlatRow>, serde_json::Error> {
    let rows = match schema {
        Schema::Current => {
            let document: ScanDocument = serde_json::from_str(content)?;
            current::flatten(&document, fields)
        }
        Schema::Legacy => {
            let document: LegacyScanDocument = serde_json::from_str(content)?;
            legacy::flatten(&document, fields)
        }
    };
    Ok(rows)
}

/// Reads one result file and flattens it.
///
/// The document is dropped as soon as its rows have been extracted.
pub fn read_rows(path: &Path, schema: Schema, fields: &FieldList) -> Result<Vec<FlatRow>, ConvertError> {
    debug!(path = %path.display(), %schema, "Reading result file.");
    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = flatten_str(&content, schema, fields).map_err(|source| ConvertError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = rows.len(), "Result file flattened.");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cpe_names_replace_the_package_list() {
        let cpes = vec!["cpe:/a:vendor:pkg".to_string()];
        let set = package_set(&cpes, &[]);
        assert_eq!(set, vec![PackageRef { name: "cpe:/a:vendor:pkg", not_fixed_yet: None, is_cpe: true }]);
    }

    #[test]
    fn empty_cpe_list_falls_back_to_packages() {
        let packages = vec![AffectedPackage::Name("openssl".to_string())];
        let set = package_set(&[], &packages);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].name, "openssl");
        assert!(!set[0].is_cpe);
    }

    #[test]
    fn unparsable_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = read_rows(file.path(), Schema::Current, &FieldList::defaults(Schema::Current)).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows(&dir.path().join("gone.json"), Schema::Legacy, &FieldList::defaults(Schema::Legacy))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }
}
