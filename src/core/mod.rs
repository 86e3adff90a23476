// src/core/mod.rs

/// Serde models for both result layouts plus the flat output row.
pub mod models;

/// Output columns, the two default column sets and the `FieldList` allow-list.
pub mod fields;

/// Score to severity tiers for NVD, CVSS v2 and CVSS v3.
pub mod severity;

/// Positional decoding of JVN, CVSS v2 and CVSS v3 vector strings.
pub mod vectors;

/// Turns one result document into flat rows.
pub mod flattener;

/// Lists the `.json` result files of the input directory.
pub mod enumerator;
