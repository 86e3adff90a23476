// src/core/flattener/row.rs

use crate::core::fields::{Field, FieldList};
use crate::core::models::FlatRow;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Literal written into every vulnerability column of a host without findings.
pub const HEALTHY: &str = "healthy";
/// Advisory data could not be resolved for this cell.
pub const UNKNOWN: &str = "Unknown";
/// The document explicitly carries nothing for this cell.
pub const NONE: &str = "None";

const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Accumulates the cells of one row, dropping anything outside the allow-list.
pub struct RowBuilder<'a> {
    fields: &'a FieldList,
    row: FlatRow,
}

impl<'a> RowBuilder<'a> {
    pub fn new(fields: &'a FieldList) -> Self {
        Self { fields, row: FlatRow::new() }
    }

    pub fn set(&mut self, field: Field, value: impl Into<Value>) -> &mut Self {
        if self.fields.contains(field) {
            self.row.insert(field, value.into());
        }
        self
    }

    /// Like [`RowBuilder::set`], but only computes the value for wanted fields.
    pub fn set_with<V, F>(&mut self, field: Field, compute: F) -> &mut Self
    where
        V: Into<Value>,
        F: FnOnce() -> V,
    {
        if self.fields.contains(field) {
            self.row.insert(field, compute().into());
        }
        self
    }

    pub fn build(self) -> FlatRow {
        self.row
    }
}

/// Reformats a Vuls timestamp as `yyyy/mm/dd HH:MM:ss`, keeping the offset the
/// document was written with. Values that do not parse are passed through.
///
/// No conversion to the local time zone of the converting machine happens, so
/// the same input always renders the same string.
pub fn format_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format(DATE_FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(DATE_FORMAT).to_string();
    }
    raw.to_string()
}

/// `value`, or the `"None"` literal when it is empty.
pub fn or_none(value: &str) -> String {
    if value.is_empty() { NONE.to_string() } else { value.to_string() }
}
