// src/core/models.rs

use crate::core::fields::Field;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

// --- Helper di deserializzazione ---
// Vuls writes `null` for empty lists, strings and objects alike.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Identità dell'host ---
// Host identity, shared by both result layouts

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    #[serde(rename = "ContainerID", default, deserialize_with = "null_default")]
    pub container_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
    #[serde(rename = "Type", default, deserialize_with = "null_default")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Platform {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "InstanceID", default, deserialize_with = "null_default")]
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Host {
    #[serde(default, deserialize_with = "null_default")]
    pub scanned_at: String,
    #[serde(default, deserialize_with = "null_default")]
    pub server_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub family: String,
    #[serde(default, deserialize_with = "null_default")]
    pub release: String,
    #[serde(default, deserialize_with = "null_default")]
    pub container: Container,
    #[serde(default, deserialize_with = "null_default")]
    pub platform: Platform,
}

/// An entry of a finding's package list.
///
/// Older results list bare package names, newer ones carry the fix status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AffectedPackage {
    Name(String),
    Status(PackageStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageStatus {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub not_fixed_yet: Option<bool>,
}

impl AffectedPackage {
    pub fn name(&self) -> &str {
        match self {
            AffectedPackage::Name(name) => name,
            AffectedPackage::Status(status) => &status.name,
        }
    }

    pub fn not_fixed_yet(&self) -> Option<bool> {
        match self {
            AffectedPackage::Name(_) => None,
            AffectedPackage::Status(status) => status.not_fixed_yet,
        }
    }
}

// --- Formato corrente (ScannedCves) ---
// Current result layout

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanDocument {
    #[serde(flatten)]
    pub host: Host,
    #[serde(default, deserialize_with = "null_default")]
    pub running_kernel: Kernel,
    #[serde(default, deserialize_with = "null_default")]
    pub packages: HashMap<String, Package>,
    /// `None` when the key is absent or null, which is a malformed document.
    #[serde(default)]
    pub scanned_cves: Option<BTreeMap<String, ScannedCve>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Kernel {
    #[serde(default, deserialize_with = "null_default")]
    pub release: String,
    #[serde(default, deserialize_with = "null_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_default")]
    pub reboot_required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_default")]
    pub release: String,
    #[serde(default, deserialize_with = "null_default")]
    pub new_version: String,
    #[serde(default, deserialize_with = "null_default")]
    pub new_release: String,
    #[serde(default, deserialize_with = "null_default")]
    pub arch: String,
    #[serde(default, deserialize_with = "null_default")]
    pub repository: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Confidence {
    #[serde(default, deserialize_with = "null_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub detection_method: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScannedCve {
    #[serde(rename = "CveID", default, deserialize_with = "null_default")]
    pub cve_id: String,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "null_default")]
    pub confidences: Vec<Confidence>,
    #[serde(default, deserialize_with = "null_default")]
    pub affected_packages: Vec<AffectedPackage>,
    #[serde(default, deserialize_with = "null_default")]
    pub cpe_names: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub cve_contents: HashMap<String, CveContent>,
}

impl ScannedCve {
    /// The detection method of the (first) confidence entry.
    pub fn detection_method(&self) -> Option<&str> {
        self.confidence
            .iter()
            .chain(self.confidences.iter())
            .map(|c| c.detection_method.as_str())
            .find(|m| !m.is_empty())
    }
}

/// One advisory source's view of a CVE.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CveContent {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss2_score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss2_vector: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss2_severity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss3_score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss3_vector: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cvss3_severity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub source_link: String,
    #[serde(rename = "CweID", default, deserialize_with = "null_default")]
    pub cwe_id: String,
    #[serde(rename = "CweIDs", default, deserialize_with = "null_default")]
    pub cwe_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub published: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_modified: String,
}

impl CveContent {
    pub fn has_score(&self) -> bool {
        self.cvss2_score != 0.0 || self.cvss3_score != 0.0
    }

    pub fn cwe(&self) -> Option<&str> {
        std::iter::once(self.cwe_id.as_str())
            .chain(self.cwe_ids.iter().map(String::as_str))
            .find(|c| !c.is_empty())
    }
}

// --- Formato legacy (KnownCves / UnknownCves) ---
// Legacy result layout

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyScanDocument {
    #[serde(flatten)]
    pub host: Host,
    #[serde(default)]
    pub known_cves: Option<Vec<LegacyCve>>,
    #[serde(default)]
    pub unknown_cves: Option<Vec<LegacyCve>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyCve {
    #[serde(default, deserialize_with = "null_default")]
    pub cve_detail: CveDetail,
    #[serde(default, deserialize_with = "null_default")]
    pub packages: Vec<AffectedPackage>,
    #[serde(default, deserialize_with = "null_default")]
    pub cpe_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CveDetail {
    #[serde(rename = "CveID", default, deserialize_with = "null_default")]
    pub cve_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub nvd: NvdDetail,
    #[serde(default, deserialize_with = "null_default")]
    pub jvn: JvnDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NvdDetail {
    #[serde(default, deserialize_with = "null_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub access_vector: String,
    #[serde(default, deserialize_with = "null_default")]
    pub access_complexity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub authentication: String,
    #[serde(default, deserialize_with = "null_default")]
    pub confidentiality_impact: String,
    #[serde(default, deserialize_with = "null_default")]
    pub integrity_impact: String,
    #[serde(default, deserialize_with = "null_default")]
    pub availability_impact: String,
    #[serde(rename = "CweID", default, deserialize_with = "null_default")]
    pub cwe_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub published_date: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_modified_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JvnDetail {
    #[serde(default, deserialize_with = "null_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub severity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub vector: String,
    #[serde(rename = "JvnID", default, deserialize_with = "null_default")]
    pub jvn_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub jvn_link: String,
    #[serde(default, deserialize_with = "null_default")]
    pub published_date: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_modified_date: String,
}

// --- Riga di output ---
// Output row

/// One flattened output record: finding × affected package.
///
/// Cells are keyed by `Field`, so serialisation emits them in column declaration
/// order; a field outside the configured `FieldList` is never inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatRow(BTreeMap<Field, Value>);

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: Value) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.0.get(&field)
    }

    /// The cell as text; numbers and booleans are rendered, strings copied.
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field).map(render_cell)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders a cell the way a JSON consumer would print it: integral scores
/// lose their trailing `.0`.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_lists_and_objects_deserialize_to_defaults() {
        let doc: ScanDocument = serde_json::from_value(json!({
            "ServerName": "web01",
            "Container": null,
            "Packages": null,
            "ScannedCves": {
                "CVE-2017-0001": { "CveID": "CVE-2017-0001", "CpeNames": null, "AffectedPackages": null }
            }
        }))
        .unwrap();

        assert_eq!(doc.host.server_name, "web01");
        assert!(doc.host.container.name.is_empty());
        assert!(doc.packages.is_empty());
        let cve = &doc.scanned_cves.unwrap()["CVE-2017-0001"];
        assert!(cve.cpe_names.is_empty());
        assert!(cve.affected_packages.is_empty());
    }

    #[test]
    fn missing_scanned_cves_is_distinguished_from_empty() {
        let missing: ScanDocument = serde_json::from_value(json!({ "ServerName": "a" })).unwrap();
        let null: ScanDocument = serde_json::from_value(json!({ "ScannedCves": null })).unwrap();
        let empty: ScanDocument = serde_json::from_value(json!({ "ScannedCves": {} })).unwrap();

        assert!(missing.scanned_cves.is_none());
        assert!(null.scanned_cves.is_none());
        assert_eq!(empty.scanned_cves.map(|m| m.len()), Some(0));
    }

    #[test]
    fn affected_packages_accept_both_shapes() {
        let packages: Vec<AffectedPackage> = serde_json::from_value(json!([
            "openssl",
            { "Name": "bash", "NotFixedYet": true }
        ]))
        .unwrap();

        assert_eq!(packages[0].name(), "openssl");
        assert_eq!(packages[0].not_fixed_yet(), None);
        assert_eq!(packages[1].name(), "bash");
        assert_eq!(packages[1].not_fixed_yet(), Some(true));
    }

    #[test]
    fn detection_method_reads_either_confidence_form() {
        let single: ScannedCve =
            serde_json::from_value(json!({ "Confidence": { "Score": 100, "DetectionMethod": "OvalMatch" } }))
                .unwrap();
        let list: ScannedCve = serde_json::from_value(
            json!({ "Confidences": [{ "Score": 100, "DetectionMethod": "ChangelogExactMatch" }] }),
        )
        .unwrap();

        assert_eq!(single.detection_method(), Some("OvalMatch"));
        assert_eq!(list.detection_method(), Some("ChangelogExactMatch"));
        assert_eq!(ScannedCve::default().detection_method(), None);
    }

    #[test]
    fn cwe_falls_back_to_list_form() {
        let content: CveContent = serde_json::from_value(json!({ "CweIDs": ["CWE-79"] })).unwrap();
        assert_eq!(content.cwe(), Some("CWE-79"));
    }

    #[test]
    fn cells_render_like_json_numbers() {
        assert_eq!(render_cell(&json!(10.0)), "10");
        assert_eq!(render_cell(&json!(7.5)), "7.5");
        assert_eq!(render_cell(&json!(true)), "true");
        assert_eq!(render_cell(&json!("High")), "High");
    }

    #[test]
    fn rows_serialize_with_column_names() {
        let mut row = FlatRow::new();
        row.insert(Field::ServerName, json!("web01"));
        row.insert(Field::CveId, json!("CVE-2017-0001"));

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({ "ServerName": "web01", "CveID": "CVE-2017-0001" })
        );
    }
}
