// src/core/flattener/legacy.rs

use super::package_set;
use super::row::{RowBuilder, UNKNOWN, format_date};
use crate::core::fields::{Field, FieldList};
use crate::core::models::{FlatRow, Host, LegacyCve, LegacyScanDocument};
use crate::core::severity::Severity;
use crate::core::vectors::{Dialect, Metric};
use tracing::{debug, error};

const JVN_VECTOR_FIELDS: &[(Metric, Field)] = &[
    (Metric::AccessVector, Field::JvnAccessVector),
    (Metric::AccessComplexity, Field::JvnAccessComplexity),
    (Metric::Authentication, Field::JvnAuthentication),
    (Metric::Confidentiality, Field::JvnConfidentialityImpact),
    (Metric::Integrity, Field::JvnIntegrityImpact),
    (Metric::Availability, Field::JvnAvailabilityImpact),
];

/// Flattens a `KnownCves`/`UnknownCves` document.
///
/// A category that is missing from the document is logged and contributes no
/// rows; the other category is still processed. A document without a
/// `ServerName`, or a finding without a CVE id, is logged and skipped.
pub fn flatten(document: &LegacyScanDocument, fields: &FieldList) -> Vec<FlatRow> {
    if document.host.server_name.is_empty() {
        error!("Target data not found.[ServerName] Skipping document.");
        return Vec::new();
    }

    let categories = [("KnownCves", &document.known_cves), ("UnknownCves", &document.unknown_cves)];

    let mut rows = Vec::new();
    for (category, findings) in categories {
        let Some(findings) = findings else {
            error!(
                category,
                server = %document.host.server_name,
                "Target data not found. Please check after running \"vuls report -format-json\"."
            );
            continue;
        };
        debug!(category, findings = findings.len(), "Flattening legacy category.");
        for finding in findings {
            if finding.cve_detail.cve_id.is_empty() {
                error!(category, server = %document.host.server_name, "Target data not found.[CveID] Skipping finding.");
                continue;
            }
            rows.extend(finding_rows(&document.host, finding, fields));
        }
    }
    rows
}

fn finding_rows(host: &Host, finding: &LegacyCve, fields: &FieldList) -> Vec<FlatRow> {
    let detail = &finding.cve_detail;

    package_set(&finding.cpe_names, &finding.packages)
        .into_iter()
        .map(|package| {
            let mut row = RowBuilder::new(fields);
            row.set_with(Field::ScannedAt, || format_date(&host.scanned_at))
                .set(Field::ServerName, host.server_name.as_str())
                .set(Field::Family, host.family.as_str())
                .set(Field::Release, host.release.as_str())
                .set(Field::ContainerName, host.container.name.as_str())
                .set(Field::ContainerId, host.container.container_id.as_str())
                .set(Field::PlatformName, host.platform.name.as_str())
                .set(Field::PlatformInstanceId, host.platform.instance_id.as_str())
                .set(Field::CveId, detail.cve_id.as_str())
                .set(Field::PackagesName, package.name);

            let nvd = &detail.nvd;
            if nvd.score != 0.0 {
                row.set(Field::NvdScore, nvd.score)
                    .set(Field::NvdSeverity, Severity::from_nvd(nvd.score).to_string())
                    .set(Field::NvdAccessVector, nvd.access_vector.as_str())
                    .set(Field::NvdAccessComplexity, nvd.access_complexity.as_str())
                    .set(Field::NvdAuthentication, nvd.authentication.as_str())
                    .set(Field::NvdConfidentialityImpact, nvd.confidentiality_impact.as_str())
                    .set(Field::NvdIntegrityImpact, nvd.integrity_impact.as_str())
                    .set(Field::NvdAvailabilityImpact, nvd.availability_impact.as_str())
                    .set(Field::NvdCweId, nvd.cwe_id.as_str())
                    .set(Field::NvdSummary, nvd.summary.as_str())
                    .set_with(Field::NvdPublishedDate, || format_date(&nvd.published_date))
                    .set_with(Field::NvdLastModifiedDate, || format_date(&nvd.last_modified_date));
            }

            let jvn = &detail.jvn;
            if jvn.score != 0.0 {
                row.set(Field::JvnScore, jvn.score).set(Field::JvnSeverity, jvn.severity.as_str());

                let decoded = Dialect::Jvn.decode_vector(&jvn.vector);
                for (metric, field) in JVN_VECTOR_FIELDS {
                    row.set(*field, decoded.get(*metric).unwrap_or(UNKNOWN));
                }

                row.set(Field::JvnId, jvn.jvn_id.as_str())
                    .set(Field::JvnTitle, jvn.title.as_str())
                    .set(Field::JvnSummary, jvn.summary.as_str())
                    .set(Field::JvnLink, jvn.jvn_link.as_str())
                    .set_with(Field::JvnPublishedDate, || format_date(&jvn.published_date))
                    .set_with(Field::JvnLastModifiedDate, || format_date(&jvn.last_modified_date));
            }

            row.build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Schema;
    use serde_json::{Value, json};

    fn document(value: Value) -> LegacyScanDocument {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Value {
        json!({
            "ScannedAt": "2017-05-30T13:51:52+09:00",
            "ServerName": "web01",
            "Family": "centos",
            "Release": "7.3.1611",
            "Container": { "ContainerID": "", "Name": "" },
            "Platform": { "Name": "aws", "InstanceID": "i-0123" },
            "KnownCves": [{
                "CveDetail": {
                    "CveID": "CVE-2016-2107",
                    "Nvd": {
                        "Score": 2.6,
                        "AccessVector": "NETWORK",
                        "AccessComplexity": "HIGH",
                        "Authentication": "NONE",
                        "ConfidentialityImpact": "PARTIAL",
                        "IntegrityImpact": "NONE",
                        "AvailabilityImpact": "NONE",
                        "CweID": "CWE-310",
                        "Summary": "padding oracle",
                        "PublishedDate": "2016-05-04T01:59:00+09:00",
                        "LastModifiedDate": "2016-05-05T01:59:00+09:00"
                    },
                    "Jvn": {
                        "Score": 2.6,
                        "Severity": "Low",
                        "Vector": "(AV:N/AC:H/Au:N/C:P/I:N/A:N)",
                        "JvnID": "JVNDB-2016-002462",
                        "Title": "OpenSSL issue",
                        "JvnLink": "http://jvndb.jvn.jp/ja/contents/2016/JVNDB-2016-002462.html",
                        "PublishedDate": "2016-05-06T00:00:00+09:00",
                        "LastModifiedDate": "2016-05-07T00:00:00+09:00"
                    }
                },
                "Packages": [{ "Name": "openssl", "Version": "1.0.1e" }, { "Name": "openssl-libs" }],
                "CpeNames": null
            }],
            "UnknownCves": [{
                "CveDetail": { "CveID": "CVE-2017-9999", "Nvd": { "Score": 0 }, "Jvn": { "Score": 0 } },
                "Packages": [],
                "CpeNames": ["cpe:/a:apache:struts:2.3.31"]
            }]
        })
    }

    #[test]
    fn one_row_per_package_per_finding() {
        let rows = flatten(&document(sample()), &FieldList::defaults(Schema::Legacy));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].text(Field::PackagesName).as_deref(), Some("openssl"));
        assert_eq!(rows[1].text(Field::PackagesName).as_deref(), Some("openssl-libs"));
        assert_eq!(rows[2].text(Field::PackagesName).as_deref(), Some("cpe:/a:apache:struts:2.3.31"));
    }

    #[test]
    fn nvd_block_uses_three_tier_rating() {
        let rows = flatten(&document(sample()), &FieldList::defaults(Schema::Legacy));
        let row = &rows[0];
        assert_eq!(row.text(Field::NvdScore).as_deref(), Some("2.6"));
        assert_eq!(row.text(Field::NvdSeverity).as_deref(), Some("Low"));
        assert_eq!(row.text(Field::NvdAccessVector).as_deref(), Some("NETWORK"));
        assert_eq!(row.text(Field::NvdCweId).as_deref(), Some("CWE-310"));
        assert_eq!(row.text(Field::NvdPublishedDate).as_deref(), Some("2016/05/04 01:59:00"));
        assert_eq!(row.text(Field::ScannedAt).as_deref(), Some("2017/05/30 13:51:52"));
    }

    #[test]
    fn jvn_vector_is_decoded_positionally() {
        let rows = flatten(&document(sample()), &FieldList::defaults(Schema::Legacy));
        let row = &rows[0];
        assert_eq!(row.text(Field::JvnSeverity).as_deref(), Some("Low"));
        assert_eq!(row.text(Field::JvnAccessVector).as_deref(), Some("NETWORK"));
        assert_eq!(row.text(Field::JvnAccessComplexity).as_deref(), Some("HIGH"));
        assert_eq!(row.text(Field::JvnAuthentication).as_deref(), Some("NONE"));
        assert_eq!(row.text(Field::JvnConfidentialityImpact).as_deref(), Some("PARTIAL"));
        assert_eq!(row.text(Field::JvnId).as_deref(), Some("JVNDB-2016-002462"));
    }

    #[test]
    fn zero_scores_leave_advisory_columns_out() {
        let rows = flatten(&document(sample()), &FieldList::defaults(Schema::Legacy));
        let row = &rows[2];
        assert_eq!(row.text(Field::CveId).as_deref(), Some("CVE-2017-9999"));
        assert!(row.get(Field::NvdScore).is_none());
        assert!(row.get(Field::JvnScore).is_none());
    }

    #[test]
    fn missing_category_contributes_nothing() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("UnknownCves");
        let rows = flatten(&document(value), &FieldList::defaults(Schema::Legacy));
        assert_eq!(rows.len(), 2);

        let rows = flatten(&document(json!({ "ServerName": "empty", "KnownCves": null })), &FieldList::defaults(Schema::Legacy));
        assert!(rows.is_empty());
    }

    #[test]
    fn field_list_limits_the_row() {
        let fields = FieldList::new([Field::ServerName, Field::CveId]);
        let rows = flatten(&document(sample()), &fields);
        assert!(rows.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn finding_without_cve_id_is_skipped() {
        let mut value = sample();
        value["KnownCves"][0]["CveDetail"]["CveID"] = Value::Null;
        let rows = flatten(&document(value), &FieldList::defaults(Schema::Legacy));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(Field::CveId).as_deref(), Some("CVE-2017-9999"));
    }

    #[test]
    fn document_without_server_name_is_skipped() {
        let value = json!({
            "ServerName": "",
            "KnownCves": [{
                "CveDetail": { "CveID": "CVE-2016-2107", "Nvd": { "Score": 5.0 } },
                "Packages": [{ "Name": "openssl" }]
            }],
            "UnknownCves": []
        });
        assert!(flatten(&document(value), &FieldList::defaults(Schema::Legacy)).is_empty());

        let mut value = sample();
        value.as_object_mut().unwrap().remove("ServerName");
        assert!(flatten(&document(value), &FieldList::defaults(Schema::Legacy)).is_empty());
    }
}
