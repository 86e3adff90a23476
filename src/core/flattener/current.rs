// src/core/flattener/current.rs

use super::row::{HEALTHY, NONE, RowBuilder, UNKNOWN, format_date, or_none};
use super::{PackageRef, package_set};
use crate::core::fields::{Field, FieldList};
use crate::core::models::{CveContent, FlatRow, Package, ScanDocument, ScannedCve};
use crate::core::severity::Severity;
use crate::core::vectors::{DecodedVector, Dialect, Metric};
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};
use tracing::{debug, error, warn};

/// Detection method Vuls reports when a CVE was found verbatim in a changelog.
pub const CHANGELOG_EXACT_MATCH: &str = "ChangelogExactMatch";
const REBOOT_REQUIRED_SUFFIX: &str = " [Reboot Required]";

/// Advisory sources, declared in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AdvisorySource {
    Jvn,
    Nvd,
    Redhat,
    Ubuntu,
    Debian,
    Oracle,
}

/// Columns filled from the decoded vector, with the metric each one reads.
const VECTOR_FIELDS: &[(Metric, Field)] = &[
    (Metric::AccessVector, Field::CvssAccessVector),
    (Metric::AccessComplexity, Field::CvssAccessComplexity),
    (Metric::Authentication, Field::CvssAuthentication),
    (Metric::Confidentiality, Field::CvssConfidentialityImpact),
    (Metric::Integrity, Field::CvssIntegrityImpact),
    (Metric::Availability, Field::CvssAvailabilityImpact),
];

const V3_ONLY_FIELDS: &[(Metric, Field)] = &[
    (Metric::PrivilegesRequired, Field::CvssPrivilegesRequired),
    (Metric::UserInteraction, Field::CvssUserInteraction),
    (Metric::Scope, Field::CvssScope),
];

const ADVISORY_FIELDS: &[Field] = &[
    Field::CvssSource,
    Field::CvssScore,
    Field::CvssSeverity,
    Field::CvssAccessVector,
    Field::CvssAccessComplexity,
    Field::CvssAuthentication,
    Field::CvssConfidentialityImpact,
    Field::CvssIntegrityImpact,
    Field::CvssAvailabilityImpact,
    Field::CvssPrivilegesRequired,
    Field::CvssUserInteraction,
    Field::CvssScope,
    Field::Title,
    Field::Summary,
    Field::SourceLink,
    Field::PublishedDate,
    Field::LastModifiedDate,
];

/// Picks the first source, in priority order, that carries a nonzero score.
pub fn resolve_advisory(contents: &HashMap<String, CveContent>) -> Option<(AdvisorySource, &CveContent)> {
    AdvisorySource::iter().find_map(|source| {
        contents
            .get(source.as_ref())
            .filter(|content| content.has_score())
            .map(|content| (source, content))
    })
}

/// Score and rating of a content entry: CVSS v2 when it is set, v3 otherwise.
pub fn score_and_severity(content: &CveContent) -> (f64, Severity) {
    if content.cvss2_score != 0.0 {
        (content.cvss2_score, Severity::from_cvss2(content.cvss2_score))
    } else {
        (content.cvss3_score, Severity::from_cvss3(content.cvss3_score))
    }
}

/// `<version>-<release>`, `"None"` for an empty version, `"Unknown"` without a
/// package entry.
pub fn format_version(version: Option<(&str, &str)>) -> String {
    match version {
        None => UNKNOWN.to_string(),
        Some(("", _)) => NONE.to_string(),
        Some((version, "")) => version.to_string(),
        Some((version, release)) => format!("{version}-{release}"),
    }
}

/// Flattens a `ScannedCves` document.
///
/// An empty findings map yields a single "healthy" row for the host; a missing
/// one is logged and yields nothing. A document without a `ServerName`, or a
/// finding without any CVE id, is logged and skipped.
pub fn flatten(document: &ScanDocument, fields: &FieldList) -> Vec<FlatRow> {
    if document.host.server_name.is_empty() {
        error!("Target data not found.[ServerName] Skipping document.");
        return Vec::new();
    }

    let Some(scanned_cves) = &document.scanned_cves else {
        error!(
            server = %document.host.server_name,
            "Target data not found.[ScannedCves] Please check after running \"vuls report -format-json\"."
        );
        return Vec::new();
    };

    if scanned_cves.is_empty() {
        debug!(server = %document.host.server_name, "No findings, emitting healthy row.");
        return vec![healthy_row(document, fields)];
    }

    let mut rows = Vec::new();
    for (key, cve) in scanned_cves {
        let cve_id = if cve.cve_id.is_empty() { key.as_str() } else { cve.cve_id.as_str() };
        if cve_id.is_empty() {
            error!(server = %document.host.server_name, "Target data not found.[CveID] Skipping finding.");
            continue;
        }
        for package in package_set(&cve.cpe_names, &cve.affected_packages) {
            let installed = document.packages.get(package.name);
            if !package.is_cpe && installed.is_none() {
                warn!(cve = cve_id, package = package.name, "Package not in package list, skipping.");
                continue;
            }
            rows.push(finding_row(document, cve_id, cve, &package, installed, fields));
        }
    }
    rows
}

fn host_identity(row: &mut RowBuilder<'_>, document: &ScanDocument) {
    let host = &document.host;
    row.set_with(Field::ScannedAt, || format_date(&host.scanned_at))
        .set_with(Field::ServerName, || {
            if document.running_kernel.reboot_required {
                format!("{}{}", host.server_name, REBOOT_REQUIRED_SUFFIX)
            } else {
                host.server_name.clone()
            }
        })
        .set(Field::Family, host.family.as_str())
        .set(Field::Release, host.release.as_str())
        .set(Field::ContainerName, or_none(&host.container.name))
        .set(Field::ContainerId, or_none(&host.container.container_id))
        .set(Field::PlatformName, or_none(&host.platform.name))
        .set(Field::PlatformInstanceId, or_none(&host.platform.instance_id));
}

fn healthy_row(document: &ScanDocument, fields: &FieldList) -> FlatRow {
    let mut row = RowBuilder::new(fields);
    host_identity(&mut row, document);
    for field in fields.iter().filter(|f| !f.is_host_identity()) {
        row.set(field, HEALTHY);
    }
    row.build()
}

fn finding_row(
    document: &ScanDocument,
    cve_id: &str,
    cve: &ScannedCve,
    package: &PackageRef<'_>,
    installed: Option<&Package>,
    fields: &FieldList,
) -> FlatRow {
    let mut row = RowBuilder::new(fields);
    host_identity(&mut row, document);

    let method = cve.detection_method();
    row.set(Field::CveId, cve_id)
        .set(Field::PackagesName, package.name)
        .set_with(Field::PackagesVersion, || {
            format_version(installed.map(|p| (p.version.as_str(), p.release.as_str())))
        })
        .set_with(Field::PackagesNewVersion, || {
            format_version(installed.map(|p| (p.new_version.as_str(), p.new_release.as_str())))
        })
        .set(
            Field::NotFixedYet,
            package.not_fixed_yet.map(serde_json::Value::Bool).unwrap_or_else(|| UNKNOWN.into()),
        )
        .set(Field::DetectionMethod, method.unwrap_or(UNKNOWN))
        .set_with(Field::Changelog, || {
            if method == Some(CHANGELOG_EXACT_MATCH) {
                format!("{}_{}_{}", document.host.server_name, package.name, cve_id)
            } else {
                NONE.to_string()
            }
        })
        .set(
            Field::CweId,
            cve.cve_contents
                .get(AdvisorySource::Nvd.as_ref())
                .and_then(CveContent::cwe)
                .unwrap_or(NONE),
        );

    match resolve_advisory(&cve.cve_contents) {
        Some((source, content)) => advisory_cells(&mut row, source, content),
        None => {
            for field in ADVISORY_FIELDS {
                row.set(*field, UNKNOWN);
            }
        }
    }

    row.build()
}

fn advisory_cells(row: &mut RowBuilder<'_>, source: AdvisorySource, content: &CveContent) {
    let (score, severity) = score_and_severity(content);
    row.set(Field::CvssSource, source.as_ref())
        .set(Field::CvssScore, score)
        .set(Field::CvssSeverity, severity.as_ref());

    let v3: Option<DecodedVector> =
        (!content.cvss3_vector.is_empty()).then(|| Dialect::Cvss3.decode_vector(&content.cvss3_vector));
    let primary: Option<DecodedVector> = if !content.cvss2_vector.is_empty() {
        Some(Dialect::Cvss2.decode_vector(&content.cvss2_vector))
    } else {
        v3.clone()
    };

    for (metric, field) in VECTOR_FIELDS {
        row.set(*field, primary.as_ref().and_then(|d| d.get(*metric)).unwrap_or(UNKNOWN));
    }
    for (metric, field) in V3_ONLY_FIELDS {
        row.set(*field, v3.as_ref().and_then(|d| d.get(*metric)).unwrap_or(UNKNOWN));
    }

    row.set(Field::Title, content.title.as_str())
        .set(Field::Summary, content.summary.as_str())
        .set(Field::SourceLink, content.source_link.as_str())
        .set_with(Field::PublishedDate, || format_date(&content.published))
        .set_with(Field::LastModifiedDate, || format_date(&content.last_modified));
}
