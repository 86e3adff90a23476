// src/core/fields.rs

use crate::error::ConvertError;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Which Vuls result layout the input documents follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Schema {
    /// `ScannedCves` map keyed by CVE ID, with per-source `CveContents`.
    #[default]
    Current,
    /// `KnownCves` / `UnknownCves` lists with a fixed NVD/JVN `CveDetail`.
    Legacy,
}

/// Every column the converter knows how to compute.
///
/// The string form is the column header and the document key sent to the index,
/// so the spellings are part of the output format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
    Display,
)]
pub enum Field {
    // --- Host identity ---
    #[strum(serialize = "ScannedAt")]
    ScannedAt,
    #[strum(serialize = "ServerName")]
    ServerName,
    #[strum(serialize = "Family")]
    Family,
    #[strum(serialize = "Release")]
    Release,
    #[strum(serialize = "Container_Name")]
    ContainerName,
    #[strum(serialize = "Container_ContainerID")]
    ContainerId,
    #[strum(serialize = "Platform_Name")]
    PlatformName,
    #[strum(serialize = "Platform_InstanceID")]
    PlatformInstanceId,

    // --- Finding ---
    #[strum(serialize = "CveID")]
    CveId,
    #[strum(serialize = "Packages_Name")]
    PackagesName,
    #[strum(serialize = "Packages_Version")]
    PackagesVersion,
    #[strum(serialize = "Packages_NewVersion")]
    PackagesNewVersion,
    #[strum(serialize = "NotFixedYet")]
    NotFixedYet,
    #[strum(serialize = "DetectionMethod")]
    DetectionMethod,
    #[strum(serialize = "Changelog")]
    Changelog,
    #[strum(serialize = "CweID")]
    CweId,

    // --- Resolved advisory (current schema) ---
    #[strum(serialize = "CVSS_Source")]
    CvssSource,
    #[strum(serialize = "CVSS_Score")]
    CvssScore,
    #[strum(serialize = "CVSS_Severity")]
    CvssSeverity,
    #[strum(serialize = "CVSS_AccessVector")]
    CvssAccessVector,
    #[strum(serialize = "CVSS_AccessComplexity")]
    CvssAccessComplexity,
    #[strum(serialize = "CVSS_Authentication")]
    CvssAuthentication,
    #[strum(serialize = "CVSS_ConfidentialityImpact")]
    CvssConfidentialityImpact,
    #[strum(serialize = "CVSS_IntegrityImpact")]
    CvssIntegrityImpact,
    #[strum(serialize = "CVSS_AvailabilityImpact")]
    CvssAvailabilityImpact,
    #[strum(serialize = "CVSS_PrivilegesRequired")]
    CvssPrivilegesRequired,
    #[strum(serialize = "CVSS_UserInteraction")]
    CvssUserInteraction,
    #[strum(serialize = "CVSS_Scope")]
    CvssScope,
    #[strum(serialize = "Title")]
    Title,
    #[strum(serialize = "Summary")]
    Summary,
    #[strum(serialize = "SourceLink")]
    SourceLink,
    #[strum(serialize = "PublishedDate")]
    PublishedDate,
    #[strum(serialize = "LastModifiedDate")]
    LastModifiedDate,

    // --- NVD detail (legacy schema) ---
    #[strum(serialize = "NVD_Score")]
    NvdScore,
    #[strum(serialize = "NVD_Severity")]
    NvdSeverity,
    #[strum(serialize = "NVD_AcessVector")]
    NvdAccessVector,
    #[strum(serialize = "NVD_AccessComplexity")]
    NvdAccessComplexity,
    #[strum(serialize = "NVD_Authentication")]
    NvdAuthentication,
    #[strum(serialize = "NVD_ConfidentialityImpact")]
    NvdConfidentialityImpact,
    #[strum(serialize = "NVD_IntegrityImpact")]
    NvdIntegrityImpact,
    #[strum(serialize = "NVD_AvailabilityImpact")]
    NvdAvailabilityImpact,
    #[strum(serialize = "NVD_CweID")]
    NvdCweId,
    #[strum(serialize = "NVD_Summary")]
    NvdSummary,
    #[strum(serialize = "NVD_PublishedDate")]
    NvdPublishedDate,
    #[strum(serialize = "NVD_LastModifiedDate")]
    NvdLastModifiedDate,

    // --- JVN detail (legacy schema) ---
    #[strum(serialize = "JVN_Score")]
    JvnScore,
    #[strum(serialize = "JVN_Severity")]
    JvnSeverity,
    #[strum(serialize = "JVN_AcessVector")]
    JvnAccessVector,
    #[strum(serialize = "JVN_AccessComplexity")]
    JvnAccessComplexity,
    #[strum(serialize = "JVN_Authentication")]
    JvnAuthentication,
    #[strum(serialize = "JVN_ConfidentialityImpact")]
    JvnConfidentialityImpact,
    #[strum(serialize = "JVN_IntegrityImpact")]
    JvnIntegrityImpact,
    #[strum(serialize = "JVN_AvailabilityImpact")]
    JvnAvailabilityImpact,
    #[strum(serialize = "JVN_Title")]
    JvnTitle,
    #[strum(serialize = "JVN_Summary")]
    JvnSummary,
    #[strum(serialize = "JVN_JvnLink")]
    JvnLink,
    #[strum(serialize = "JVN_PublishedDate")]
    JvnPublishedDate,
    #[strum(serialize = "JVN_LastModifiedDate")]
    JvnLastModifiedDate,
    #[strum(serialize = "JVN_ID")]
    JvnId,
}

impl Field {
    /// Columns describing the scanned host rather than a vulnerability.
    pub fn is_host_identity(&self) -> bool {
        matches!(
            self,
            Field::ScannedAt
                | Field::ServerName
                | Field::Family
                | Field::Release
                | Field::ContainerName
                | Field::ContainerId
                | Field::PlatformName
                | Field::PlatformInstanceId
        )
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

const LEGACY_DEFAULT_FIELDS: &[Field] = &[
    Field::ScannedAt,
    Field::ServerName,
    Field::Family,
    Field::Release,
    Field::ContainerName,
    Field::ContainerId,
    Field::PlatformName,
    Field::PlatformInstanceId,
    Field::CveId,
    Field::PackagesName,
    Field::NvdScore,
    Field::NvdSeverity,
    Field::NvdAccessVector,
    Field::NvdAccessComplexity,
    Field::NvdAuthentication,
    Field::NvdConfidentialityImpact,
    Field::NvdIntegrityImpact,
    Field::NvdAvailabilityImpact,
    Field::NvdCweId,
    Field::NvdSummary,
    Field::NvdPublishedDate,
    Field::NvdLastModifiedDate,
    Field::JvnScore,
    Field::JvnSeverity,
    Field::JvnAccessVector,
    Field::JvnAccessComplexity,
    Field::JvnAuthentication,
    Field::JvnConfidentialityImpact,
    Field::JvnIntegrityImpact,
    Field::JvnAvailabilityImpact,
    Field::JvnTitle,
    Field::JvnSummary,
    Field::JvnLink,
    Field::JvnPublishedDate,
    Field::JvnLastModifiedDate,
    Field::JvnId,
];

const CURRENT_DEFAULT_FIELDS: &[Field] = &[
    Field::ScannedAt,
    Field::ServerName,
    Field::Family,
    Field::Release,
    Field::ContainerName,
    Field::PlatformName,
    Field::CveId,
    Field::PackagesName,
    Field::PackagesVersion,
    Field::PackagesNewVersion,
    Field::NotFixedYet,
    Field::DetectionMethod,
    Field::Changelog,
    Field::CweId,
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
    Field::Summary,
    Field::PublishedDate,
    Field::LastModifiedDate,
];

/// Ordered allow-list of output columns.
///
/// Membership decides which attributes a row carries at all; the order is the
/// CSV column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList {
    order: Vec<Field>,
    members: HashSet<Field>,
}

impl FieldList {
    /// Builds a list from `fields`, keeping the first occurrence of duplicates.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut order = Vec::new();
        let mut members = HashSet::new();
        for field in fields {
            if members.insert(field) {
                order.push(field);
            }
        }
        Self { order, members }
    }

    pub fn defaults(schema: Schema) -> Self {
        match schema {
            Schema::Current => Self::new(CURRENT_DEFAULT_FIELDS.iter().copied()),
            Schema::Legacy => Self::new(LEGACY_DEFAULT_FIELDS.iter().copied()),
        }
    }

    /// Every known column, in declaration order.
    pub fn all() -> Self {
        Self::new(Field::iter())
    }

    /// Parses column names; an unknown name is a configuration error.
    pub fn from_names<I, S>(names: I) -> Result<Self, ConvertError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                Field::from_str(name).map_err(|_| ConvertError::config(format!("unknown field in config: {name}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if fields.is_empty() {
            return Err(ConvertError::config("config field list is empty"));
        }
        Ok(Self::new(fields))
    }

    /// Loads a JSON array of column names from `path`.
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::config(format!("config file not readable [{}]: {e}", path.display()))
        })?;
        let names: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            ConvertError::config(format!("config file is not a JSON array of strings [{}]: {e}", path.display()))
        })?;
        Self::from_names(names)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.members.contains(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.order.iter().copied()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.order.iter().map(|f| <&'static str>::from(*f)).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
