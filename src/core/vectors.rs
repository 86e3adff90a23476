//! Static lookup tables for CVSS vector strings.
//!
//! A vector such as `(AV:N/AC:L/Au:N/C:P/I:P/A:P)` is decoded position by position:
//! every position expects one metric, and the `<metric>:<value>` pair found there
//! is translated into the canonical label used in the reports (`NETWORK`, `LOW`, ...).
//! Three dialects exist. JVN and CVSS v2 share the same six metrics but spell the
//! Authentication labels differently; CVSS v3 drops Authentication and adds
//! Privileges Required, User Interaction and Scope.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// A single metric that can appear in a vector string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    AccessVector,
    AccessComplexity,
    Authentication,
    PrivilegesRequired,
    UserInteraction,
    Scope,
    Confidentiality,
    Integrity,
    Availability,
}

impl Metric {
    /// The short code used for this metric inside a vector string.
    pub fn code(&self) -> &'static str {
        match self {
            Metric::AccessVector => "AV",
            Metric::AccessComplexity => "AC",
            Metric::Authentication => "Au",
            Metric::PrivilegesRequired => "PR",
            Metric::UserInteraction => "UI",
            Metric::Scope => "S",
            Metric::Confidentiality => "C",
            Metric::Integrity => "I",
            Metric::Availability => "A",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The vector dialects understood by the decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Jvn,
    Cvss2,
    Cvss3,
}

/// One entry of a decoding table: `<metric>:<value>` maps to `label`.
struct VectorLabel {
    metric: Metric,
    value: &'static str,
    label: &'static str,
}

const fn entry(metric: Metric, value: &'static str, label: &'static str) -> VectorLabel {
    VectorLabel { metric, value, label }
}

// --- Tabelle di decodifica ---
// Decoding tables

static JVN_LABELS: &[VectorLabel] = &[
    entry(Metric::AccessVector, "L", "LOCAL"),
    entry(Metric::AccessVector, "A", "ADJACENT_NETWORK"),
    entry(Metric::AccessVector, "N", "NETWORK"),
    entry(Metric::AccessComplexity, "H", "HIGH"),
    entry(Metric::AccessComplexity, "M", "MEDIUM"),
    entry(Metric::AccessComplexity, "L", "LOW"),
    entry(Metric::Authentication, "N", "NONE"),
    entry(Metric::Authentication, "S", "SINGLE_INSTANCE"),
    entry(Metric::Authentication, "M", "MULTIPLE_INSTANCES"),
    entry(Metric::Confidentiality, "N", "NONE"),
    entry(Metric::Confidentiality, "P", "PARTIAL"),
    entry(Metric::Confidentiality, "C", "COMPLETE"),
    entry(Metric::Integrity, "N", "NONE"),
    entry(Metric::Integrity, "P", "PARTIAL"),
    entry(Metric::Integrity, "C", "COMPLETE"),
    entry(Metric::Availability, "N", "NONE"),
    entry(Metric::Availability, "P", "PARTIAL"),
    entry(Metric::Availability, "C", "COMPLETE"),
];

static CVSS2_LABELS: &[VectorLabel] = &[
    entry(Metric::AccessVector, "L", "LOCAL"),
    entry(Metric::AccessVector, "A", "ADJACENT_NETWORK"),
    entry(Metric::AccessVector, "N", "NETWORK"),
    entry(Metric::AccessComplexity, "H", "HIGH"),
    entry(Metric::AccessComplexity, "M", "MEDIUM"),
    entry(Metric::AccessComplexity, "L", "LOW"),
    entry(Metric::Authentication, "N", "NONE"),
    entry(Metric::Authentication, "S", "SINGLE"),
    entry(Metric::Authentication, "M", "MULTIPLE"),
    entry(Metric::Confidentiality, "N", "NONE"),
    entry(Metric::Confidentiality, "P", "PARTIAL"),
    entry(Metric::Confidentiality, "C", "COMPLETE"),
    entry(Metric::Integrity, "N", "NONE"),
    entry(Metric::Integrity, "P", "PARTIAL"),
    entry(Metric::Integrity, "C", "COMPLETE"),
    entry(Metric::Availability, "N", "NONE"),
    entry(Metric::Availability, "P", "PARTIAL"),
    entry(Metric::Availability, "C", "COMPLETE"),
];

static CVSS3_LABELS: &[VectorLabel] = &[
    entry(Metric::AccessVector, "N", "NETWORK"),
    entry(Metric::AccessVector, "A", "ADJACENT_NETWORK"),
    entry(Metric::AccessVector, "L", "LOCAL"),
    entry(Metric::AccessVector, "P", "PHYSICAL"),
    entry(Metric::AccessComplexity, "L", "LOW"),
    entry(Metric::AccessComplexity, "H", "HIGH"),
    entry(Metric::PrivilegesRequired, "N", "NONE"),
    entry(Metric::PrivilegesRequired, "L", "LOW"),
    entry(Metric::PrivilegesRequired, "H", "HIGH"),
    entry(Metric::UserInteraction, "N", "NONE"),
    entry(Metric::UserInteraction, "R", "REQUIRED"),
    entry(Metric::Scope, "U", "UNCHANGED"),
    entry(Metric::Scope, "C", "CHANGED"),
    entry(Metric::Confidentiality, "H", "HIGH"),
    entry(Metric::Confidentiality, "L", "LOW"),
    entry(Metric::Confidentiality, "N", "NONE"),
    entry(Metric::Integrity, "H", "HIGH"),
    entry(Metric::Integrity, "L", "LOW"),
    entry(Metric::Integrity, "N", "NONE"),
    entry(Metric::Availability, "H", "HIGH"),
    entry(Metric::Availability, "L", "LOW"),
    entry(Metric::Availability, "N", "NONE"),
];

const V2_LAYOUT: &[Metric] = &[
    Metric::AccessVector,
    Metric::AccessComplexity,
    Metric::Authentication,
    Metric::Confidentiality,
    Metric::Integrity,
    Metric::Availability,
];

const V3_LAYOUT: &[Metric] = &[
    Metric::AccessVector,
    Metric::AccessComplexity,
    Metric::PrivilegesRequired,
    Metric::UserInteraction,
    Metric::Scope,
    Metric::Confidentiality,
    Metric::Integrity,
    Metric::Availability,
];

static RE_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()]").unwrap());
static RE_V3_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^CVSS:3\.\d+/").unwrap());

impl Dialect {
    fn labels(self) -> &'static [VectorLabel] {
        match self {
            Dialect::Jvn => JVN_LABELS,
            Dialect::Cvss2 => CVSS2_LABELS,
            Dialect::Cvss3 => CVSS3_LABELS,
        }
    }

    /// The metric expected at each position of a vector in this dialect.
    pub fn layout(self) -> &'static [Metric] {
        match self {
            Dialect::Jvn | Dialect::Cvss2 => V2_LAYOUT,
            Dialect::Cvss3 => V3_LAYOUT,
        }
    }

    /// Decodes a single `<metric>:<value>` component, e.g. `AV:N`.
    ///
    /// Returns `None` for an unknown metric code, an unknown value code or a
    /// malformed component.
    pub fn decode(self, component: &str) -> Option<&'static str> {
        let (code, value) = component.trim().split_once(':')?;
        self.labels()
            .iter()
            .find(|l| l.metric.code() == code && l.value == value)
            .map(|l| l.label)
    }

    /// Decodes a full vector string positionally.
    ///
    /// Each position is checked against the metric this dialect expects there;
    /// a component carrying a different metric code decodes to `None`.
    pub fn decode_vector(self, vector: &str) -> DecodedVector {
        let cleaned = RE_PARENS.replace_all(vector.trim(), "");
        let body = match self {
            Dialect::Cvss3 => RE_V3_PREFIX.replace(&cleaned, "").into_owned(),
            _ => cleaned.into_owned(),
        };
        let components: Vec<&str> = body.split('/').collect();

        let labels = self
            .layout()
            .iter()
            .enumerate()
            .map(|(position, metric)| {
                let label = components
                    .get(position)
                    .filter(|c| c.split(':').next() == Some(metric.code()))
                    .and_then(|c| self.decode(c));
                (*metric, label)
            })
            .collect();

        DecodedVector { labels }
    }
}

/// The per-metric result of decoding one vector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVector {
    labels: Vec<(Metric, Option<&'static str>)>,
}

impl DecodedVector {
    /// The canonical label for `metric`, if it was present and recognised.
    pub fn get(&self, metric: Metric) -> Option<&'static str> {
        self.labels
            .iter()
            .find(|(m, _)| *m == metric)
            .and_then(|(_, label)| *label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<&'static str>)> + '_ {
        self.labels.iter().copied()
    }
}

pub fn decode_jvn(component: &str) -> Option<&'static str> {
    Dialect::Jvn.decode(component)
}

pub fn decode_cvss2(component: &str) -> Option<&'static str> {
    Dialect::Cvss2.decode(component)
}

pub fn decode_cvss3(component: &str) -> Option<&'static str> {
    Dialect::Cvss3.decode(component)
}
