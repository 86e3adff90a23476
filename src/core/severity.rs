// src/core/severity.rs

use serde::Serialize;
use strum::{AsRefStr, Display};

/// Severity label derived from a CVSS base score.
///
/// Three rating schemes are in use: the legacy NVD rule (three tiers, no `None`),
/// CVSS v2 (four tiers) and CVSS v3 (five tiers, adds `Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Legacy NVD rating: anything below 4.0 is Low, including zero.
    pub fn from_nvd(score: f64) -> Self {
        match score {
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn from_cvss2(score: f64) -> Self {
        match score {
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::None,
        }
    }

    pub fn from_cvss3(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::None,
        }
    }
}
