use serde::{Deserialize, Serialize};

/// Registry situation of a supplier with the federal revenue service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Suspended,
    Inapt,
    Deregistered,
    Void,
    Unknown,
}

impl RegistrationStatus {
    /// Map the registry's uppercase Portuguese labels onto the enum.
    pub fn from_registry_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "ATIVA" => Self::Active,
            "SUSPENSA" => Self::Suspended,
            "INAPTA" => Self::Inapt,
            "BAIXADA" => Self::Deregistered,
            "NULA" => Self::Void,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Inapt => "inapt",
            Self::Deregistered => "deregistered",
            Self::Void => "void",
            Self::Unknown => "unknown",
        }
    }

    /// Payment-risk classification used by the batch auditor. Anything the
    /// registry no longer recognizes is critical; an unknown status is never
    /// downgraded to safe.
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::Active => RiskLevel::Ok,
            Self::Suspended | Self::Inapt => RiskLevel::Warning,
            Self::Deregistered | Self::Void | Self::Unknown => RiskLevel::Critical,
        }
    }
}

/// Coarse supplier risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Ok,
    Warning,
    Critical,
}

/// One registered business-activity code with its registry description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCode {
    pub code: String,
    pub description: String,
}

/// Normalized supplier record as returned by a directory provider,
/// independent of which provider produced it. The engine treats profiles as
/// read-only inputs; freshness is the cache's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProfile {
    /// Cleaned (digits-only) business registration number.
    pub registration: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub status: RegistrationStatus,
    pub primary_activity: ActivityCode,
    pub secondary_activities: Vec<ActivityCode>,
    /// Provider that produced the record.
    pub provider: String,
    /// Whether this copy was served from the profile cache.
    pub from_cache: bool,
    /// Raw provider payload, kept for troubleshooting only.
    pub raw: Option<serde_json::Value>,
}
