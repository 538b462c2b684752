use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for certificates submitted for screening.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateId(pub String);

static CERTIFICATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl CertificateId {
    /// Allocate the next process-local identifier (`cert-000001`, ...).
    pub fn next() -> Self {
        let id = CERTIFICATE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        CertificateId(format!("cert-{id:06}"))
    }
}

/// Certificate issuance request handed to the scorer.
///
/// Fields are taken as provided: a malformed wallet or an odd-looking email is
/// something for the rules to flag, not a reason to reject the value. The
/// `issued_at` offset is treated as the issuer's local time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateSubmission {
    #[serde(default = "CertificateId::next")]
    pub certificate_id: CertificateId,
    pub student_name: String,
    pub student_email: String,
    pub student_wallet_address: String,
    pub course: String,
    pub institution: String,
    pub issued_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

/// Machine-readable name of a triggered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyFlag {
    SuspiciousEmail,
    SuspiciousWallet,
    PotentialDuplicate,
    UnusualIssuancePattern,
    CgpaAnomaly,
    NameSimilarityDetected,
    InstitutionInconsistency,
    UnusualIssueTime,
}

impl AnomalyFlag {
    pub const ALL: [AnomalyFlag; 8] = [
        AnomalyFlag::SuspiciousEmail,
        AnomalyFlag::SuspiciousWallet,
        AnomalyFlag::PotentialDuplicate,
        AnomalyFlag::UnusualIssuancePattern,
        AnomalyFlag::CgpaAnomaly,
        AnomalyFlag::NameSimilarityDetected,
        AnomalyFlag::InstitutionInconsistency,
        AnomalyFlag::UnusualIssueTime,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AnomalyFlag::SuspiciousEmail => "suspicious_email",
            AnomalyFlag::SuspiciousWallet => "suspicious_wallet",
            AnomalyFlag::PotentialDuplicate => "potential_duplicate",
            AnomalyFlag::UnusualIssuancePattern => "unusual_issuance_pattern",
            AnomalyFlag::CgpaAnomaly => "cgpa_anomaly",
            AnomalyFlag::NameSimilarityDetected => "name_similarity_detected",
            AnomalyFlag::InstitutionInconsistency => "institution_inconsistency",
            AnomalyFlag::UnusualIssueTime => "unusual_issue_time",
        }
    }

    /// Short label carried in the finding's `type` field.
    pub const fn finding_type(self) -> &'static str {
        match self {
            AnomalyFlag::SuspiciousEmail => "email_analysis",
            AnomalyFlag::SuspiciousWallet => "wallet_analysis",
            AnomalyFlag::PotentialDuplicate => "duplicate_detection",
            AnomalyFlag::UnusualIssuancePattern => "issuance_pattern",
            AnomalyFlag::CgpaAnomaly => "academic_data",
            AnomalyFlag::NameSimilarityDetected => "fraud_ring_detection",
            AnomalyFlag::InstitutionInconsistency => "institution_verification",
            AnomalyFlag::UnusualIssueTime => "temporal_pattern",
        }
    }
}

impl std::fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
}

/// One structured explanation of why a rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub severity: FindingSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Risk tier derived solely from the clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

/// Scorer output; rebuilt from scratch on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub certificate_id: CertificateId,
    pub risk_score: u8,
    pub risk_level: RiskTier,
    pub flags: Vec<AnomalyFlag>,
    pub details: Vec<AnomalyFinding>,
    pub evaluated_at: DateTime<Utc>,
}

impl AnomalyScore {
    pub fn has_flag(&self, flag: AnomalyFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn finding(&self, flag: AnomalyFlag) -> Option<&AnomalyFinding> {
        let kind = flag.finding_type();
        self.details.iter().find(|finding| finding.kind == kind)
    }
}
