use serde::{Deserialize, Serialize};

use super::super::domain::{AnomalyScore, RiskTier};

/// Action the issuance workflow takes for a scored certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IssuanceDecision {
    Proceed,
    RequireConfirmation { reasons: Vec<String> },
    Block { reasons: Vec<String> },
}

impl IssuanceDecision {
    pub fn blocks_issuance(&self) -> bool {
        matches!(self, IssuanceDecision::Block { .. })
    }

    pub fn summary(&self) -> String {
        match self {
            IssuanceDecision::Proceed => "issuance may proceed".to_string(),
            IssuanceDecision::RequireConfirmation { reasons } => {
                if reasons.is_empty() {
                    "operator confirmation required".to_string()
                } else {
                    format!("operator confirmation required: {}", reasons.join("; "))
                }
            }
            IssuanceDecision::Block { reasons } => {
                if reasons.is_empty() {
                    "issuance blocked".to_string()
                } else {
                    format!("issuance blocked: {}", reasons.join("; "))
                }
            }
        }
    }
}

pub(crate) fn decide_issuance(score: &AnomalyScore) -> IssuanceDecision {
    let reasons = || {
        score
            .details
            .iter()
            .map(|finding| finding.description.clone())
            .collect::<Vec<_>>()
    };

    match score.risk_level {
        RiskTier::Critical => IssuanceDecision::Block { reasons: reasons() },
        RiskTier::High => IssuanceDecision::RequireConfirmation { reasons: reasons() },
        RiskTier::Medium | RiskTier::Low => IssuanceDecision::Proceed,
    }
}
