//! Certificate anomaly screening.
//!
//! A submission is run through a table of independent heuristic rules, the
//! triggered weights are summed and saturated at 100, and the score is mapped
//! to a risk tier and an issuance decision. Every scored submission is kept in
//! an indexed, caller-owned history that later submissions are compared with.

pub mod batch;
pub mod domain;
pub mod evaluation;
pub mod history;
pub mod router;
pub mod service;
mod statistics;

#[cfg(test)]
mod tests;

pub use batch::{
    BatchImportError, BatchScreener, BatchScreeningReport, RejectedRow, RowWarning,
    DEFAULT_BATCH_INSTITUTION,
};
pub use domain::{
    AnomalyFinding, AnomalyFlag, AnomalyScore, CertificateId, CertificateSubmission,
    FindingSeverity, RiskTier,
};
pub use evaluation::{
    AnomalyScorer, EmailRuleConfig, IssuanceDecision, IssuanceRuleConfig, RuleWeights,
    ScoringConfig, ScoringConfigError, TierThresholds, WalletRuleConfig,
};
pub use history::{EvaluationHistory, HistoryEntry, RetentionPolicy, MAX_RETENTION_DAYS};
pub use router::{screening_router, BatchScreeningRequest};
pub use service::{ScreeningReport, ScreeningService};
pub use statistics::ScreeningStatistics;
