use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AnomalyScore, RiskTier};

/// Running totals over every certificate the service has screened.
///
/// Kept separately from the evaluation history so retention never rewrites
/// the numbers reported here.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatisticsLedger {
    total: u64,
    score_sum: u64,
    tier_counts: BTreeMap<RiskTier, u64>,
    last_analysis: Option<DateTime<Utc>>,
}

impl StatisticsLedger {
    pub(crate) fn record(&mut self, score: &AnomalyScore) {
        self.total += 1;
        self.score_sum += u64::from(score.risk_score);
        *self.tier_counts.entry(score.risk_level).or_default() += 1;
        self.last_analysis = Some(
            self.last_analysis
                .map_or(score.evaluated_at, |last| last.max(score.evaluated_at)),
        );
    }

    pub(crate) fn snapshot(&self, history_size: usize) -> ScreeningStatistics {
        let flagged = [RiskTier::High, RiskTier::Critical]
            .iter()
            .filter_map(|tier| self.tier_counts.get(tier))
            .sum::<u64>();

        let (average_risk_score, fraud_detection_rate) = if self.total == 0 {
            (0.0, 0.0)
        } else {
            let total = self.total as f64;
            (self.score_sum as f64 / total, flagged as f64 / total)
        };

        let mut tier_counts = BTreeMap::new();
        for tier in [
            RiskTier::Low,
            RiskTier::Medium,
            RiskTier::High,
            RiskTier::Critical,
        ] {
            tier_counts.insert(tier, self.tier_counts.get(&tier).copied().unwrap_or(0));
        }

        ScreeningStatistics {
            total_certificates_analyzed: self.total,
            average_risk_score,
            flagged_certificates: flagged,
            fraud_detection_rate,
            tier_counts,
            history_size,
            last_analysis: self.last_analysis,
        }
    }
}

/// Public view of the screening totals, as served to the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningStatistics {
    pub total_certificates_analyzed: u64,
    pub average_risk_score: f64,
    pub flagged_certificates: u64,
    pub fraud_detection_rate: f64,
    pub tier_counts: BTreeMap<RiskTier, u64>,
    pub history_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analysis: Option<DateTime<Utc>>,
}
