use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AnomalyScore, CertificateSubmission};
use super::evaluation::{
    decide_issuance, AnomalyScorer, IssuanceDecision, ScoringConfig, ScoringConfigError,
};
use super::history::{EvaluationHistory, RetentionPolicy};
use super::statistics::{ScreeningStatistics, StatisticsLedger};

/// Score plus the issuance action derived from its tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningReport {
    pub score: AnomalyScore,
    pub decision: IssuanceDecision,
}

struct ScreeningState {
    history: EvaluationHistory,
    ledger: StatisticsLedger,
}

/// Thread-safe host for the scorer and its history.
///
/// Read-then-append on the history happens under one lock, so concurrent
/// requests observe each other's submissions in a single total order.
pub struct ScreeningService {
    scorer: AnomalyScorer,
    state: Mutex<ScreeningState>,
}

impl ScreeningService {
    pub fn new(
        config: ScoringConfig,
        retention: RetentionPolicy,
    ) -> Result<Self, ScoringConfigError> {
        Ok(Self::with_history(
            AnomalyScorer::new(config)?,
            EvaluationHistory::with_retention(retention),
        ))
    }

    pub fn with_history(scorer: AnomalyScorer, history: EvaluationHistory) -> Self {
        Self {
            scorer,
            state: Mutex::new(ScreeningState {
                history,
                ledger: StatisticsLedger::default(),
            }),
        }
    }

    pub fn scorer(&self) -> &AnomalyScorer {
        &self.scorer
    }

    pub fn screen(&self, submission: &CertificateSubmission) -> ScreeningReport {
        self.screen_at(submission, Utc::now())
    }

    pub fn screen_at(
        &self,
        submission: &CertificateSubmission,
        now: DateTime<Utc>,
    ) -> ScreeningReport {
        let mut state = self.lock();
        let score = self.scorer.evaluate_at(submission, &mut state.history, now);
        state.ledger.record(&score);
        drop(state);

        let decision = decide_issuance(&score);
        ScreeningReport { score, decision }
    }

    pub fn statistics(&self) -> ScreeningStatistics {
        let state = self.lock();
        state.ledger.snapshot(state.history.len())
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    // A panic cannot leave the history half-written, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ScreeningState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
