mod config;
pub(crate) mod patterns;
mod policy;
mod rules;

pub use config::{
    EmailRuleConfig, IssuanceRuleConfig, RuleWeights, ScoringConfig, ScoringConfigError,
    TierThresholds, WalletRuleConfig,
};
pub use policy::IssuanceDecision;

pub(crate) use policy::decide_issuance;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{AnomalyFinding, AnomalyFlag, AnomalyScore, CertificateSubmission, RiskTier};
use super::history::EvaluationHistory;
use patterns::CompiledPatterns;
use rules::{Rule, RuleContext};

const MAX_SCORE: u32 = 100;

/// Runs the rule table against one submission.
///
/// Every enabled rule runs; none short-circuits another. The score is the sum
/// of the weights of the rules that fired, saturated at 100.
pub struct AnomalyScorer {
    config: ScoringConfig,
    patterns: CompiledPatterns,
    rules: Vec<Rule>,
}

impl AnomalyScorer {
    /// Validates `config` and compiles its patterns.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        config.validate_bounds()?;
        let patterns = CompiledPatterns::compile(&config)?;
        Ok(Self {
            config,
            patterns,
            rules: rules::standard_rules(),
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `submission` as of now and append it to `history`.
    pub fn evaluate(
        &self,
        submission: &CertificateSubmission,
        history: &mut EvaluationHistory,
    ) -> AnomalyScore {
        self.evaluate_at(submission, history, Utc::now())
    }

    /// Score `submission` as of `now`, then append it to `history` whatever
    /// the outcome.
    pub fn evaluate_at(
        &self,
        submission: &CertificateSubmission,
        history: &mut EvaluationHistory,
        now: DateTime<Utc>,
    ) -> AnomalyScore {
        let score = self.assess(submission, history, now);
        history.record(submission.clone(), now);
        score
    }

    /// Score without recording; `history` is only read.
    pub fn assess(
        &self,
        submission: &CertificateSubmission,
        history: &EvaluationHistory,
        now: DateTime<Utc>,
    ) -> AnomalyScore {
        let context = RuleContext {
            submission,
            history,
            config: &self.config,
            patterns: &self.patterns,
            now,
        };

        let tally = self
            .rules
            .iter()
            .filter(|rule| self.config.is_enabled(rule.flag))
            .fold(Tally::default(), |mut tally, rule| {
                if let Some(detection) = rule.check(&context) {
                    let weight = self.config.weights.weight(rule.flag);
                    debug!(
                        certificate_id = %submission.certificate_id.0,
                        flag = %rule.flag,
                        weight,
                        "screening rule triggered"
                    );
                    tally.points += u32::from(weight);
                    tally.flags.push(rule.flag);
                    tally.details.push(rule.finding(detection));
                }
                tally
            });

        let risk_score = u8::try_from(tally.points.min(MAX_SCORE)).unwrap_or(u8::MAX);
        let risk_level = self.config.tiers.classify(risk_score);

        if risk_level >= RiskTier::High {
            warn!(
                certificate_id = %submission.certificate_id.0,
                risk_score,
                risk_level = risk_level.label(),
                flags = tally.flags.len(),
                "certificate screening flagged elevated risk"
            );
        } else {
            info!(
                certificate_id = %submission.certificate_id.0,
                risk_score,
                risk_level = risk_level.label(),
                flags = tally.flags.len(),
                "certificate screened"
            );
        }

        AnomalyScore {
            certificate_id: submission.certificate_id.clone(),
            risk_score,
            risk_level,
            flags: tally.flags,
            details: tally.details,
            evaluated_at: now,
        }
    }
}

#[derive(Default)]
struct Tally {
    points: u32,
    flags: Vec<AnomalyFlag>,
    details: Vec<AnomalyFinding>,
}
