use serde::{Deserialize, Serialize};

use super::super::domain::{AnomalyFlag, RiskTier};
use super::patterns::CompiledPatterns;

/// Tunable weights, thresholds and rule parameters for the scorer.
///
/// The defaults reproduce the hand-picked values the dashboard has always
/// used; none of them are calibrated against labelled fraud data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: RuleWeights,
    pub tiers: TierThresholds,
    pub disabled_rules: Vec<AnomalyFlag>,
    pub email: EmailRuleConfig,
    pub wallet: WalletRuleConfig,
    pub issuance: IssuanceRuleConfig,
    pub cgpa_scale: f64,
    pub min_shared_name_tokens: usize,
    /// Regexes matched against the institution name with leading
    /// whitespace removed.
    pub institution_placeholder_patterns: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: RuleWeights::default(),
            tiers: TierThresholds::default(),
            disabled_rules: Vec::new(),
            email: EmailRuleConfig::default(),
            wallet: WalletRuleConfig::default(),
            issuance: IssuanceRuleConfig::default(),
            cgpa_scale: 10.0,
            min_shared_name_tokens: 2,
            institution_placeholder_patterns: strings(&[
                "(?i)^test",
                "(?i)^fake",
                "(?i)^demo",
                "(?i)^school of",
                "(?i)^institute of",
            ]),
        }
    }
}

impl ScoringConfig {
    pub fn from_json(raw: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        self.validate_bounds()?;
        CompiledPatterns::compile(self)?;
        Ok(())
    }

    /// Every check except pattern compilation.
    pub(crate) fn validate_bounds(&self) -> Result<(), ScoringConfigError> {
        let TierThresholds {
            medium,
            high,
            critical,
        } = self.tiers;
        if !(medium < high && high < critical && critical <= 100) {
            return Err(ScoringConfigError::TierOrder {
                medium,
                high,
                critical,
            });
        }
        if self.min_shared_name_tokens == 0 {
            return Err(ScoringConfigError::NameTokens);
        }
        if self.issuance.quiet_hours_start > self.issuance.quiet_hours_end
            || self.issuance.quiet_hours_end > 23
        {
            return Err(ScoringConfigError::QuietHours {
                start: self.issuance.quiet_hours_start,
                end: self.issuance.quiet_hours_end,
            });
        }
        Ok(())
    }

    pub fn is_enabled(&self, flag: AnomalyFlag) -> bool {
        !self.disabled_rules.contains(&flag)
    }
}

/// Points contributed by each rule when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleWeights {
    pub suspicious_email: u16,
    pub suspicious_wallet: u16,
    pub potential_duplicate: u16,
    pub unusual_issuance_pattern: u16,
    pub cgpa_anomaly: u16,
    pub name_similarity: u16,
    pub institution_inconsistency: u16,
    pub unusual_issue_time: u16,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            suspicious_email: 15,
            suspicious_wallet: 25,
            potential_duplicate: 30,
            unusual_issuance_pattern: 20,
            cgpa_anomaly: 10,
            name_similarity: 15,
            institution_inconsistency: 5,
            unusual_issue_time: 8,
        }
    }
}

impl RuleWeights {
    pub fn weight(&self, flag: AnomalyFlag) -> u16 {
        match flag {
            AnomalyFlag::SuspiciousEmail => self.suspicious_email,
            AnomalyFlag::SuspiciousWallet => self.suspicious_wallet,
            AnomalyFlag::PotentialDuplicate => self.potential_duplicate,
            AnomalyFlag::UnusualIssuancePattern => self.unusual_issuance_pattern,
            AnomalyFlag::CgpaAnomaly => self.cgpa_anomaly,
            AnomalyFlag::NameSimilarityDetected => self.name_similarity,
            AnomalyFlag::InstitutionInconsistency => self.institution_inconsistency,
            AnomalyFlag::UnusualIssueTime => self.unusual_issue_time,
        }
    }
}

/// Lower bounds (inclusive) of each tier above `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub medium: u8,
    pub high: u8,
    pub critical: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: 40,
            high: 60,
            critical: 80,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, score: u8) -> RiskTier {
        if score >= self.critical {
            RiskTier::Critical
        } else if score >= self.high {
            RiskTier::High
        } else if score >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Email heuristics. An address is suspicious when any pattern matches or
/// when one character repeats more than `max_repeated_chars` times in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRuleConfig {
    pub suspicious_patterns: Vec<String>,
    pub max_repeated_chars: usize,
}

impl Default for EmailRuleConfig {
    fn default() -> Self {
        Self {
            suspicious_patterns: strings(&[
                "(?i)^test",
                "(?i)^admin",
                "(?i)^fake",
                "(?i)^demo",
                r"\d{6,}@",
                "(?i)tempmail|throwaway|mailinator|guerrillamail",
            ]),
            max_repeated_chars: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletRuleConfig {
    pub blacklisted_addresses: Vec<String>,
    pub min_distinct_chars: usize,
}

impl Default for WalletRuleConfig {
    fn default() -> Self {
        Self {
            blacklisted_addresses: strings(&[
                "0x0000000000000000000000000000000000000000",
                "0x1111111111111111111111111111111111111111",
            ]),
            min_distinct_chars: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceRuleConfig {
    pub max_age_years: u32,
    pub flag_weekends: bool,
    pub quiet_hours_start: u32,
    pub quiet_hours_end: u32,
}

impl Default for IssuanceRuleConfig {
    fn default() -> Self {
        Self {
            max_age_years: 20,
            flag_weekends: true,
            quiet_hours_start: 0,
            quiet_hours_end: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("invalid scoring config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tier thresholds must increase: medium {medium} < high {high} < critical {critical} <= 100")]
    TierOrder { medium: u8, high: u8, critical: u8 },
    #[error("min_shared_name_tokens must be at least 1")]
    NameTokens,
    #[error("quiet hours {start}..={end} are not a valid hour window")]
    QuietHours { start: u32, end: u32 },
    #[error("{field} entry '{pattern}' is not a valid regex: {source}")]
    Pattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
