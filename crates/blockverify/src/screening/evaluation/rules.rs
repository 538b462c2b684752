use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde_json::{json, Value};

use super::super::domain::{AnomalyFinding, AnomalyFlag, CertificateSubmission, FindingSeverity};
use super::super::history::EvaluationHistory;
use super::config::ScoringConfig;
use super::patterns::{
    name_tokens, normalize_wallet, suspicious_wallet_pattern, CompiledPatterns, WalletPattern,
};

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Everything a rule may look at. History is read-only here; the scorer
/// appends only after every rule has run.
pub(crate) struct RuleContext<'a> {
    pub submission: &'a CertificateSubmission,
    pub history: &'a EvaluationHistory,
    pub config: &'a ScoringConfig,
    pub patterns: &'a CompiledPatterns,
    pub now: DateTime<Utc>,
}

/// What a rule reports when its condition holds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Detection {
    pub description: String,
    pub value: Option<Value>,
}

impl Detection {
    fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            value: None,
        }
    }

    fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// A heuristic described as data: its flag, finding severity and predicate.
/// The weight lives in `ScoringConfig` so tuning never touches this table.
pub(crate) struct Rule {
    pub flag: AnomalyFlag,
    pub severity: FindingSeverity,
    predicate: fn(&RuleContext<'_>) -> Option<Detection>,
}

impl Rule {
    pub(crate) fn check(&self, context: &RuleContext<'_>) -> Option<Detection> {
        (self.predicate)(context)
    }

    pub(crate) fn finding(&self, detection: Detection) -> AnomalyFinding {
        AnomalyFinding {
            kind: self.flag.finding_type().to_string(),
            description: detection.description,
            severity: self.severity,
            value: detection.value,
        }
    }
}

pub(crate) fn standard_rules() -> Vec<Rule> {
    vec![
        Rule {
            flag: AnomalyFlag::SuspiciousEmail,
            severity: FindingSeverity::Medium,
            predicate: suspicious_email,
        },
        Rule {
            flag: AnomalyFlag::SuspiciousWallet,
            severity: FindingSeverity::High,
            predicate: suspicious_wallet,
        },
        Rule {
            flag: AnomalyFlag::PotentialDuplicate,
            severity: FindingSeverity::High,
            predicate: potential_duplicate,
        },
        Rule {
            flag: AnomalyFlag::UnusualIssuancePattern,
            severity: FindingSeverity::Medium,
            predicate: unusual_issuance_pattern,
        },
        Rule {
            flag: AnomalyFlag::CgpaAnomaly,
            severity: FindingSeverity::Low,
            predicate: cgpa_anomaly,
        },
        Rule {
            flag: AnomalyFlag::NameSimilarityDetected,
            severity: FindingSeverity::Medium,
            predicate: name_similarity,
        },
        Rule {
            flag: AnomalyFlag::InstitutionInconsistency,
            severity: FindingSeverity::Low,
            predicate: institution_inconsistency,
        },
        Rule {
            flag: AnomalyFlag::UnusualIssueTime,
            severity: FindingSeverity::Low,
            predicate: unusual_issue_time,
        },
    ]
}

fn suspicious_email(context: &RuleContext<'_>) -> Option<Detection> {
    let email = &context.submission.student_email;
    let pattern = context.patterns.suspicious_email(email)?;
    Some(
        Detection::new(format!(
            "email address matches suspicious pattern: {}",
            pattern.describe()
        ))
        .with_value(json!(email)),
    )
}

fn suspicious_wallet(context: &RuleContext<'_>) -> Option<Detection> {
    let address = &context.submission.student_wallet_address;
    let description = match suspicious_wallet_pattern(address, &context.config.wallet)? {
        WalletPattern::Blacklisted => "wallet address is a known placeholder address".to_string(),
        WalletPattern::LowEntropy { distinct } => {
            format!("wallet address uses only {distinct} distinct characters")
        }
    };
    Some(Detection::new(description).with_value(json!(address)))
}

/// The first prior entry that matches any of the three conditions decides the
/// reason; conditions are tried in order for each entry.
fn potential_duplicate(context: &RuleContext<'_>) -> Option<Detection> {
    let current = context.submission;
    let wallet = normalize_wallet(&current.student_wallet_address);

    for entry in context
        .history
        .duplicate_candidates(&current.student_email, &current.student_wallet_address)
    {
        let prior = &entry.submission;
        let same_email = prior.student_email == current.student_email;

        let reason = if same_email
            && prior.course == current.course
            && prior.institution == current.institution
        {
            Some("exact duplicate: same student email, course and institution")
        } else if same_email
            && prior.course != current.course
            && prior.issued_at.date_naive() == current.issued_at.date_naive()
        {
            Some("same email issued multiple certificates on the same day")
        } else if normalize_wallet(&prior.student_wallet_address) == wallet
            && prior.student_name != current.student_name
        {
            Some("same wallet used by different students")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Some(Detection::new(reason).with_value(json!(prior.certificate_id.0)));
        }
    }

    None
}

fn unusual_issuance_pattern(context: &RuleContext<'_>) -> Option<Detection> {
    let issued_at = context.submission.issued_at;
    let issued_utc = issued_at.with_timezone(&Utc);
    let settings = context.config.issuance;

    if issued_utc > context.now {
        return Some(
            Detection::new("certificate issue date is in the future")
                .with_value(json!(issued_at.to_rfc3339())),
        );
    }

    let age_years = (context.now - issued_utc).num_seconds() as f64 / SECONDS_PER_YEAR;
    if age_years > f64::from(settings.max_age_years) {
        return Some(
            Detection::new(format!("certificate is unusually old: {age_years:.1} years"))
                .with_value(json!((age_years * 10.0).round() / 10.0)),
        );
    }

    let weekday = issued_at.weekday();
    if settings.flag_weekends && matches!(weekday, Weekday::Sat | Weekday::Sun) {
        return Some(
            Detection::new(format!("certificate issued on a weekend ({weekday})"))
                .with_value(json!(issued_at.date_naive().to_string())),
        );
    }

    None
}

fn cgpa_anomaly(context: &RuleContext<'_>) -> Option<Detection> {
    let cgpa = context.submission.cgpa.filter(|value| !value.is_nan())?;
    let scale = context.config.cgpa_scale;

    if cgpa < 0.0 || cgpa > scale {
        Some(Detection::new(format!("CGPA out of valid range: {cgpa}")).with_value(json!(cgpa)))
    } else if cgpa == scale {
        Some(
            Detection::new(format!("perfect CGPA ({scale:.1}) is statistically rare"))
                .with_value(json!(cgpa)),
        )
    } else {
        None
    }
}

fn name_similarity(context: &RuleContext<'_>) -> Option<Detection> {
    let min_shared = context.config.min_shared_name_tokens;
    let tokens = name_tokens(&context.submission.student_name);
    if tokens.len() < min_shared {
        return None;
    }

    let similar: Vec<String> = context
        .history
        .similar_names(&tokens, min_shared)
        .into_iter()
        .map(|entry| entry.submission.student_name.clone())
        .collect();
    if similar.is_empty() {
        return None;
    }

    Some(
        Detection::new(format!("similar names detected: {}", similar.join(", ")))
            .with_value(json!(similar)),
    )
}

fn institution_inconsistency(context: &RuleContext<'_>) -> Option<Detection> {
    let institution = context.submission.institution.trim_start();
    if !context.patterns.placeholder_institution(institution) {
        return None;
    }
    Some(
        Detection::new("institution name looks generic or like a placeholder")
            .with_value(json!(context.submission.institution)),
    )
}

fn unusual_issue_time(context: &RuleContext<'_>) -> Option<Detection> {
    let issued_at = context.submission.issued_at;
    let settings = context.config.issuance;
    let hour = issued_at.hour();
    if !(settings.quiet_hours_start..=settings.quiet_hours_end).contains(&hour) {
        return None;
    }
    Some(
        Detection::new(format!(
            "certificate issued at unusual hour: {hour:02}:00 ({})",
            issued_at.to_rfc3339()
        ))
        .with_value(json!(hour)),
    )
}
