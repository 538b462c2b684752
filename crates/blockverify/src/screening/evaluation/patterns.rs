use std::collections::BTreeSet;

use regex::Regex;

use super::config::{ScoringConfig, ScoringConfigError, WalletRuleConfig};

/// Email and institution patterns from a [`ScoringConfig`], compiled once.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPatterns {
    email: Vec<Regex>,
    institution: Vec<Regex>,
    max_repeated_chars: usize,
}

impl CompiledPatterns {
    pub(crate) fn compile(config: &ScoringConfig) -> Result<Self, ScoringConfigError> {
        Ok(Self {
            email: compile_all("email.suspicious_patterns", &config.email.suspicious_patterns)?,
            institution: compile_all(
                "institution_placeholder_patterns",
                &config.institution_placeholder_patterns,
            )?,
            max_repeated_chars: config.email.max_repeated_chars,
        })
    }

    /// First configured pattern the address matches, then the repeat-run check.
    pub(crate) fn suspicious_email(&self, email: &str) -> Option<EmailPattern<'_>> {
        if let Some(regex) = self.email.iter().find(|regex| regex.is_match(email)) {
            return Some(EmailPattern::Matches(regex.as_str()));
        }
        if longest_repeat_run(email) > self.max_repeated_chars {
            return Some(EmailPattern::RepeatedCharacters);
        }
        None
    }

    pub(crate) fn placeholder_institution(&self, institution: &str) -> bool {
        self.institution.iter().any(|regex| regex.is_match(institution))
    }
}

fn compile_all(field: &'static str, patterns: &[String]) -> Result<Vec<Regex>, ScoringConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ScoringConfigError::Pattern {
                field,
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Which email heuristic matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmailPattern<'a> {
    Matches(&'a str),
    RepeatedCharacters,
}

impl EmailPattern<'_> {
    pub(crate) fn describe(&self) -> String {
        match self {
            EmailPattern::Matches(pattern) => format!("/{pattern}/"),
            EmailPattern::RepeatedCharacters => "repeated character run".to_string(),
        }
    }
}

// `regex` has no backreferences, so `(.)\1{n,}` is scanned by hand.
fn longest_repeat_run(value: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut previous = None;
    for ch in value.chars() {
        if Some(ch) == previous {
            run += 1;
        } else {
            run = 1;
            previous = Some(ch);
        }
        longest = longest.max(run);
    }
    longest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalletPattern {
    Blacklisted,
    LowEntropy { distinct: usize },
}

/// Malformed addresses are judged on whatever follows the `0x` prefix.
pub(crate) fn suspicious_wallet_pattern(
    address: &str,
    config: &WalletRuleConfig,
) -> Option<WalletPattern> {
    let lowered = address.trim().to_lowercase();
    if config
        .blacklisted_addresses
        .iter()
        .any(|blocked| blocked.to_lowercase() == lowered)
    {
        return Some(WalletPattern::Blacklisted);
    }

    let digits = lowered.strip_prefix("0x").unwrap_or(&lowered);
    let distinct = digits.chars().collect::<BTreeSet<_>>().len();
    if distinct < config.min_distinct_chars {
        return Some(WalletPattern::LowEntropy { distinct });
    }
    None
}

pub(crate) fn normalize_wallet(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Distinct lower-cased whitespace tokens of a student name.
pub(crate) fn name_tokens(name: &str) -> BTreeSet<String> {
    name.split_whitespace()
        .map(|token| token.to_lowercase())
        .collect()
}
