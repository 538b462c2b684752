use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;

use super::super::domain::{CertificateId, CertificateSubmission};

static EMAIL_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email format regex is valid")
});

static WALLET_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("wallet format regex is valid"));

/// Upper bound of the CGPA range the upload template expects.
const TEMPLATE_CGPA_MAX: f64 = 10.0;

/// One CSV row after parsing: either a submission ready to screen or the
/// reasons it cannot be screened, plus warnings that do not block it.
#[derive(Debug)]
pub(crate) struct ParsedRow {
    pub(crate) row: usize,
    pub(crate) outcome: Result<CertificateSubmission, Vec<String>>,
    pub(crate) warnings: Vec<String>,
}

pub(crate) fn parse_rows<R: Read>(
    reader: R,
    default_institution: &str,
) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    let mut first_row_by_email: HashMap<String, usize> = HashMap::new();

    for (index, record) in csv_reader.deserialize::<BatchRow>().enumerate() {
        let row = record?;
        let number = index + 1;
        let warnings = row.warnings(number, &mut first_row_by_email);
        rows.push(ParsedRow {
            row: number,
            outcome: row.into_submission(default_institution),
            warnings,
        });
    }

    Ok(rows)
}

/// Column layout of the certificate batch-upload template. Unknown columns
/// such as `department` are ignored.
#[derive(Debug, Deserialize)]
struct BatchRow {
    #[serde(rename = "studentName", default, deserialize_with = "empty_string_as_none")]
    student_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(rename = "walletAddress", default, deserialize_with = "empty_string_as_none")]
    wallet_address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    course: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cgpa: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    grade: Option<String>,
    #[serde(rename = "issueDate", default, deserialize_with = "empty_string_as_none")]
    issue_date: Option<String>,
    #[serde(
        rename = "institutionName",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    institution_name: Option<String>,
}

impl BatchRow {
    /// Non-blocking observations: a CGPA outside the template range, or an
    /// email already used by an earlier row of the same file.
    fn warnings(&self, row: usize, first_row_by_email: &mut HashMap<String, usize>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(cgpa) = self.cgpa.as_deref().and_then(|raw| raw.parse::<f64>().ok()) {
            if cgpa.is_finite() && !(0.0..=TEMPLATE_CGPA_MAX).contains(&cgpa) {
                warnings.push(format!(
                    "cgpa {cgpa} should be between 0 and {TEMPLATE_CGPA_MAX}"
                ));
            }
        }

        if let Some(email) = self.email.as_deref() {
            let first = *first_row_by_email.entry(email.to_string()).or_insert(row);
            if first != row {
                warnings.push(format!("duplicate email in batch, first seen in row {first}"));
            }
        }

        warnings
    }

    fn into_submission(
        self,
        default_institution: &str,
    ) -> Result<CertificateSubmission, Vec<String>> {
        let mut errors = Vec::new();

        let student_name = required(self.student_name, "studentName", &mut errors);
        let email = required(self.email, "email", &mut errors);
        if let Some(email) = email.as_deref().filter(|email| !EMAIL_FORMAT.is_match(email)) {
            errors.push(format!("email '{email}' is not a valid email address"));
        }
        let wallet_address = required(self.wallet_address, "walletAddress", &mut errors);
        if let Some(wallet) = wallet_address
            .as_deref()
            .filter(|wallet| !WALLET_FORMAT.is_match(wallet))
        {
            errors.push(format!("walletAddress '{wallet}' is not a valid Ethereum address"));
        }
        let course = required(self.course, "course", &mut errors);

        let issued_at = match self.issue_date.as_deref() {
            Some(raw) => {
                let parsed = parse_issue_date(raw);
                if parsed.is_none() {
                    errors.push(format!("issueDate '{raw}' is not a valid date"));
                }
                parsed
            }
            None => {
                errors.push("issueDate is required".to_string());
                None
            }
        };

        let cgpa = match self.cgpa.as_deref() {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => {
                    errors.push(format!("cgpa '{raw}' is not a number"));
                    None
                }
            },
            None => None,
        };

        match (student_name, email, wallet_address, course, issued_at) {
            (
                Some(student_name),
                Some(student_email),
                Some(student_wallet_address),
                Some(course),
                Some(issued_at),
            ) if errors.is_empty() => {
                Ok(CertificateSubmission {
                    certificate_id: CertificateId::next(),
                    student_name,
                    student_email,
                    student_wallet_address,
                    course,
                    institution: self
                        .institution_name
                        .unwrap_or_else(|| default_institution.to_string()),
                    issued_at,
                    cgpa,
                    grade: self.grade,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(value: Option<String>, column: &str, errors: &mut Vec<String>) -> Option<String> {
    if value.is_none() {
        errors.push(format!("{column} is required"));
    }
    value
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// RFC 3339 keeps its offset. Naive timestamps are read as UTC. A bare date
/// carries no time of day, so it is pinned to noon UTC to stay clear of the
/// quiet-hours rule.
fn parse_issue_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
        return Some(date.and_time(noon).and_utc().fixed_offset());
    }

    None
}
