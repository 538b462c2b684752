use crate::infra::{build_service, screening_settings};
use blockverify::error::AppError;
use blockverify::screening::{
    BatchScreener, BatchScreeningReport, CertificateSubmission, ScreeningReport,
    DEFAULT_BATCH_INSTITUTION,
};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// JSON file holding one submission object or an array of them
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Scoring config JSON overriding SCREENING_CONFIG_PATH
    #[arg(long)]
    pub(crate) scoring_config: Option<PathBuf>,
    /// Print the full reports as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Batch-upload CSV file
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Institution for rows that leave institutionName empty
    #[arg(long)]
    pub(crate) institution: Option<String>,
    /// Scoring config JSON overriding SCREENING_CONFIG_PATH
    #[arg(long)]
    pub(crate) scoring_config: Option<PathBuf>,
    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubmissionInput {
    Many(Vec<CertificateSubmission>),
    One(Box<CertificateSubmission>),
}

impl SubmissionInput {
    fn into_vec(self) -> Vec<CertificateSubmission> {
        match self {
            SubmissionInput::Many(submissions) => submissions,
            SubmissionInput::One(submission) => vec![*submission],
        }
    }
}

pub(crate) fn parse_submissions(raw: &str) -> Result<Vec<CertificateSubmission>, AppError> {
    let input: SubmissionInput = serde_json::from_str(raw)?;
    Ok(input.into_vec())
}

pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let ScreenArgs {
        input,
        scoring_config,
        json,
    } = args;

    let service = build_service(screening_settings(scoring_config)?)?;
    let raw = std::fs::read_to_string(&input)?;
    let submissions = parse_submissions(&raw)?;

    let reports: Vec<ScreeningReport> = submissions
        .iter()
        .map(|submission| service.screen(submission))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("Screened {} submission(s) from {}", reports.len(), input.display());
    for report in &reports {
        render_report(report);
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let BatchArgs {
        csv,
        institution,
        scoring_config,
        json,
    } = args;

    let service = build_service(screening_settings(scoring_config)?)?;
    let institution = institution.as_deref().unwrap_or(DEFAULT_BATCH_INSTITUTION);
    let report = BatchScreener::from_path(&service, &csv, institution)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    render_batch(&report, &csv);
    Ok(())
}

pub(crate) fn render_report(report: &ScreeningReport) {
    let score = &report.score;
    println!(
        "- {}: score {} ({}) -> {}",
        score.certificate_id.0,
        score.risk_score,
        score.risk_level.label(),
        report.decision.summary()
    );
    for finding in &score.details {
        println!(
            "    [{:?}] {}: {}",
            finding.severity, finding.kind, finding.description
        );
    }
}

fn render_batch(report: &BatchScreeningReport, path: &std::path::Path) {
    println!("Batch screening of {}", path.display());
    println!(
        "- {} screened, {} rejected, {} blocked",
        report.screened.len(),
        report.rejected.len(),
        report.blocked()
    );

    for screened in &report.screened {
        render_report(screened);
    }

    if !report.rejected.is_empty() {
        println!("\nRejected rows");
        for rejected in &report.rejected {
            println!("- row {}: {}", rejected.row, rejected.errors.join("; "));
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings");
        for warned in &report.warnings {
            println!("- row {}: {}", warned.row, warned.warnings.join("; "));
        }
    }
}
