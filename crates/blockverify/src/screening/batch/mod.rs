mod parser;

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::service::{ScreeningReport, ScreeningService};

#[derive(Debug, thiserror::Error)]
pub enum BatchImportError {
    #[error("failed to read certificate batch: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid certificate batch CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Institution recorded for rows that leave `institutionName` empty.
pub const DEFAULT_BATCH_INSTITUTION: &str = "Unspecified Institution";

/// A CSV row that could not be screened, with every reason found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub errors: Vec<String>,
}

/// Observations about a row that was still screened or rejected on its own
/// merits, such as an out-of-range CGPA or an email repeated within the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    pub row: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchScreeningReport {
    pub screened: Vec<ScreeningReport>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<RowWarning>,
}

impl BatchScreeningReport {
    pub fn blocked(&self) -> usize {
        self.screened
            .iter()
            .filter(|report| report.decision.blocks_issuance())
            .count()
    }
}

/// Screens a batch-upload CSV through a shared service, row by row in file
/// order, so later rows are checked against earlier ones.
pub struct BatchScreener;

impl BatchScreener {
    pub fn from_path<P: AsRef<Path>>(
        service: &ScreeningService,
        path: P,
        default_institution: &str,
    ) -> Result<BatchScreeningReport, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(service, file, default_institution)
    }

    pub fn from_reader<R: Read>(
        service: &ScreeningService,
        reader: R,
        default_institution: &str,
    ) -> Result<BatchScreeningReport, BatchImportError> {
        let rows = parser::parse_rows(reader, default_institution)?;

        let mut screened = Vec::new();
        let mut rejected = Vec::new();
        let mut warnings = Vec::new();
        for parsed in rows {
            if !parsed.warnings.is_empty() {
                warn!(
                    row = parsed.row,
                    warnings = ?parsed.warnings,
                    "certificate batch row has warnings"
                );
                warnings.push(RowWarning {
                    row: parsed.row,
                    warnings: parsed.warnings,
                });
            }
            match parsed.outcome {
                Ok(submission) => screened.push(service.screen(&submission)),
                Err(errors) => {
                    warn!(row = parsed.row, ?errors, "certificate batch row rejected");
                    rejected.push(RejectedRow {
                        row: parsed.row,
                        errors,
                    });
                }
            }
        }

        info!(
            screened = screened.len(),
            rejected = rejected.len(),
            warned = warnings.len(),
            "certificate batch screened"
        );
        Ok(BatchScreeningReport {
            screened,
            rejected,
            warnings,
        })
    }
}
