use axum::response::Response;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;

use crate::screening::domain::{CertificateId, CertificateSubmission};
use crate::screening::evaluation::{AnomalyScorer, ScoringConfig};

pub(super) const WALLETS: [&str; 4] = [
    "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
    "0x71C7656EC7ab88b098defB751B7401B5f6d8976F",
    "0xde0B295669a9FD93d5F28D9Ec85E40f4cb697BAe",
    "0x2546BcD3c84621e976D8185a91A922aE77ECEc30",
];

/// Fixed evaluation instant: Wednesday 2025-01-15 12:00 UTC.
pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0)
        .single()
        .expect("valid instant")
}

/// Timestamp in India Standard Time, the issuer's local zone in these fixtures.
pub(super) fn issued(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(5 * 3600 + 30 * 60)
        .expect("valid offset")
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Submission that trips none of the rules against an empty history.
pub(super) fn clean_submission() -> CertificateSubmission {
    CertificateSubmission {
        certificate_id: CertificateId("cert-clean".to_string()),
        student_name: "Priya Sharma".to_string(),
        student_email: "priya.sharma@iitd.ac.in".to_string(),
        student_wallet_address: WALLETS[0].to_string(),
        course: "B.Tech Computer Science".to_string(),
        institution: "Indian Institute of Technology Delhi".to_string(),
        // Wednesday mid-morning
        issued_at: issued(2024, 6, 12, 10, 30),
        cgpa: Some(8.7),
        grade: Some("A".to_string()),
    }
}

/// Clean submission for a different student, so history rules stay quiet.
pub(super) fn other_student(id: &str, name: &str, email: &str, wallet: &str) -> CertificateSubmission {
    CertificateSubmission {
        certificate_id: CertificateId(id.to_string()),
        student_name: name.to_string(),
        student_email: email.to_string(),
        student_wallet_address: wallet.to_string(),
        ..clean_submission()
    }
}

pub(super) fn scorer() -> AnomalyScorer {
    AnomalyScorer::new(ScoringConfig::default()).expect("default config is valid")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
