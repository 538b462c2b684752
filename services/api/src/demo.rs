use crate::commands::{parse_submissions, render_report};
use blockverify::error::AppError;
use blockverify::screening::{
    CertificateSubmission, RetentionPolicy, ScoringConfig, ScreeningService, ScreeningStatistics,
};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print only the per-certificate summary lines, without findings.
    #[arg(long)]
    pub(crate) brief: bool,
}

/// Demo submissions in screening order, in the same JSON shape the `screen`
/// command reads. Issue times are in India Standard Time.
const DEMO_SUBMISSIONS: &str = r#"[
    {
        "certificate_id": "cert-demo-001",
        "student_name": "Priya Sharma",
        "student_email": "priya.sharma@iitd.ac.in",
        "student_wallet_address": "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
        "course": "B.Tech Computer Science",
        "institution": "Indian Institute of Technology Delhi",
        "issued_at": "2024-06-12T10:30:00+05:30",
        "cgpa": 8.4,
        "grade": "A"
    },
    {
        "certificate_id": "cert-demo-002",
        "student_name": "Priya Sharma",
        "student_email": "priya.sharma@iitd.ac.in",
        "student_wallet_address": "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
        "course": "B.Tech Computer Science",
        "institution": "Indian Institute of Technology Delhi",
        "issued_at": "2024-06-12T10:30:00+05:30",
        "cgpa": 8.4,
        "grade": "A"
    },
    {
        "certificate_id": "cert-demo-003",
        "student_name": "Arjun Kumar Reddy",
        "student_email": "arjun.reddy@iitd.ac.in",
        "student_wallet_address": "0x71C7656EC7ab88b098defB751B7401B5f6d8976F",
        "course": "B.Tech Computer Science",
        "institution": "Indian Institute of Technology Delhi",
        "issued_at": "2024-06-12T10:30:00+05:30",
        "cgpa": 8.4,
        "grade": "A"
    },
    {
        "certificate_id": "cert-demo-004",
        "student_name": "Arjun Kumar Rao",
        "student_email": "test.arjun@tempmail.org",
        "student_wallet_address": "0x71C7656EC7ab88b098defB751B7401B5f6d8976F",
        "course": "B.Tech Computer Science",
        "institution": "Indian Institute of Technology Delhi",
        "issued_at": "2024-06-15T02:15:00+05:30",
        "cgpa": 10.0,
        "grade": "A"
    },
    {
        "certificate_id": "cert-demo-005",
        "student_name": "Meera Nair",
        "student_email": "demo.meera@iitd.ac.in",
        "student_wallet_address": "0x0000000000000000000000000000000000000000",
        "course": "B.Tech Computer Science",
        "institution": "Indian Institute of Technology Delhi",
        "issued_at": "2024-06-16T11:00:00+05:30",
        "cgpa": 8.4,
        "grade": "A"
    },
    {
        "certificate_id": "cert-demo-006",
        "student_name": "Rahul Verma",
        "student_email": "admin@mailinator.com",
        "student_wallet_address": "0x0000000000000000000000000000000000000000",
        "course": "B.Tech Computer Science",
        "institution": "Demo University",
        "issued_at": "2024-06-16T03:00:00+05:30",
        "cgpa": 11.2,
        "grade": "A"
    }
]"#;

const DEMO_LABELS: [&str; 6] = [
    "Legitimate graduate",
    "Same certificate submitted twice",
    "First member of a suspected ring",
    "Ring member reusing the wallet with a disposable email",
    "Sunday issuance to a burn wallet with a placeholder email",
    "Placeholder data at a placeholder institution",
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = ScreeningService::new(ScoringConfig::default(), RetentionPolicy::unbounded())?;

    println!("Certificate screening demo");
    for (label, submission) in demo_scenarios()? {
        println!("\n{label}");
        let report = service.screen(&submission);
        if args.brief {
            println!(
                "- {}: score {} ({})",
                report.score.certificate_id.0,
                report.score.risk_score,
                report.score.risk_level.label()
            );
        } else {
            render_report(&report);
        }
    }

    render_statistics(&service.statistics());
    Ok(())
}

fn render_statistics(stats: &ScreeningStatistics) {
    println!("\nScreening statistics");
    println!(
        "- {} analyzed | average score {:.1} | {} flagged ({:.0}%)",
        stats.total_certificates_analyzed,
        stats.average_risk_score,
        stats.flagged_certificates,
        stats.fraud_detection_rate * 100.0
    );
    for (tier, count) in &stats.tier_counts {
        println!("  - {}: {}", tier.label(), count);
    }
    println!("- {} certificates retained in history", stats.history_size);
}

fn demo_scenarios() -> Result<Vec<(&'static str, CertificateSubmission)>, AppError> {
    let submissions = parse_submissions(DEMO_SUBMISSIONS)?;
    Ok(DEMO_LABELS.into_iter().zip(submissions).collect())
}
