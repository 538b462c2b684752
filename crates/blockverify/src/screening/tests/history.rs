use super::common::*;
use chrono::Duration;

use crate::screening::domain::AnomalyFlag;
use crate::screening::history::{EvaluationHistory, RetentionPolicy, MAX_RETENTION_DAYS};

#[test]
fn default_history_is_unbounded() {
    let mut history = EvaluationHistory::new();
    assert!(history.retention().is_unbounded());

    for index in 0..50 {
        let evicted = history.record(clean_submission(), now() - Duration::days(3650 - index));
        assert_eq!(evicted, 0);
    }

    assert_eq!(history.len(), 50);
}

#[test]
fn max_entries_evicts_oldest_first() {
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: Some(2),
        max_age_days: None,
    });

    history.record(
        other_student("cert-1", "Alex Kumar Singh", "one@iitd.ac.in", WALLETS[1]),
        now(),
    );
    history.record(
        other_student("cert-2", "Meera Nair", "two@iitd.ac.in", WALLETS[2]),
        now(),
    );
    let evicted = history.record(
        other_student("cert-3", "Rahul Verma", "three@iitd.ac.in", WALLETS[3]),
        now(),
    );

    assert_eq!(evicted, 1);
    let ids: Vec<_> = history
        .iter()
        .map(|entry| entry.submission.certificate_id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["cert-2", "cert-3"]);
}

#[test]
fn evicted_entries_no_longer_match_later_submissions() {
    let scorer = scorer();
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: Some(1),
        max_age_days: None,
    });

    scorer.evaluate_at(
        &other_student("cert-1", "Alex Kumar Singh", "alex@iitd.ac.in", WALLETS[1]),
        &mut history,
        now(),
    );
    scorer.evaluate_at(
        &other_student("cert-2", "Meera Nair", "meera@iitd.ac.in", WALLETS[2]),
        &mut history,
        now(),
    );

    let score = scorer.evaluate_at(
        &other_student("cert-3", "Alex Kumar Patel", "alex@iitd.ac.in", WALLETS[1]),
        &mut history,
        now(),
    );

    assert!(!score.has_flag(AnomalyFlag::PotentialDuplicate));
    assert!(!score.has_flag(AnomalyFlag::NameSimilarityDetected));
    assert_eq!(history.len(), 1);
}

#[test]
fn max_age_drops_entries_recorded_before_the_window() {
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: None,
        max_age_days: Some(30),
    });

    history.record(
        other_student("cert-old", "Alex Kumar Singh", "one@iitd.ac.in", WALLETS[1]),
        now() - Duration::days(45),
    );
    history.record(
        other_student("cert-recent", "Meera Nair", "two@iitd.ac.in", WALLETS[2]),
        now() - Duration::days(20),
    );
    assert_eq!(history.len(), 2);

    let evicted = history.record(
        other_student("cert-new", "Rahul Verma", "three@iitd.ac.in", WALLETS[3]),
        now(),
    );

    assert_eq!(evicted, 1);
    let first = history.iter().next().expect("entries retained");
    assert_eq!(first.submission.certificate_id.0, "cert-recent");
}

#[test]
fn indexes_survive_interleaved_eviction() {
    let scorer = scorer();
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: Some(3),
        max_age_days: None,
    });

    for index in 0..10 {
        let submission = other_student(
            &format!("cert-{index}"),
            &format!("Student{index} Surname{index}"),
            &format!("student{index}@iitd.ac.in"),
            WALLETS[index % WALLETS.len()],
        );
        scorer.evaluate_at(&submission, &mut history, now());
    }

    // Only cert-7..=9 remain; cert-9 used WALLETS[1] under a different name.
    let candidate = other_student("cert-next", "Someone Else", "next@iitd.ac.in", WALLETS[1]);
    let score = scorer.assess(&candidate, &history, now());
    let finding = score
        .finding(AnomalyFlag::PotentialDuplicate)
        .expect("wallet reuse finding");
    assert_eq!(finding.value, Some(serde_json::json!("cert-9")));
}

#[test]
fn retention_window_wider_than_the_calendar_keeps_everything() {
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: None,
        max_age_days: Some(u32::MAX),
    });

    history.record(clean_submission(), now() - Duration::days(i64::from(MAX_RETENTION_DAYS)));
    let evicted = history.record(
        other_student("cert-2", "Meera Nair", "two@iitd.ac.in", WALLETS[2]),
        now(),
    );

    assert_eq!(evicted, 0);
    assert_eq!(history.len(), 2);
}

#[test]
fn out_of_order_instants_are_raised_to_the_newest_entry() {
    let mut history = EvaluationHistory::with_retention(RetentionPolicy {
        max_entries: None,
        max_age_days: Some(30),
    });

    history.record(
        other_student("cert-1", "Alex Kumar Singh", "one@iitd.ac.in", WALLETS[1]),
        now(),
    );
    // A clock step backwards must not slip an already-expired entry in
    // behind a young one.
    let evicted = history.record(
        other_student("cert-2", "Meera Nair", "two@iitd.ac.in", WALLETS[2]),
        now() - Duration::days(60),
    );
    assert_eq!(evicted, 0);
    let recorded: Vec<_> = history.iter().map(|entry| entry.recorded_at).collect();
    assert_eq!(recorded, vec![now(), now()]);

    let evicted = history.record(
        other_student("cert-3", "Rahul Verma", "three@iitd.ac.in", WALLETS[3]),
        now() + Duration::days(31),
    );
    assert_eq!(evicted, 2);
    assert_eq!(history.len(), 1);
}
