use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::CertificateSubmission;
use super::evaluation::patterns::{name_tokens, normalize_wallet};

/// A scored submission together with the instant it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub submission: CertificateSubmission,
    pub recorded_at: DateTime<Utc>,
}

/// Largest retention window the environment loader accepts, in days.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Bounds applied to the history on every append. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub max_entries: Option<usize>,
    pub max_age_days: Option<u32>,
}

impl RetentionPolicy {
    pub const fn unbounded() -> Self {
        Self {
            max_entries: None,
            max_age_days: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_entries.is_none() && self.max_age_days.is_none()
    }
}

type SequenceIndex = HashMap<String, VecDeque<u64>>;

/// Append-only record of every submission the scorer has seen.
///
/// Entries carry a monotonically increasing sequence number. The secondary
/// indexes map a key to the sequence numbers holding it, in ascending order,
/// so eviction from the front only ever pops the head of each index list.
#[derive(Debug, Clone, Default)]
pub struct EvaluationHistory {
    entries: VecDeque<HistoryEntry>,
    first_sequence: u64,
    by_email: SequenceIndex,
    by_wallet: SequenceIndex,
    by_name_token: SequenceIndex,
    retention: RetentionPolicy,
}

impl EvaluationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Append a submission, then apply the retention policy. Returns the
    /// number of evicted entries.
    ///
    /// Recorded times never run backwards: an instant earlier than the newest
    /// entry is raised to it, so age eviction can stop at the first young entry.
    pub fn record(&mut self, submission: CertificateSubmission, recorded_at: DateTime<Utc>) -> usize {
        let recorded_at = self
            .entries
            .back()
            .map_or(recorded_at, |last| last.recorded_at.max(recorded_at));
        let sequence = self.first_sequence + self.entries.len() as u64;

        push_index(&mut self.by_email, submission.student_email.clone(), sequence);
        push_index(
            &mut self.by_wallet,
            normalize_wallet(&submission.student_wallet_address),
            sequence,
        );
        for token in name_tokens(&submission.student_name) {
            push_index(&mut self.by_name_token, token, sequence);
        }

        self.entries.push_back(HistoryEntry {
            submission,
            recorded_at,
        });

        self.enforce_retention(recorded_at)
    }

    /// Prior entries sharing the email or the wallet, in history order.
    pub(crate) fn duplicate_candidates(&self, email: &str, wallet: &str) -> Vec<&HistoryEntry> {
        let mut sequences = BTreeSet::new();
        if let Some(list) = self.by_email.get(email) {
            sequences.extend(list.iter().copied());
        }
        if let Some(list) = self.by_wallet.get(&normalize_wallet(wallet)) {
            sequences.extend(list.iter().copied());
        }
        sequences
            .into_iter()
            .filter_map(|sequence| self.get(sequence))
            .collect()
    }

    /// Prior entries whose name shares at least `min_shared` distinct tokens
    /// with `tokens`, in history order.
    pub(crate) fn similar_names(
        &self,
        tokens: &BTreeSet<String>,
        min_shared: usize,
    ) -> Vec<&HistoryEntry> {
        let mut shared: BTreeMap<u64, usize> = BTreeMap::new();
        for token in tokens {
            if let Some(list) = self.by_name_token.get(token) {
                for sequence in list {
                    *shared.entry(*sequence).or_default() += 1;
                }
            }
        }
        shared
            .into_iter()
            .filter(|(_, count)| *count >= min_shared)
            .filter_map(|(sequence, _)| self.get(sequence))
            .collect()
    }

    fn get(&self, sequence: u64) -> Option<&HistoryEntry> {
        let offset = sequence.checked_sub(self.first_sequence)?;
        self.entries.get(usize::try_from(offset).ok()?)
    }

    fn enforce_retention(&mut self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;

        if let Some(max_entries) = self.retention.max_entries {
            let max_entries = max_entries.max(1);
            while self.entries.len() > max_entries {
                self.evict_front();
                evicted += 1;
            }
        }

        // A window reaching before chrono's earliest instant evicts nothing.
        let cutoff = self
            .retention
            .max_age_days
            .and_then(|days| now.checked_sub_signed(Duration::days(i64::from(days))));
        if let Some(cutoff) = cutoff {
            while self
                .entries
                .front()
                .is_some_and(|entry| entry.recorded_at < cutoff)
            {
                self.evict_front();
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!(evicted, retained = self.entries.len(), "evaluation history trimmed");
        }
        evicted
    }

    fn evict_front(&mut self) {
        let Some(entry) = self.entries.pop_front() else {
            return;
        };
        let sequence = self.first_sequence;
        self.first_sequence += 1;

        let submission = &entry.submission;
        pop_index(&mut self.by_email, &submission.student_email, sequence);
        pop_index(
            &mut self.by_wallet,
            &normalize_wallet(&submission.student_wallet_address),
            sequence,
        );
        for token in name_tokens(&submission.student_name) {
            pop_index(&mut self.by_name_token, &token, sequence);
        }
    }
}

fn push_index(index: &mut SequenceIndex, key: String, sequence: u64) {
    let list = index.entry(key).or_default();
    // Lists stay strictly ascending.
    if list.back() != Some(&sequence) {
        list.push_back(sequence);
    }
}

fn pop_index(index: &mut SequenceIndex, key: &str, sequence: u64) {
    if let Some(list) = index.get_mut(key) {
        if list.front() == Some(&sequence) {
            list.pop_front();
        }
        if list.is_empty() {
            index.remove(key);
        }
    }
}
