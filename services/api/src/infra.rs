use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use style_finder::quiz::{
    CoachEmail, CoachMailer, EmailQueue, MailerError, QueueStatus, QueuedEmail, RepositoryError,
    SubmissionId, SubmissionRecord, SubmissionRepository,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} mutex poisoned")))
}

fn newest_first(records: &mut [SubmissionRecord]) {
    records.sort_by(|left, right| {
        right
            .submitted_at
            .cmp(&left.submitted_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionRepository {
    records: Arc<Mutex<HashMap<SubmissionId, SubmissionRecord>>>,
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let mut guard = lock(&self.records, "submission")?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "submission")?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let guard = lock(&self.records, "submission")?;
        Ok(guard.get(id).cloned())
    }

    fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let guard = lock(&self.records, "submission")?;
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.submitted_at >= since)
            .cloned()
            .collect();
        newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    fn search_by_email(&self, fragment: &str) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let guard = lock(&self.records, "submission")?;
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.submission.user_email.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEmailQueue {
    entries: Arc<Mutex<Vec<QueuedEmail>>>,
}

impl EmailQueue for InMemoryEmailQueue {
    fn enqueue(&self, entry: QueuedEmail) -> Result<QueuedEmail, RepositoryError> {
        let mut guard = lock(&self.entries, "email queue")?;
        if guard.iter().any(|existing| existing.id == entry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(entry.clone());
        Ok(entry)
    }

    /// Delivered entries leave the queue; failed ones stay for inspection.
    fn update(&self, entry: QueuedEmail) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.entries, "email queue")?;
        let position = guard
            .iter()
            .position(|existing| existing.id == entry.id)
            .ok_or(RepositoryError::NotFound)?;
        if entry.status == QueueStatus::Sent {
            guard.remove(position);
        } else {
            guard[position] = entry;
        }
        Ok(())
    }

    fn due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueuedEmail>, RepositoryError> {
        let guard = lock(&self.entries, "email queue")?;
        let mut due: Vec<_> = guard
            .iter()
            .filter(|entry| entry.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|left, right| left.scheduled_for.cmp(&right.scheduled_for));
        due.truncate(limit);
        Ok(due)
    }
}

/// Transport that writes coach emails to the log instead of a mail relay.
pub(crate) struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub(crate) fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl CoachMailer for LogMailer {
    fn send(&self, email: &CoachEmail) -> Result<(), MailerError> {
        info!(
            from = %self.sender,
            to = %email.to,
            subject = %email.subject,
            bytes = email.text.len() + email.html.len(),
            "coach email written to log transport"
        );
        Ok(())
    }
}
