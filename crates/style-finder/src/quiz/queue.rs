use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::notification::{CoachMailer, MailDispatcher, MailerError};
use super::repository::{
    EmailDeliveryStatus, EmailQueue, QueueStatus, QueuedEmail, RepositoryError, SubmissionId,
    SubmissionRecord, SubmissionRepository,
};

pub(crate) const EXHAUSTED_MESSAGE: &str = "Max retry attempts reached";

/// Outcome counters for one pass over the retry queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueRunSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Drains due entries from the email queue through the dispatcher.
pub struct QueueProcessor<R, Q, M> {
    repository: Arc<R>,
    queue: Arc<Q>,
    dispatcher: Arc<MailDispatcher<M>>,
}

impl<R, Q, M> QueueProcessor<R, Q, M>
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    pub fn new(repository: Arc<R>, queue: Arc<Q>, dispatcher: Arc<MailDispatcher<M>>) -> Self {
        Self {
            repository,
            queue,
            dispatcher,
        }
    }

    /// Attempt every entry due at `now`, up to `limit`. A failing entry never stops the run.
    pub fn process_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<QueueRunSummary, RepositoryError> {
        let mut summary = QueueRunSummary::default();

        for mut entry in self.queue.due(now, limit)? {
            summary.processed += 1;
            entry.status = QueueStatus::Processing;
            entry.last_attempt_at = Some(now);
            if let Err(error) = self.queue.update(entry.clone()) {
                summary.failed += 1;
                summary.errors.push(format!("{}: {error}", entry.id.0));
                continue;
            }

            let outcome = match self.dispatcher.deliver(&entry.email) {
                Ok(()) => {
                    summary.sent += 1;
                    self.mark_sent(entry, now)
                }
                Err(error) => {
                    summary.failed += 1;
                    self.mark_failed(entry, &error)
                }
            };
            if let Err(error) = outcome {
                summary.errors.push(error.to_string());
            }
        }

        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                sent = summary.sent,
                failed = summary.failed,
                "email queue run finished"
            );
        }
        Ok(summary)
    }

    fn mark_sent(&self, mut entry: QueuedEmail, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        entry.status = QueueStatus::Sent;
        entry.sent_at = Some(now);
        let submission_id = entry.submission_id.clone();
        self.queue.update(entry)?;
        self.update_submission(&submission_id, |record| {
            record.email = EmailDeliveryStatus::Sent { at: now };
        })
    }

    fn mark_failed(&self, mut entry: QueuedEmail, error: &MailerError) -> Result<(), RepositoryError> {
        entry.attempts += 1;
        entry.status = QueueStatus::Failed;
        entry.last_error = Some(error.to_string());
        let exhausted = entry.attempts >= entry.max_attempts;
        let submission_id = entry.submission_id.clone();
        warn!(
            queue_id = %entry.id.0,
            attempts = entry.attempts,
            max_attempts = entry.max_attempts,
            %error,
            "queued coach email failed"
        );
        self.queue.update(entry)?;

        self.update_submission(&submission_id, |record| {
            record.email_retry_count += 1;
            record.email = if exhausted {
                EmailDeliveryStatus::Exhausted {
                    error: EXHAUSTED_MESSAGE.to_string(),
                }
            } else {
                EmailDeliveryStatus::Failed {
                    error: error.to_string(),
                }
            };
        })
    }

    fn update_submission<F>(&self, id: &SubmissionId, apply: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut SubmissionRecord),
    {
        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        apply(&mut record);
        self.repository.update(record)
    }
}
