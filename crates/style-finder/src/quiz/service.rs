use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::export::{submissions_to_csv, ExportError};
use super::notification::{CoachEmail, CoachMailer, DeliveryPolicy, MailDispatcher};
use super::queue::{QueueProcessor, QueueRunSummary};
use super::repository::{
    EmailDeliveryStatus, EmailQueue, QueueEntryId, QueueStatus, QueuedEmail, RepositoryError,
    SubmissionId, SubmissionRecord, SubmissionRepository,
};
use super::scoring::{calculate_style_scores, ScoringError};
use super::validation::{validate_submission, RawSubmission};
use crate::config::NotificationConfig;

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static QUEUE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

fn next_queue_id() -> QueueEntryId {
    let id = QUEUE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    QueueEntryId(format!("mail-{id:06}"))
}

/// What the quiz taker gets back: only the primary style, as a results page slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub submission_id: SubmissionId,
    pub primary_style: String,
    pub message: String,
}

/// Result of an admin-triggered resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Sent,
    Queued,
}

impl RetryOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Sent => "Email sent successfully",
            Self::Queued => "Email queued for retry",
        }
    }
}

/// Service composing validation, scoring, persistence, and coach notification.
pub struct QuizService<R, Q, M> {
    repository: Arc<R>,
    queue: Arc<Q>,
    dispatcher: Arc<MailDispatcher<M>>,
    max_attempts: u32,
}

impl<R, Q, M> QuizService<R, Q, M>
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    pub fn new(repository: Arc<R>, queue: Arc<Q>, mailer: Arc<M>, config: &NotificationConfig) -> Self {
        let dispatcher = Arc::new(MailDispatcher::new(mailer, DeliveryPolicy::from(config)));
        Self {
            repository,
            queue,
            dispatcher,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Validate, score, store, and notify. Notification trouble never fails the submission.
    pub fn submit(&self, raw: RawSubmission) -> Result<SubmissionReceipt, QuizServiceError> {
        let errors = validate_submission(&raw);
        if !errors.is_empty() {
            warn!(?errors, "quiz submission failed validation");
            return Err(QuizServiceError::Validation(errors));
        }

        let now = Utc::now();
        let submission = raw.into_submission(now);
        info!(user = %submission.user_name, "quiz submission received");

        let result = calculate_style_scores(&submission)?;
        let record = self.repository.insert(SubmissionRecord {
            id: next_submission_id(),
            submission,
            result,
            submitted_at: now,
            email: EmailDeliveryStatus::Pending,
            email_retry_count: 0,
        })?;

        let email = self.dispatcher.render(&record.submission, &record.result);
        let primary_style = record.result.primary_slug();
        let submission_id = record.id.clone();
        self.notify(record, email, now);

        info!(
            submission_id = %submission_id.0,
            primary_style = %primary_style,
            "quiz submission completed"
        );

        Ok(SubmissionReceipt {
            success: true,
            submission_id,
            primary_style,
            message: "Assessment completed successfully. Results have been sent to your style coach."
                .to_string(),
        })
    }

    /// Rescore a stored submission from its raw answers and send the coach email again.
    pub fn retry_notification(&self, id: &SubmissionId) -> Result<RetryOutcome, QuizServiceError> {
        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        record.result = calculate_style_scores(&record.submission)?;
        let email = self.dispatcher.render(&record.submission, &record.result);
        let outcome = self.notify(record, email, Utc::now());
        Ok(outcome)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, QuizServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn recent(&self, days: u32, limit: usize) -> Result<Vec<SubmissionRecord>, QuizServiceError> {
        let since = Utc::now() - Duration::days(i64::from(days));
        Ok(self.repository.recent(since, limit)?)
    }

    pub fn search(&self, email_fragment: &str) -> Result<Vec<SubmissionRecord>, QuizServiceError> {
        Ok(self.repository.search_by_email(email_fragment.trim())?)
    }

    pub fn export_csv(&self, records: &[SubmissionRecord]) -> Result<String, QuizServiceError> {
        Ok(submissions_to_csv(records)?)
    }

    pub fn queue_processor(&self) -> QueueProcessor<R, Q, M> {
        QueueProcessor::new(
            self.repository.clone(),
            self.queue.clone(),
            self.dispatcher.clone(),
        )
    }

    pub fn process_queue(&self, limit: usize) -> Result<QueueRunSummary, QuizServiceError> {
        Ok(self.queue_processor().process_due(Utc::now(), limit)?)
    }

    fn notify(&self, mut record: SubmissionRecord, email: CoachEmail, now: DateTime<Utc>) -> RetryOutcome {
        let outcome = match self.dispatcher.deliver(&email) {
            Ok(()) => {
                record.email = EmailDeliveryStatus::Sent { at: now };
                RetryOutcome::Sent
            }
            Err(delivery_error) => {
                warn!(
                    submission_id = %record.id.0,
                    error = %delivery_error,
                    "coach email failed; queueing for retry"
                );
                record.email = EmailDeliveryStatus::Failed {
                    error: delivery_error.to_string(),
                };
                self.enqueue(&record.id, email, now);
                RetryOutcome::Queued
            }
        };

        if let Err(update_error) = self.repository.update(record) {
            error!(error = %update_error, "failed to record coach email status");
        }
        outcome
    }

    fn enqueue(&self, submission_id: &SubmissionId, email: CoachEmail, now: DateTime<Utc>) {
        let entry = QueuedEmail {
            id: next_queue_id(),
            submission_id: submission_id.clone(),
            email,
            status: QueueStatus::Pending,
            attempts: 0,
            max_attempts: self.max_attempts,
            last_error: None,
            last_attempt_at: None,
            scheduled_for: now,
            sent_at: None,
        };
        if let Err(queue_error) = self.queue.enqueue(entry) {
            error!(
                submission_id = %submission_id.0,
                error = %queue_error,
                "failed to queue coach email"
            );
        }
    }
}

/// Error raised by the quiz service.
#[derive(Debug, thiserror::Error)]
pub enum QuizServiceError {
    #[error("submission failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("quiz worker task failed: {0}")]
    Worker(String),
}

impl QuizServiceError {
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

