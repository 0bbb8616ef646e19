use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{QuizSubmission, StyleResult};
use super::notification::CoachEmail;

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Coach notification state tracked against a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EmailDeliveryStatus {
    Pending,
    Sent { at: DateTime<Utc> },
    Failed { error: String },
    /// The retry queue gave up; terminal until an admin retries by hand.
    Exhausted { error: String },
}

impl EmailDeliveryStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent { .. } => "sent",
            Self::Failed { .. } => "failed",
            Self::Exhausted { .. } => "exhausted",
        }
    }
}

/// Persisted submission: raw answers are the source of truth, the result is a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub submission: QuizSubmission,
    pub result: StyleResult,
    pub submitted_at: DateTime<Utc>,
    pub email: EmailDeliveryStatus,
    pub email_retry_count: u32,
}

impl SubmissionRecord {
    pub fn summary_view(&self) -> SubmissionSummaryView {
        SubmissionSummaryView {
            id: self.id.clone(),
            user_name: self.submission.user_name.clone(),
            user_email: self.submission.user_email.clone(),
            submitted_at: self.submitted_at,
            primary_style: self.result.primary.name.clone(),
            primary_score: self.result.primary.score,
            secondary_style: self.result.secondary.name.clone(),
            secondary_score: self.result.secondary.score,
            supporting_style: self.result.supporting.name.clone(),
            supporting_score: self.result.supporting.score,
            email_status: self.email.label(),
            email_retry_count: self.email_retry_count,
        }
    }
}

/// Admin-facing row for listings and exports.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummaryView {
    pub id: SubmissionId,
    pub user_name: String,
    pub user_email: String,
    pub submitted_at: DateTime<Utc>,
    pub primary_style: String,
    pub primary_score: u8,
    pub secondary_style: String,
    pub secondary_score: u8,
    pub supporting_style: String,
    pub supporting_score: u8,
    pub email_status: &'static str,
    pub email_retry_count: u32,
}

/// Storage abstraction for submissions so the service can be exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError>;
    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError>;
    /// Records submitted at or after `since`, newest first.
    fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError>;
    /// Case-insensitive substring match on the email address, newest first.
    fn search_by_email(&self, fragment: &str) -> Result<Vec<SubmissionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Identifier wrapper for queued notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueEntryId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

/// A coach email waiting for another delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEmail {
    pub id: QueueEntryId,
    pub submission_id: SubmissionId,
    pub email: CoachEmail,
    pub status: QueueStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl QueuedEmail {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, QueueStatus::Pending | QueueStatus::Failed)
            && self.attempts < self.max_attempts
            && self.scheduled_for <= now
    }
}

/// Durable retry queue for coach emails.
pub trait EmailQueue: Send + Sync {
    fn enqueue(&self, entry: QueuedEmail) -> Result<QueuedEmail, RepositoryError>;
    fn update(&self, entry: QueuedEmail) -> Result<(), RepositoryError>;
    /// Entries where [`QueuedEmail::is_due`] holds, oldest schedule first.
    fn due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueuedEmail>, RepositoryError>;
}
