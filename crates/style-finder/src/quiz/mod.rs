//! Style quiz intake, scoring, coach notification, and admin tooling.

pub mod breakdown;
pub mod catalog;
pub mod domain;
pub mod export;
pub mod notification;
pub mod queue;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use breakdown::generate_breakdown;
pub use catalog::{describe, StyleDescription};
pub use domain::{
    Polarity, QuizSubmission, ScoreVector, Section1Responses, Section2Responses, StyleCategory,
    StyleResult, StyleScore, MAX_CATEGORY_SCORE, SECTION1_GROUP_LEN, SECTION2_QUESTION_COUNT,
};
pub use export::{submissions_to_csv, ExportError};
pub use notification::{
    render_coach_email, CoachEmail, CoachMailer, DeliveryPolicy, MailDispatcher, MailerError,
};
pub use queue::{QueueProcessor, QueueRunSummary};
pub use repository::{
    EmailDeliveryStatus, EmailQueue, QueueEntryId, QueueStatus, QueuedEmail, RepositoryError,
    SubmissionId, SubmissionRecord, SubmissionRepository, SubmissionSummaryView,
};
pub use router::quiz_router;
pub use scoring::{
    calculate_style_scores, compute_score_vector, determine_style_profile, ScoringError,
};
pub use service::{QuizService, QuizServiceError, RetryOutcome, SubmissionReceipt};
pub use validation::{validate_submission, RawSection1, RawSection2, RawSubmission};
