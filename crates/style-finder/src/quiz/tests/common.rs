use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::{AdminConfig, NotificationConfig};
use crate::quiz::domain::{QuizSubmission, Section1Responses, Section2Responses};
use crate::quiz::notification::{CoachEmail, CoachMailer, MailerError};
use crate::quiz::repository::{
    EmailQueue, QueuedEmail, RepositoryError, SubmissionId, SubmissionRecord,
    SubmissionRepository,
};
use crate::quiz::validation::RawSubmission;
use crate::quiz::{quiz_router, QuizService};

pub(super) const COACH: &str = "coach@example.com";
pub(super) const BACKUP: &str = "backup@example.com";
pub(super) const ADMIN_TOKEN: &str = "admin123";

pub(super) fn completed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26)
        .single()
        .expect("valid timestamp")
}

/// Seven answers with the first `trues` marked true.
pub(super) fn group(trues: usize) -> Vec<bool> {
    (0..7).map(|index| index < trues).collect()
}

fn answers(letters: &str) -> Vec<String> {
    letters.chars().map(|letter| letter.to_string()).collect()
}

/// Section 1 true-counts {A:4,B:2,C:3,D:1,E:5,F:1,G:6,H:2} and Section 2 letter
/// frequencies {A:5,B:1,C:2,D:1,E:2,F:1,G:4,H:1}.
pub(super) fn sample_submission() -> QuizSubmission {
    QuizSubmission {
        user_name: "Avery Quinn".to_string(),
        user_email: "avery@example.com".to_string(),
        timestamp: completed_at(),
        section1: Section1Responses {
            group_a: vec![true, false, true, false, true, false, true],
            group_b: group(2),
            group_c: group(3),
            group_d: group(1),
            group_e: group(5),
            group_f: group(1),
            group_g: group(6),
            group_h: group(2),
        },
        section2: Section2Responses {
            answers: answers("AAAAABCCDEEFGGGGH"),
        },
    }
}

pub(super) fn sample_raw() -> RawSubmission {
    RawSubmission::from(&sample_submission())
}

pub(super) fn notification_config() -> NotificationConfig {
    NotificationConfig {
        coach_email: COACH.to_string(),
        ..NotificationConfig::default()
    }
}

pub(super) fn admin_config(cron_secret: Option<&str>) -> AdminConfig {
    AdminConfig {
        token: ADMIN_TOKEN.to_string(),
        cron_secret: cron_secret.map(str::to_string),
    }
}

pub(super) type TestService = QuizService<MemoryRepository, MemoryQueue, RecordingMailer>;

pub(super) fn build_service_with(
    mailer: RecordingMailer,
    config: &NotificationConfig,
) -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryQueue>,
    Arc<RecordingMailer>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let queue = Arc::new(MemoryQueue::default());
    let mailer = Arc::new(mailer);
    let service = QuizService::new(repository.clone(), queue.clone(), mailer.clone(), config);
    (service, repository, queue, mailer)
}

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryQueue>,
    Arc<RecordingMailer>,
) {
    build_service_with(RecordingMailer::default(), &notification_config())
}

pub(super) fn router_with_service(service: TestService, cron_secret: Option<&str>) -> axum::Router {
    quiz_router(Arc::new(service), admin_config(cron_secret))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<SubmissionId, SubmissionRecord>>>,
}

impl MemoryRepository {
    pub(super) fn only_record(&self) -> SubmissionRecord {
        let guard = self.records.lock().expect("repository mutex poisoned");
        assert_eq!(guard.len(), 1, "expected exactly one stored submission");
        guard.values().next().cloned().expect("one record")
    }

    pub(super) fn newest_first(records: &mut [SubmissionRecord]) {
        records.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
    }
}

impl SubmissionRepository for MemoryRepository {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.submitted_at >= since)
            .cloned()
            .collect();
        Self::newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    fn search_by_email(&self, fragment: &str) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let needle = fragment.to_lowercase();
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.submission.user_email.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Self::newest_first(&mut records);
        Ok(records)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryQueue {
    entries: Arc<Mutex<Vec<QueuedEmail>>>,
}

impl MemoryQueue {
    pub(super) fn entries(&self) -> Vec<QueuedEmail> {
        self.entries.lock().expect("queue mutex poisoned").clone()
    }
}

impl EmailQueue for MemoryQueue {
    fn enqueue(&self, entry: QueuedEmail) -> Result<QueuedEmail, RepositoryError> {
        self.entries
            .lock()
            .expect("queue mutex poisoned")
            .push(entry.clone());
        Ok(entry)
    }

    fn update(&self, entry: QueuedEmail) -> Result<(), RepositoryError> {
        let mut guard = self.entries.lock().expect("queue mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == entry.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = entry;
        Ok(())
    }

    fn due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueuedEmail>, RepositoryError> {
        let guard = self.entries.lock().expect("queue mutex poisoned");
        let mut due: Vec<_> = guard.iter().filter(|entry| entry.is_due(now)).cloned().collect();
        due.sort_by(|left, right| left.scheduled_for.cmp(&right.scheduled_for));
        due.truncate(limit);
        Ok(due)
    }
}

/// Mailer double that records every attempt and can refuse one recipient a fixed number of times.
#[derive(Default)]
pub(super) struct RecordingMailer {
    attempts: Mutex<Vec<CoachEmail>>,
    delivered: Mutex<Vec<CoachEmail>>,
    reject: Option<String>,
    failures_remaining: Mutex<u32>,
}

impl RecordingMailer {
    pub(super) fn rejecting(recipient: &str, failures: u32) -> Self {
        Self {
            reject: Some(recipient.to_string()),
            failures_remaining: Mutex::new(failures),
            ..Self::default()
        }
    }

    pub(super) fn attempts(&self) -> Vec<CoachEmail> {
        self.attempts.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn delivered(&self) -> Vec<CoachEmail> {
        self.delivered.lock().expect("mailer mutex poisoned").clone()
    }
}

impl CoachMailer for RecordingMailer {
    fn send(&self, email: &CoachEmail) -> Result<(), MailerError> {
        self.attempts
            .lock()
            .expect("mailer mutex poisoned")
            .push(email.clone());

        if self.reject.as_deref() == Some(email.to.as_str()) {
            let mut remaining = self.failures_remaining.lock().expect("mailer mutex poisoned");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MailerError::Transport("relay refused recipient".to_string()));
            }
        }

        self.delivered
            .lock()
            .expect("mailer mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl SubmissionRepository for UnavailableRepository {
    fn insert(&self, _record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: SubmissionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(
        &self,
        _since: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn search_by_email(&self, _fragment: &str) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
