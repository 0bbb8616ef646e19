//! End-to-end quiz intake through the public service facade and HTTP router: scoring, coach
//! notification, the retry queue, and the admin surface.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};

    use style_finder::config::{AdminConfig, NotificationConfig};
    use style_finder::quiz::{
        CoachEmail, CoachMailer, EmailQueue, MailerError, QueuedEmail, QuizService,
        RawSection1, RawSection2, RawSubmission, RepositoryError, SubmissionId, SubmissionRecord,
        SubmissionRepository,
    };

    fn group(trues: usize) -> Option<Vec<bool>> {
        Some((0..7).map(|index| index < trues).collect())
    }

    /// Scores to {A:9,B:3,C:5,D:2,E:7,F:2,G:10,H:3}.
    pub(super) fn submission(email: &str) -> RawSubmission {
        RawSubmission {
            user_name: Some("Morgan Reyes".to_string()),
            user_email: Some(email.to_string()),
            timestamp: None,
            section1: Some(RawSection1 {
                group_a: group(4),
                group_b: group(2),
                group_c: group(3),
                group_d: group(1),
                group_e: group(5),
                group_f: group(1),
                group_g: group(6),
                group_h: group(2),
            }),
            section2: Some(RawSection2 {
                answers: Some(
                    "aaaaabccdeefggggh"
                        .chars()
                        .map(|letter| letter.to_string())
                        .collect(),
                ),
            }),
        }
    }

    pub(super) fn notification_config() -> NotificationConfig {
        NotificationConfig {
            coach_email: "coach@studio.test".to_string(),
            ..NotificationConfig::default()
        }
    }

    pub(super) fn admin_config() -> AdminConfig {
        AdminConfig {
            token: "let-me-in".to_string(),
            cron_secret: None,
        }
    }

    pub(super) type Service = QuizService<MemoryRepository, MemoryQueue, FlakyMailer>;

    pub(super) fn build(failures: u32) -> (Arc<Service>, Arc<MemoryRepository>, Arc<FlakyMailer>) {
        let repository = Arc::new(MemoryRepository::default());
        let mailer = Arc::new(FlakyMailer::failing(failures));
        let service = QuizService::new(
            repository.clone(),
            Arc::new(MemoryQueue::default()),
            mailer.clone(),
            &notification_config(),
        );
        (Arc::new(service), repository, mailer)
    }

    #[derive(Default)]
    pub(super) struct MemoryRepository {
        records: Mutex<HashMap<SubmissionId, SubmissionRecord>>,
    }

    impl MemoryRepository {
        pub(super) fn get(&self, id: &SubmissionId) -> SubmissionRecord {
            self.records
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned()
                .expect("record stored")
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
            self.records
                .lock()
                .expect("repository mutex poisoned")
                .insert(record.id.clone(), record);
            Ok(())
        }

        fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned())
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
            records.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
            records.truncate(limit);
            Ok(records)
        }

        fn search_by_email(
            &self,
            fragment: &str,
        ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
            let needle = fragment.to_lowercase();
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard
                .values()
                .filter(|record| record.submission.user_email.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryQueue {
        entries: Mutex<Vec<QueuedEmail>>,
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
            match guard.iter_mut().find(|existing| existing.id == entry.id) {
                Some(slot) => {
                    *slot = entry;
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        }

        fn due(
            &self,
            now: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<QueuedEmail>, RepositoryError> {
            let guard = self.entries.lock().expect("queue mutex poisoned");
            Ok(guard
                .iter()
                .filter(|entry| entry.is_due(now))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    /// Fails the first `failures` sends, then delivers.
    pub(super) struct FlakyMailer {
        failures: Mutex<u32>,
        delivered: Mutex<Vec<CoachEmail>>,
    }

    impl FlakyMailer {
        fn failing(failures: u32) -> Self {
            Self {
                failures: Mutex::new(failures),
                delivered: Mutex::new(Vec::new()),
            }
        }

        pub(super) fn delivered(&self) -> Vec<CoachEmail> {
            self.delivered.lock().expect("mailer mutex poisoned").clone()
        }
    }

    impl CoachMailer for FlakyMailer {
        fn send(&self, email: &CoachEmail) -> Result<(), MailerError> {
            let mut failures = self.failures.lock().expect("mailer mutex poisoned");
            if *failures > 0 {
                *failures -= 1;
                return Err(MailerError::Transport("connection reset".to_string()));
            }
            self.delivered
                .lock()
                .expect("mailer mutex poisoned")
                .push(email.clone());
            Ok(())
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use style_finder::quiz::{quiz_router, EmailDeliveryStatus, StyleCategory};

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[test]
fn successful_submission_reaches_the_coach() {
    let (service, repository, mailer) = build(0);

    let receipt = service
        .submit(submission("morgan@example.com"))
        .expect("submission accepted");

    assert_eq!(receipt.primary_style, "contemporary");
    let record = repository.get(&receipt.submission_id);
    assert_eq!(record.result.primary.id, StyleCategory::Contemporary);
    assert_eq!(record.result.secondary.id, StyleCategory::Whimsical);
    assert_eq!(record.result.supporting.id, StyleCategory::Dramatic);
    assert!(matches!(record.email, EmailDeliveryStatus::Sent { .. }));

    let delivered = mailer.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].to, "coach@studio.test");
    assert!(delivered[0].text.contains("Primary Style: Contemporary (G) - Score: 10/24"));
}

#[test]
fn failed_notification_is_recovered_by_the_queue() {
    let (service, repository, mailer) = build(1);

    let receipt = service
        .submit(submission("morgan@example.com"))
        .expect("notification failure does not fail the submission");
    assert!(matches!(
        repository.get(&receipt.submission_id).email,
        EmailDeliveryStatus::Failed { .. }
    ));

    let summary = service.process_queue(10).expect("queue runs");
    assert_eq!((summary.processed, summary.sent), (1, 1));
    assert!(matches!(
        repository.get(&receipt.submission_id).email,
        EmailDeliveryStatus::Sent { .. }
    ));
    assert_eq!(mailer.delivered().len(), 1);
}

#[tokio::test]
async fn router_accepts_quiz_and_admin_can_retry() {
    let (service, repository, mailer) = build(1);
    let router = quiz_router(service, admin_config());

    let payload = serde_json::to_vec(&submission("morgan@example.com")).expect("payload");
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/submit-quiz")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .expect("request"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["primaryStyle"], "contemporary");
    let submission_id = body["submissionId"].as_str().expect("id").to_string();

    let retry = router
        .oneshot(
            Request::post("/api/admin/retry-email")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer let-me-in")
                .body(Body::from(
                    serde_json::json!({ "submissionId": submission_id }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("router responds");
    assert_eq!(retry.status(), StatusCode::OK);
    assert_eq!(json_body(retry).await["message"], "Email sent successfully");

    let record = repository.get(&style_finder::quiz::SubmissionId(submission_id));
    assert!(matches!(record.email, EmailDeliveryStatus::Sent { .. }));
    assert_eq!(mailer.delivered().len(), 1);
}

#[tokio::test]
async fn router_rejects_incomplete_quiz() {
    let (service, _, mailer) = build(0);
    let router = quiz_router(service, admin_config());

    let mut raw = submission("morgan@example.com");
    raw.section2 = None;
    let response = router
        .oneshot(
            Request::post("/api/submit-quiz")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&raw).expect("payload")))
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["details"][0], "Section 2 responses are required");
    assert!(mailer.delivered().is_empty());
}
