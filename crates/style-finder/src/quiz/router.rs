use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::catalog::describe;
use super::domain::StyleCategory;
use super::notification::CoachMailer;
use super::repository::{
    EmailQueue, RepositoryError, SubmissionId, SubmissionRecord, SubmissionRepository,
};
use super::service::{QuizService, QuizServiceError};
use super::validation::RawSubmission;
use crate::config::AdminConfig;

const DEFAULT_LOOKBACK_DAYS: u32 = 7;
const DEFAULT_LIST_LIMIT: usize = 100;
const QUEUE_BATCH_SIZE: usize = 10;

/// Shared handler state: the service plus the shared secrets guarding admin routes.
pub struct QuizRouterState<R, Q, M> {
    pub(crate) service: Arc<QuizService<R, Q, M>>,
    pub(crate) admin: Arc<AdminConfig>,
}

impl<R, Q, M> Clone for QuizRouterState<R, Q, M> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            admin: self.admin.clone(),
        }
    }
}

/// Router exposing quiz intake, the results page lookup, admin tooling, and the queue cron hook.
pub fn quiz_router<R, Q, M>(service: Arc<QuizService<R, Q, M>>, admin: AdminConfig) -> Router
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    let state = QuizRouterState {
        service,
        admin: Arc::new(admin),
    };

    Router::new()
        .route(
            "/api/submit-quiz",
            post(submit_handler::<R, Q, M>)
                .get(method_not_allowed)
                .put(method_not_allowed)
                .delete(method_not_allowed),
        )
        .route("/api/styles/:slug", get(style_handler))
        .route("/api/admin/verify", post(verify_handler::<R, Q, M>))
        .route("/api/admin/retry-email", post(retry_handler::<R, Q, M>))
        .route("/api/admin/submissions", get(submissions_handler::<R, Q, M>))
        .route(
            "/api/admin/submissions/export",
            get(export_handler::<R, Q, M>),
        )
        .route(
            "/api/cron/process-email-queue",
            get(cron_handler::<R, Q, M>).post(cron_handler::<R, Q, M>),
        )
        .with_state(state)
}

pub(crate) async fn submit_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => return malformed_body(rejection),
    };

    match run_blocking(&state.service, move |service| service.submit(raw)).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(other) => service_error_response(other),
    }
}

async fn method_not_allowed() -> Response {
    let payload = json!({
        "error": "Method not allowed. This endpoint only accepts POST requests.",
    });
    (StatusCode::METHOD_NOT_ALLOWED, Json(payload)).into_response()
}

pub(crate) async fn style_handler(Path(slug): Path<String>) -> Response {
    match StyleCategory::from_slug(&slug) {
        Some(category) => (StatusCode::OK, Json(describe(category))).into_response(),
        None => {
            let payload = json!({ "error": format!("unknown style '{slug}'") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn verify_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    headers: HeaderMap,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if !bearer_matches(&headers, &state.admin.token) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({ "verified": true }))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct RetryRequest {
    #[serde(rename = "submissionId", default)]
    submission_id: Option<String>,
}

pub(crate) async fn retry_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    headers: HeaderMap,
    payload: Result<Json<RetryRequest>, JsonRejection>,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if !bearer_matches(&headers, &state.admin.token) {
        return unauthorized();
    }
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed_body(rejection),
    };

    let Some(submission_id) = request.submission_id.filter(|id| !id.trim().is_empty()) else {
        let payload = json!({ "error": "Submission ID required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    let id = SubmissionId(submission_id);
    match run_blocking(&state.service, move |service| service.retry_notification(&id)).await {
        Ok(outcome) => {
            let payload = json!({ "success": true, "message": outcome.message() });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(QuizServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({ "error": "Submission not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmissionQuery {
    #[serde(default)]
    days: Option<u32>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    email: Option<String>,
}

fn load_submissions<R, Q, M>(
    service: &QuizService<R, Q, M>,
    query: &SubmissionQuery,
) -> Result<Vec<SubmissionRecord>, QuizServiceError>
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    match query.email.as_deref().filter(|email| !email.trim().is_empty()) {
        Some(email) => service.search(email),
        None => service.recent(
            query.days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        ),
    }
}

pub(crate) async fn submissions_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    headers: HeaderMap,
    Query(query): Query<SubmissionQuery>,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if !bearer_matches(&headers, &state.admin.token) {
        return unauthorized();
    }

    match run_blocking(&state.service, move |service| load_submissions(service, &query)).await {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.summary_view()).collect();
            (StatusCode::OK, Json(json!({ "submissions": views }))).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn export_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    headers: HeaderMap,
    Query(query): Query<SubmissionQuery>,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if !bearer_matches(&headers, &state.admin.token) {
        return unauthorized();
    }

    let exported = run_blocking(&state.service, move |service| {
        load_submissions(service, &query).and_then(|records| service.export_csv(&records))
    })
    .await;
    match exported {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"quiz_results_{}.csv\"",
                Utc::now().format("%Y-%m-%d")
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn cron_handler<R, Q, M>(
    State(state): State<QuizRouterState<R, Q, M>>,
    headers: HeaderMap,
) -> Response
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
{
    if let Some(secret) = state.admin.cron_secret.as_deref() {
        if !bearer_matches(&headers, secret) {
            return unauthorized();
        }
    }

    match run_blocking(&state.service, |service| service.process_queue(QUEUE_BATCH_SIZE)).await {
        Ok(results) => {
            let payload = json!({
                "success": true,
                "timestamp": Utc::now().to_rfc3339(),
                "results": results,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(other) => {
            error!(error = %other, "email queue processing failed");
            let payload = json!({
                "error": "Queue processing failed",
                "details": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

/// Service calls block on storage locks and the mail transport, so they run on the blocking pool.
async fn run_blocking<R, Q, M, T, F>(
    service: &Arc<QuizService<R, Q, M>>,
    work: F,
) -> Result<T, QuizServiceError>
where
    R: SubmissionRepository + 'static,
    Q: EmailQueue + 'static,
    M: CoachMailer + 'static,
    T: Send + 'static,
    F: FnOnce(&QuizService<R, Q, M>) -> Result<T, QuizServiceError> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .unwrap_or_else(|join_error| Err(QuizServiceError::Worker(join_error.to_string())))
}

fn malformed_body(rejection: JsonRejection) -> Response {
    let reason = rejection.body_text();
    warn!(%reason, "rejected malformed request body");
    let payload = json!({ "error": "Validation failed", "details": [reason] });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

fn service_error_response(error: QuizServiceError) -> Response {
    match error {
        QuizServiceError::Validation(details) => {
            let payload = json!({ "error": "Validation failed", "details": details });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        QuizServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "Submission not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        other => {
            error!(error = %other, "quiz request failed");
            let payload = json!({
                "error": "Internal server error. Please try again or contact support.",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
