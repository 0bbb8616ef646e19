use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::breakdown::generate_breakdown;
use super::domain::{QuizSubmission, StyleResult, StyleScore, MAX_CATEGORY_SCORE};
use crate::config::NotificationConfig;

/// Rendered coach notification, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outbound transport seam (SMTP relay, provider API, log sink).
///
/// `send` blocks until the transport answers. Async callers run it through
/// `tokio::task::spawn_blocking` so a slow relay never stalls the runtime workers.
pub trait CoachMailer: Send + Sync {
    fn send(&self, email: &CoachEmail) -> Result<(), MailerError>;
}

/// Notification delivery failure. Always recoverable through the retry queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailerError {
    #[error("email delivery is disabled")]
    Disabled,
    #[error("email rate limit of {limit} per hour exceeded")]
    RateLimited { limit: u32 },
    #[error("mail transport failed: {0}")]
    Transport(String),
}

fn score_line(label: &str, style: &StyleScore) -> String {
    format!(
        "{label} Style: {} ({}) - Score: {}/{MAX_CATEGORY_SCORE}",
        style.name, style.id, style.score
    )
}

/// Build the full coach email: contact details, ranked profile, all scores, and the raw breakdown.
pub fn render_coach_email(
    submission: &QuizSubmission,
    result: &StyleResult,
    recipient: &str,
) -> CoachEmail {
    let completed = submission.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let breakdown = generate_breakdown(submission);
    let ranked = ranked_scores(result);

    let mut text = String::from("StyleFinder ID Assessment Results\n\n");
    text.push_str("CLIENT INFORMATION:\n");
    text.push_str(&format!("Name: {}\n", submission.user_name));
    text.push_str(&format!("Email: {}\n", submission.user_email));
    text.push_str(&format!("Completed: {completed}\n\n"));
    text.push_str("STYLE PROFILE RESULTS:\n");
    text.push_str(&format!("{}\n", score_line("Primary", &result.primary)));
    text.push_str(&format!("{}\n", score_line("Secondary", &result.secondary)));
    text.push_str(&format!("{}\n\n", score_line("Supporting", &result.supporting)));
    text.push_str("ALL STYLE SCORES:\n");
    for style in &ranked {
        text.push_str(&format!(
            "{} - {}: {}/{MAX_CATEGORY_SCORE} ({})\n",
            style.id,
            style.name,
            style.score,
            style.polarity().label()
        ));
    }
    text.push('\n');
    text.push_str(&breakdown);
    text.push_str("\nGenerated by StyleFinder ID Assessment System\n");

    let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>");
    html.push_str("<h1>StyleFinder ID Assessment Results</h1>");
    html.push_str(&format!(
        "<h2>Client Information</h2><p><strong>Name:</strong> {}</p><p><strong>Email:</strong> {}</p><p><strong>Completed:</strong> {completed}</p>",
        escape_html(&submission.user_name),
        escape_html(&submission.user_email),
    ));
    html.push_str("<h2>Style Profile Results</h2>");
    for (label, style) in [
        ("Primary", &result.primary),
        ("Secondary", &result.secondary),
        ("Supporting", &result.supporting),
    ] {
        html.push_str(&format!("<p>{}</p>", escape_html(&score_line(label, style))));
    }
    html.push_str("<table><tr><th>Style</th><th>Name</th><th>Score</th><th>Category</th></tr>");
    for style in &ranked {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}/{MAX_CATEGORY_SCORE}</td><td>{}</td></tr>",
            style.id,
            style.name,
            style.score,
            style.polarity().label()
        ));
    }
    html.push_str("</table><h2>Detailed Response Breakdown</h2><pre>");
    html.push_str(&escape_html(&breakdown));
    html.push_str("</pre></body></html>");

    CoachEmail {
        to: recipient.to_string(),
        subject: format!("StyleFinder Assessment Results - {}", submission.user_name),
        text,
        html,
    }
}

fn ranked_scores(result: &StyleResult) -> Vec<StyleScore> {
    let mut scores: Vec<StyleScore> = result
        .all_scores
        .iter()
        .map(|(category, score)| StyleScore::new(category, score))
        .collect();
    scores.sort_by(|left, right| right.score.cmp(&left.score));
    scores
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Delivery dials applied on top of the raw transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub enabled: bool,
    pub coach_email: String,
    pub backup_email: Option<String>,
    pub rate_limit_per_hour: u32,
}

impl From<&NotificationConfig> for DeliveryPolicy {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
            coach_email: config.coach_email.clone(),
            backup_email: config.backup_email.clone(),
            rate_limit_per_hour: config.rate_limit_per_hour,
        }
    }
}

#[derive(Debug, Default)]
struct RateWindow {
    sent: u32,
    resets_at: Option<DateTime<Utc>>,
}

/// Applies the delivery policy (kill switch, hourly cap, backup copy) around a mailer.
pub struct MailDispatcher<M> {
    mailer: Arc<M>,
    policy: DeliveryPolicy,
    window: Mutex<RateWindow>,
}

impl<M> MailDispatcher<M>
where
    M: CoachMailer + 'static,
{
    pub fn new(mailer: Arc<M>, policy: DeliveryPolicy) -> Self {
        Self {
            mailer,
            policy,
            window: Mutex::new(RateWindow::default()),
        }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    pub fn render(&self, submission: &QuizSubmission, result: &StyleResult) -> CoachEmail {
        render_coach_email(submission, result, &self.policy.coach_email)
    }

    pub fn deliver(&self, email: &CoachEmail) -> Result<(), MailerError> {
        if !self.policy.enabled {
            return Err(MailerError::Disabled);
        }
        self.acquire_slot(Utc::now())?;

        match self.mailer.send(email) {
            Ok(()) => {
                info!(recipient = %email.to, subject = %email.subject, "coach email sent");
                Ok(())
            }
            Err(error) => {
                warn!(recipient = %email.to, %error, "coach email failed");
                self.send_backup(email, &error);
                Err(error)
            }
        }
    }

    fn acquire_slot(&self, now: DateTime<Utc>) -> Result<(), MailerError> {
        let limit = self.policy.rate_limit_per_hour;
        let mut window = self
            .window
            .lock()
            .map_err(|_| MailerError::Transport("rate limiter unavailable".to_string()))?;

        let expired = window.resets_at.map(|reset| now >= reset).unwrap_or(true);
        if expired {
            window.sent = 0;
            window.resets_at = Some(now + Duration::hours(1));
        }
        if window.sent >= limit {
            warn!(limit, "coach email rate limit exceeded");
            return Err(MailerError::RateLimited { limit });
        }
        window.sent += 1;
        Ok(())
    }

    fn send_backup(&self, email: &CoachEmail, error: &MailerError) {
        let Some(backup) = self.policy.backup_email.as_deref() else {
            return;
        };
        if backup == email.to {
            return;
        }

        let copy = CoachEmail {
            to: backup.to_string(),
            subject: format!("FAILED EMAIL DELIVERY: {}", email.subject),
            text: format!(
                "Original recipient: {}\nError: {error}\n\n--- ORIGINAL EMAIL ---\n{}",
                email.to, email.text
            ),
            html: email.html.clone(),
        };
        match self.mailer.send(&copy) {
            Ok(()) => info!(recipient = %backup, "backup copy of failed coach email sent"),
            Err(backup_error) => warn!(recipient = %backup, error = %backup_error, "backup email failed"),
        }
    }
}
