use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::{
    QuizSubmission, Section1Responses, Section2Responses, StyleCategory, SECTION1_GROUP_LEN,
    SECTION2_QUESTION_COUNT,
};

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Submission as received from the quiz client, before any shape checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub section1: Option<RawSection1>,
    #[serde(default)]
    pub section2: Option<RawSection2>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSection1 {
    #[serde(rename = "groupA", default)]
    pub group_a: Option<Vec<bool>>,
    #[serde(rename = "groupB", default)]
    pub group_b: Option<Vec<bool>>,
    #[serde(rename = "groupC", default)]
    pub group_c: Option<Vec<bool>>,
    #[serde(rename = "groupD", default)]
    pub group_d: Option<Vec<bool>>,
    #[serde(rename = "groupE", default)]
    pub group_e: Option<Vec<bool>>,
    #[serde(rename = "groupF", default)]
    pub group_f: Option<Vec<bool>>,
    #[serde(rename = "groupG", default)]
    pub group_g: Option<Vec<bool>>,
    #[serde(rename = "groupH", default)]
    pub group_h: Option<Vec<bool>>,
}

impl RawSection1 {
    pub fn group(&self, category: StyleCategory) -> Option<&Vec<bool>> {
        match category {
            StyleCategory::Dramatic => self.group_a.as_ref(),
            StyleCategory::Whimsical => self.group_b.as_ref(),
            StyleCategory::Classic => self.group_c.as_ref(),
            StyleCategory::Romantic => self.group_d.as_ref(),
            StyleCategory::Sporty => self.group_e.as_ref(),
            StyleCategory::Delicate => self.group_f.as_ref(),
            StyleCategory::Contemporary => self.group_g.as_ref(),
            StyleCategory::Natural => self.group_h.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSection2 {
    #[serde(default)]
    pub answers: Option<Vec<String>>,
}

impl RawSubmission {
    /// Build the scoring input. Missing pieces become empty values, so callers run
    /// [`validate_submission`] first when they need the strict shape.
    pub fn into_submission(self, received_at: DateTime<Utc>) -> QuizSubmission {
        let mut section1 = Section1Responses::default();
        if let Some(raw) = &self.section1 {
            for category in StyleCategory::ordered() {
                if let Some(group) = raw.group(category) {
                    *section1.group_mut(category) = group.clone();
                }
            }
        }

        QuizSubmission {
            user_name: self.user_name.unwrap_or_default().trim().to_string(),
            user_email: self.user_email.unwrap_or_default().trim().to_string(),
            timestamp: self.timestamp.unwrap_or(received_at),
            section1,
            section2: Section2Responses {
                answers: self
                    .section2
                    .and_then(|section| section.answers)
                    .unwrap_or_default(),
            },
        }
    }
}

impl From<&QuizSubmission> for RawSubmission {
    fn from(submission: &QuizSubmission) -> Self {
        let group = |category: StyleCategory| Some(submission.section1.group(category).to_vec());
        Self {
            user_name: Some(submission.user_name.clone()),
            user_email: Some(submission.user_email.clone()),
            timestamp: Some(submission.timestamp),
            section1: Some(RawSection1 {
                group_a: group(StyleCategory::Dramatic),
                group_b: group(StyleCategory::Whimsical),
                group_c: group(StyleCategory::Classic),
                group_d: group(StyleCategory::Romantic),
                group_e: group(StyleCategory::Sporty),
                group_f: group(StyleCategory::Delicate),
                group_g: group(StyleCategory::Contemporary),
                group_h: group(StyleCategory::Natural),
            }),
            section2: Some(RawSection2 {
                answers: Some(submission.section2.answers.clone()),
            }),
        }
    }
}

/// Check the submission shape and report every violation found. Empty means valid.
pub fn validate_submission(raw: &RawSubmission) -> Vec<String> {
    let mut errors = Vec::new();

    let has_name = raw
        .user_name
        .as_deref()
        .map(|name| !name.trim().is_empty())
        .unwrap_or(false);
    if !has_name {
        errors.push("Name is required".to_string());
    }

    if !raw.user_email.as_deref().map(is_valid_email).unwrap_or(false) {
        errors.push("Valid email is required".to_string());
    }

    match &raw.section1 {
        None => errors.push("Section 1 responses are required".to_string()),
        Some(section1) => {
            for category in StyleCategory::ordered() {
                let complete = section1
                    .group(category)
                    .map(|group| group.len() == SECTION1_GROUP_LEN)
                    .unwrap_or(false);
                if !complete {
                    errors.push(format!(
                        "group{} must have exactly {SECTION1_GROUP_LEN} responses",
                        category.letter()
                    ));
                }
            }
        }
    }

    match raw.section2.as_ref().map(|section| section.answers.as_ref()) {
        None => errors.push("Section 2 responses are required".to_string()),
        Some(Some(answers)) if answers.len() == SECTION2_QUESTION_COUNT => {
            for (index, answer) in answers.iter().enumerate() {
                if StyleCategory::from_answer(answer).is_none() {
                    errors.push(format!(
                        "Question {} has invalid answer: {answer}",
                        index + 1
                    ));
                }
            }
        }
        Some(_) => errors.push(format!(
            "Section 2 must have exactly {SECTION2_QUESTION_COUNT} responses"
        )),
    }

    errors
}

/// Loose `local@domain.tld` shape check: no whitespace, one `@`, a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map_or(false, |pattern| pattern.is_match(email))
}
