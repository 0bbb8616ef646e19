mod profile;
pub mod tally;

use super::domain::{QuizSubmission, ScoreVector, StyleCategory, StyleResult, StyleScore};
use profile::{rank, select_primary, select_secondary, select_supporting};

/// Internal consistency failures raised while ranking a score vector.
///
/// These never come from user input that passed validation; they point at a corrupted
/// score vector or category table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("score vector covers {found} of 8 style categories")]
    IncompleteScoreVector { found: usize },
    #[error("no style category found with polarity opposite to primary style {primary}")]
    MissingOppositePolarity { primary: StyleCategory },
    #[error("no style category left for the supporting position")]
    MissingSupporting,
}

/// Sum the Section 1 true-counts and Section 2 letter frequencies per category.
///
/// Tolerant of malformed input: groups are counted at whatever length they have and
/// unknown letters contribute nothing.
pub fn compute_score_vector(submission: &QuizSubmission) -> ScoreVector {
    let frequencies = tally::letter_frequencies(&submission.section2.answers);
    let mut scores = [0u8; 8];

    for category in StyleCategory::ordered() {
        let index = category.index();
        let section1 = tally::count_true(submission.section1.group(category));
        let section2 = frequencies.get(index).copied().unwrap_or_default();
        if let Some(slot) = scores.get_mut(index) {
            *slot = section1.saturating_add(section2);
        }
    }

    ScoreVector::from_array(scores)
}

/// Rank a score vector into primary, secondary, and supporting styles.
pub fn determine_style_profile(scores: &ScoreVector) -> Result<StyleResult, ScoringError> {
    if !scores.is_complete() {
        return Err(ScoringError::IncompleteScoreVector { found: scores.len() });
    }

    let ranked = rank(scores);
    let primary = select_primary(&ranked).ok_or(ScoringError::IncompleteScoreVector { found: 0 })?;
    let secondary = select_secondary(&ranked, primary).ok_or(
        ScoringError::MissingOppositePolarity {
            primary: primary.category,
        },
    )?;
    let supporting = select_supporting(&ranked, primary.category, secondary.category)
        .ok_or(ScoringError::MissingSupporting)?;

    Ok(StyleResult {
        primary: StyleScore::new(primary.category, primary.score),
        secondary: StyleScore::new(secondary.category, secondary.score),
        supporting: StyleScore::new(supporting.category, supporting.score),
        all_scores: scores.clone(),
    })
}

/// Score a submission end to end. Same submission in, same result out.
pub fn calculate_style_scores(submission: &QuizSubmission) -> Result<StyleResult, ScoringError> {
    let scores = compute_score_vector(submission);
    determine_style_profile(&scores)
}
