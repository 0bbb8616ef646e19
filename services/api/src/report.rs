use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use style_finder::error::AppError;
use style_finder::quiz::{
    calculate_style_scores, generate_breakdown, validate_submission, QuizServiceError,
    RawSubmission, StyleCategory, StyleResult, MAX_CATEGORY_SCORE,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Path to a submission JSON document (same shape as the submit endpoint body)
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Append the per-question response breakdown sent to the coach
    #[arg(long)]
    pub(crate) breakdown: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs { file, breakdown } = args;
    let raw: RawSubmission = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
    print!("{}", render_score(raw, breakdown)?);
    Ok(())
}

pub(crate) fn render_score(raw: RawSubmission, include_breakdown: bool) -> Result<String, AppError> {
    let errors = validate_submission(&raw);
    if !errors.is_empty() {
        return Err(QuizServiceError::Validation(errors).into());
    }

    let submission = raw.into_submission(Utc::now());
    let result = calculate_style_scores(&submission)?;

    let mut out = String::new();
    out.push_str(&format!(
        "Style profile for {} <{}>\n",
        submission.user_name, submission.user_email
    ));
    write_profile(&mut out, &result);
    if include_breakdown {
        out.push('\n');
        out.push_str(&generate_breakdown(&submission));
    }
    Ok(out)
}

fn write_profile(out: &mut String, result: &StyleResult) {
    for (label, style) in [
        ("Primary", &result.primary),
        ("Secondary", &result.secondary),
        ("Supporting", &result.supporting),
    ] {
        out.push_str(&format!(
            "  {label:<10} {} {:<12} {:>2}/{MAX_CATEGORY_SCORE} ({})\n",
            style.id,
            style.name,
            style.score,
            style.polarity().label()
        ));
    }
    out.push_str(&format!("  Results page: /styles/{}\n", result.primary_slug()));
    out.push_str("\nAll scores:\n");
    for (category, score) in result.all_scores.iter() {
        out.push_str(&format!("  {category} {:<12} {score:>2}\n", category.name()));
    }
}

pub(crate) fn run_styles() {
    print!("{}", render_styles());
}

pub(crate) fn render_styles() -> String {
    let mut out = String::from("ID  Name          Polarity  Slug\n");
    for category in StyleCategory::ordered() {
        out.push_str(&format!(
            "{:<3} {:<13} {:<9} {}\n",
            category.letter(),
            category.name(),
            category.polarity().label(),
            category.slug()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(answers: &str) -> RawSubmission {
        let group = |trues: usize| (0..7).map(|index| index < trues).collect::<Vec<bool>>();
        serde_json::from_value(json!({
            "userName": "Sam",
            "userEmail": "sam@example.com",
            "section1": {
                "groupA": group(1), "groupB": group(6), "groupC": group(1), "groupD": group(2),
                "groupE": group(0), "groupF": group(3), "groupG": group(1), "groupH": group(4),
            },
            "section2": {
                "answers": answers.chars().map(|c| c.to_string()).collect::<Vec<_>>(),
            },
        }))
        .expect("payload parses")
    }

    #[test]
    fn render_score_prints_ranked_profile() {
        let output = render_score(payload("bbbbbbbhhhhaccdfg"), false).expect("scores");

        assert!(output.starts_with("Style profile for Sam <sam@example.com>\n"));
        assert!(output.contains("Primary    B Whimsical    13/24 (Yin)"));
        assert!(output.contains("Secondary  C Classic       3/24 (Yang)"));
        assert!(output.contains("Supporting H Natural       8/24 (Yin)"));
        assert!(output.contains("Results page: /styles/whimsical"));
        assert!(!output.contains("SECTION 1 RESPONSES"));
    }

    #[test]
    fn render_score_can_append_breakdown() {
        let output = render_score(payload("bbbbbbbhhhhaccdfg"), true).expect("scores");
        assert!(output.contains("SECTION 1 RESPONSES (True/False by Group):"));
        assert!(output.contains("B (Whimsical): 7/17"));
    }

    #[test]
    fn render_score_rejects_invalid_submissions() {
        match render_score(payload("bbbb"), false) {
            Err(AppError::Quiz(QuizServiceError::Validation(errors))) => {
                assert_eq!(errors, vec!["Section 2 must have exactly 17 responses"])
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn styles_table_lists_all_categories() {
        let table = render_styles();
        assert_eq!(table.lines().count(), 9);
        assert!(table.contains("G   Contemporary  Yang      contemporary"));
        assert!(table.contains("H   Natural       Yin       natural"));
    }
}
