use super::domain::{QuizSubmission, StyleCategory, SECTION1_GROUP_LEN, SECTION2_QUESTION_COUNT};
use super::scoring::tally::{count_true, letter_frequencies};

/// Plain-text transcript of every answer plus per-category tallies, for the coach email.
pub fn generate_breakdown(submission: &QuizSubmission) -> String {
    let mut out = String::from("SECTION 1 RESPONSES (True/False by Group):\n\n");

    for category in StyleCategory::ordered() {
        let responses = submission.section1.group(category);
        let letter = category.letter();
        out.push_str(&format!(
            "Group {letter} ({}): {}/{SECTION1_GROUP_LEN} True responses\n",
            category.name(),
            count_true(responses)
        ));
        for (index, response) in responses.iter().enumerate() {
            let label = if *response { "TRUE" } else { "FALSE" };
            out.push_str(&format!("  {letter}{}: {label}\n", index + 1));
        }
        out.push('\n');
    }

    out.push_str("\nSECTION 2 RESPONSES (Multiple Choice):\n\n");
    for (index, answer) in submission.section2.answers.iter().enumerate() {
        out.push_str(&format!("Q{}: {}\n", index + 1, answer.to_uppercase()));
    }

    out.push_str("\nSECTION 2 LETTER FREQUENCIES:\n");
    let frequencies = letter_frequencies(&submission.section2.answers);
    for category in StyleCategory::ordered() {
        let count = frequencies.get(category.index()).copied().unwrap_or_default();
        out.push_str(&format!(
            "{} ({}): {count}/{SECTION2_QUESTION_COUNT}\n",
            category.letter(),
            category.name()
        ));
    }

    out
}
