//! Counting primitives shared by the score vector and the response breakdown.

use super::super::domain::StyleCategory;

/// Number of `true` answers in a Section 1 group.
pub fn count_true(responses: &[bool]) -> u8 {
    let count = responses.iter().filter(|response| **response).count();
    u8::try_from(count).unwrap_or(u8::MAX)
}

/// Section 2 letter frequencies indexed by [`StyleCategory::index`].
///
/// Letters match case-insensitively; answers that do not resolve to a category are skipped.
pub fn letter_frequencies<S: AsRef<str>>(answers: &[S]) -> [u8; 8] {
    let mut counts = [0u8; 8];
    for answer in answers {
        if let Some(category) = StyleCategory::from_answer(answer.as_ref()) {
            if let Some(slot) = counts.get_mut(category.index()) {
                *slot = slot.saturating_add(1);
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_true_ignores_false_entries() {
        assert_eq!(count_true(&[true, false, true, false, true, false, true]), 4);
        assert_eq!(count_true(&[]), 0);
    }

    #[test]
    fn frequencies_are_case_insensitive_and_skip_unknown_letters() {
        let answers = ["a", "A", "g", "z", "", "ab", "H"];
        let counts = letter_frequencies(&answers);

        assert_eq!(counts[StyleCategory::Dramatic.index()], 2);
        assert_eq!(counts[StyleCategory::Contemporary.index()], 1);
        assert_eq!(counts[StyleCategory::Natural.index()], 1);
        assert_eq!(counts.iter().map(|count| u32::from(*count)).sum::<u32>(), 4);
    }
}
