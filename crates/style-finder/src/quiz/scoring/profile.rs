use super::super::domain::{Polarity, ScoreVector, StyleCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RankedScore {
    pub category: StyleCategory,
    pub score: u8,
}

/// Scores descending; equal scores stay in canonical A..H order.
pub(crate) fn rank(scores: &ScoreVector) -> Vec<RankedScore> {
    let mut ranked: Vec<RankedScore> = scores
        .iter()
        .map(|(category, score)| RankedScore { category, score })
        .collect();
    ranked.sort_by(|left, right| right.score.cmp(&left.score));
    ranked
}

/// Highest score wins; when several categories share it, a Yang category takes precedence.
pub(crate) fn select_primary(ranked: &[RankedScore]) -> Option<RankedScore> {
    let top_score = ranked.first()?.score;
    let tied: Vec<&RankedScore> = ranked
        .iter()
        .filter(|entry| entry.score == top_score)
        .collect();

    tied.iter()
        .find(|entry| entry.category.polarity() == Polarity::Yang)
        .or_else(|| tied.first())
        .map(|entry| **entry)
}

/// Highest-ranked category on the opposite side of the Yin/Yang partition.
pub(crate) fn select_secondary(ranked: &[RankedScore], primary: RankedScore) -> Option<RankedScore> {
    let wanted = primary.category.polarity().opposite();
    ranked
        .iter()
        .find(|entry| entry.category.polarity() == wanted)
        .copied()
}

/// Highest-ranked category that is neither primary nor secondary. No polarity preference.
pub(crate) fn select_supporting(
    ranked: &[RankedScore],
    primary: StyleCategory,
    secondary: StyleCategory,
) -> Option<RankedScore> {
    ranked
        .iter()
        .find(|entry| entry.category != primary && entry.category != secondary)
        .copied()
}
