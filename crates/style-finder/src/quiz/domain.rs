use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of true/false statements in each Section 1 group.
pub const SECTION1_GROUP_LEN: usize = 7;
/// Number of multiple choice questions in Section 2.
pub const SECTION2_QUESTION_COUNT: usize = 17;
/// Highest score a single category can reach on a complete submission.
pub const MAX_CATEGORY_SCORE: u8 = (SECTION1_GROUP_LEN + SECTION2_QUESTION_COUNT) as u8;

/// The eight style categories, declared in canonical A..H order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StyleCategory {
    #[serde(rename = "A")]
    Dramatic,
    #[serde(rename = "B")]
    Whimsical,
    #[serde(rename = "C")]
    Classic,
    #[serde(rename = "D")]
    Romantic,
    #[serde(rename = "E")]
    Sporty,
    #[serde(rename = "F")]
    Delicate,
    #[serde(rename = "G")]
    Contemporary,
    #[serde(rename = "H")]
    Natural,
}

impl StyleCategory {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Dramatic,
            Self::Whimsical,
            Self::Classic,
            Self::Romantic,
            Self::Sporty,
            Self::Delicate,
            Self::Contemporary,
            Self::Natural,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Dramatic => 0,
            Self::Whimsical => 1,
            Self::Classic => 2,
            Self::Romantic => 3,
            Self::Sporty => 4,
            Self::Delicate => 5,
            Self::Contemporary => 6,
            Self::Natural => 7,
        }
    }

    /// Upper-case letter identifying the category on the quiz sheet.
    pub const fn letter(self) -> char {
        match self {
            Self::Dramatic => 'A',
            Self::Whimsical => 'B',
            Self::Classic => 'C',
            Self::Romantic => 'D',
            Self::Sporty => 'E',
            Self::Delicate => 'F',
            Self::Contemporary => 'G',
            Self::Natural => 'H',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Dramatic => "Dramatic",
            Self::Whimsical => "Whimsical",
            Self::Classic => "Classic",
            Self::Romantic => "Romantic",
            Self::Sporty => "Sporty",
            Self::Delicate => "Delicate",
            Self::Contemporary => "Contemporary",
            Self::Natural => "Natural",
        }
    }

    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Dramatic | Self::Classic | Self::Sporty | Self::Contemporary => Polarity::Yang,
            Self::Whimsical | Self::Romantic | Self::Delicate | Self::Natural => Polarity::Yin,
        }
    }

    /// Resolve a letter case-insensitively.
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|category| category.letter() == upper)
    }

    /// Resolve a quiz answer such as `"a"` or `"G"`; anything other than a single known letter is rejected.
    pub fn from_answer(answer: &str) -> Option<Self> {
        let mut chars = answer.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::from_letter(letter),
            _ => None,
        }
    }

    /// Results page key: the display name lower-cased with whitespace runs replaced by `-`.
    pub fn slug(self) -> String {
        slugify(self.name())
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let wanted = slug.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|category| category.slug() == wanted)
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

pub(crate) fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Fixed Yin/Yang partition of the categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Yang,
    Yin,
}

impl Polarity {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yang => Self::Yin,
            Self::Yin => Self::Yang,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Yang => "Yang",
            Self::Yin => "Yin",
        }
    }
}

/// Section 1 answers, one true/false group per category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section1Responses {
    #[serde(rename = "groupA")]
    pub group_a: Vec<bool>,
    #[serde(rename = "groupB")]
    pub group_b: Vec<bool>,
    #[serde(rename = "groupC")]
    pub group_c: Vec<bool>,
    #[serde(rename = "groupD")]
    pub group_d: Vec<bool>,
    #[serde(rename = "groupE")]
    pub group_e: Vec<bool>,
    #[serde(rename = "groupF")]
    pub group_f: Vec<bool>,
    #[serde(rename = "groupG")]
    pub group_g: Vec<bool>,
    #[serde(rename = "groupH")]
    pub group_h: Vec<bool>,
}

impl Section1Responses {
    pub fn group(&self, category: StyleCategory) -> &[bool] {
        match category {
            StyleCategory::Dramatic => &self.group_a,
            StyleCategory::Whimsical => &self.group_b,
            StyleCategory::Classic => &self.group_c,
            StyleCategory::Romantic => &self.group_d,
            StyleCategory::Sporty => &self.group_e,
            StyleCategory::Delicate => &self.group_f,
            StyleCategory::Contemporary => &self.group_g,
            StyleCategory::Natural => &self.group_h,
        }
    }

    pub fn group_mut(&mut self, category: StyleCategory) -> &mut Vec<bool> {
        match category {
            StyleCategory::Dramatic => &mut self.group_a,
            StyleCategory::Whimsical => &mut self.group_b,
            StyleCategory::Classic => &mut self.group_c,
            StyleCategory::Romantic => &mut self.group_d,
            StyleCategory::Sporty => &mut self.group_e,
            StyleCategory::Delicate => &mut self.group_f,
            StyleCategory::Contemporary => &mut self.group_g,
            StyleCategory::Natural => &mut self.group_h,
        }
    }
}

/// Section 2 answers, one letter per question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section2Responses {
    pub answers: Vec<String>,
}

/// A completed quiz as it reaches the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub user_name: String,
    pub user_email: String,
    pub timestamp: DateTime<Utc>,
    pub section1: Section1Responses,
    pub section2: Section2Responses,
}

/// Score per category. Vectors built by the engine always hold all eight entries;
/// vectors rehydrated with [`ScoreVector::from_entries`] may not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreVector(BTreeMap<StyleCategory, u8>);

impl ScoreVector {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (StyleCategory, u8)>,
    {
        Self(entries.into_iter().collect())
    }

    pub(crate) fn from_array(scores: [u8; 8]) -> Self {
        Self::from_entries(
            StyleCategory::ordered()
                .into_iter()
                .zip(scores),
        )
    }

    pub fn get(&self, category: StyleCategory) -> Option<u8> {
        self.0.get(&category).copied()
    }

    /// Entries in canonical category order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleCategory, u8)> + '_ {
        self.0.iter().map(|(category, score)| (*category, *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        StyleCategory::ordered()
            .iter()
            .all(|category| self.0.contains_key(category))
    }

    pub fn total(&self) -> u32 {
        self.0.values().map(|score| u32::from(*score)).sum()
    }
}

/// One ranked position of a style result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleScore {
    pub id: StyleCategory,
    pub name: String,
    pub score: u8,
}

impl StyleScore {
    pub fn new(category: StyleCategory, score: u8) -> Self {
        Self {
            id: category,
            name: category.name().to_string(),
            score,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.id.polarity()
    }
}

/// Ranked style profile derived from a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleResult {
    pub primary: StyleScore,
    pub secondary: StyleScore,
    pub supporting: StyleScore,
    pub all_scores: ScoreVector,
}

impl StyleResult {
    /// The only piece of the profile surfaced to the quiz taker.
    pub fn primary_slug(&self) -> String {
        self.primary.id.slug()
    }
}
