pub mod ai_helper;
pub mod generator;
pub mod grading;
pub mod parse;
pub mod prompt;

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FillBlank,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::MultipleChoice,
        QuestionKind::TrueFalse,
        QuestionKind::ShortAnswer,
        QuestionKind::FillBlank,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "Multiple Choice",
            QuestionKind::TrueFalse => "True False",
            QuestionKind::ShortAnswer => "Short Answer",
            QuestionKind::FillBlank => "Fill Blank",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::FillBlank => "fill_blank",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown question type {0:?}, expected multiple_choice, true_false, short_answer or fill_blank")]
pub struct UnknownKind(pub String);

impl FromStr for QuestionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', ' '], "_");
        match name.as_str() {
            "multiple_choice" | "mc" => Ok(QuestionKind::MultipleChoice),
            "true_false" | "tf" => Ok(QuestionKind::TrueFalse),
            "short_answer" | "sa" => Ok(QuestionKind::ShortAnswer),
            "fill_blank" | "fill_in_the_blank" | "fb" => Ok(QuestionKind::FillBlank),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty {0:?}, expected easy, medium or hard")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Ok(Difficulty::Easy),
            "medium" | "m" => Ok(Difficulty::Medium),
            "hard" | "h" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

/// Relative weight of each question kind in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMix {
    weights: Vec<(QuestionKind, u32)>,
}

impl Default for TypeMix {
    fn default() -> Self {
        Self::new(QuestionKind::ALL.iter().map(|k| (*k, 1)))
    }
}

impl TypeMix {
    pub fn new(weights: impl IntoIterator<Item = (QuestionKind, u32)>) -> Self {
        Self {
            weights: weights.into_iter().filter(|(_, w)| *w > 0).collect(),
        }
    }

    /// Apportions `count` slots by weight (largest remainder), then shuffles them.
    pub fn plan(&self, count: usize, rng: &mut impl Rng) -> Vec<QuestionKind> {
        let total: u64 = self.weights.iter().map(|(_, w)| u64::from(*w)).sum();
        if total == 0 || count == 0 {
            return Vec::new();
        }

        let count = count as u64;
        let mut shares: Vec<(QuestionKind, u64, u64)> = self
            .weights
            .iter()
            .map(|(kind, w)| {
                let exact = count * u64::from(*w);
                (*kind, exact / total, exact % total)
            })
            .collect();

        let assigned: u64 = shares.iter().map(|(_, n, _)| n).sum();
        let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
        by_remainder.sort_by(|a, b| shares[*b].2.cmp(&shares[*a].2));
        for i in by_remainder.into_iter().take((count - assigned) as usize) {
            shares[i].1 += 1;
        }

        let mut plan: Vec<QuestionKind> = shares
            .into_iter()
            .flat_map(|(kind, n, _)| std::iter::repeat(kind).take(n as usize))
            .collect();
        plan.shuffle(rng);
        plan
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub kind: QuestionKind,
    pub stem: String,
    /// Option texts without letter prefixes; empty unless multiple choice.
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub source_chunk_index: usize,
    /// Other spellings accepted for a fill-in-the-blank answer.
    pub accepted_answers: Vec<String>,
    /// What a good short answer should mention.
    pub key_points: Vec<String>,
}

impl Question {
    pub fn new(kind: QuestionKind, stem: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self {
            kind,
            stem: stem.into(),
            options: Vec::new(),
            correct_answer: correct_answer.into(),
            explanation: String::new(),
            source_chunk_index: 0,
            accepted_answers: Vec::new(),
            key_points: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_source_chunk(mut self, chunk_index: usize) -> Self {
        self.source_chunk_index = chunk_index;
        self
    }

    /// Letter shown in front of option `i`: A, B, C...
    pub fn option_letter(i: usize) -> char {
        (b'A' + (i % 26) as u8) as char
    }

    pub fn correct_option_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }

    /// The answer as shown to the user after grading.
    pub fn display_answer(&self) -> String {
        match self.correct_option_index() {
            Some(i) => format!("{}) {}", Self::option_letter(i), self.correct_answer),
            None => self.correct_answer.clone(),
        }
    }
}
