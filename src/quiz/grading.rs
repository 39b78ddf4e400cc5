use super::{Question, QuestionKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    /// 0..=100, only when the model graded the answer.
    pub score: Option<u8>,
    pub feedback: Option<String>,
    /// Set when the model couldn't be asked and a local comparison decided.
    pub fallback: bool,
}

impl Verdict {
    pub fn local(correct: bool) -> Self {
        Self {
            correct,
            ..Self::default()
        }
    }
}

pub fn truth_value(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "t" | "true" | "yes" | "y" => Some(true),
        "f" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Grades the objective kinds. Returns `None` for short answers, which need the model.
pub fn grade_objective(question: &Question, response: &str) -> Option<bool> {
    let response = response.trim();
    let correct = match question.kind {
        QuestionKind::MultipleChoice => chosen_option(question, response)
            .zip(question.correct_option_index())
            .map_or(false, |(chosen, correct)| chosen == correct),
        QuestionKind::TrueFalse => {
            truth_value(response).is_some() && truth_value(response) == truth_value(&question.correct_answer)
        }
        QuestionKind::FillBlank => std::iter::once(&question.correct_answer)
            .chain(&question.accepted_answers)
            .any(|accepted| same_text(accepted, response)),
        QuestionKind::ShortAnswer => return None,
    };
    Some(correct)
}

/// Local stand-in for model grading of a short answer.
pub fn substring_match(expected: &str, response: &str) -> bool {
    let expected = expected.trim().to_lowercase();
    let response = response.trim().to_lowercase();
    if response.is_empty() || expected.is_empty() {
        return false;
    }
    response.contains(&expected) || expected.contains(&response)
}

/// Index of the option the response picks, by letter or by full option text.
fn chosen_option(question: &Question, response: &str) -> Option<usize> {
    let letter = response.trim_end_matches([')', '.']);
    if letter.chars().count() == 1 {
        let c = letter.chars().next()?.to_ascii_uppercase();
        return (0..question.options.len()).find(|i| Question::option_letter(*i) == c);
    }
    question.options.iter().position(|o| same_text(o, response))
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
