use super::{Difficulty, Question, QuestionKind};

/// Longest slice of chunk text embedded in a prompt, in characters.
pub const MAX_CONTEXT_CHARS: usize = 3000;

const PREAMBLE: &str = "You are a helpful assistant that generates educational quiz questions. Always respond with valid JSON.";

const GRADER_PREAMBLE: &str = "You are an educational assistant evaluating student answers. Be fair but thorough.";

pub fn question_prompt(kind: QuestionKind, difficulty: Difficulty, text: &str) -> String {
    let (task, format) = match kind {
        QuestionKind::MultipleChoice => (
            "one multiple choice question with exactly four options, one of them correct",
            r#"{
  "question": "What is...",
  "options": ["A) Option 1", "B) Option 2", "C) Option 3", "D) Option 4"],
  "correct_answer": "A",
  "explanation": "Brief explanation of why this is correct"
}"#,
        ),
        QuestionKind::TrueFalse => (
            "one true/false statement (either true or false according to the text)",
            r#"{
  "question": "Statement to evaluate...",
  "correct_answer": "True",
  "explanation": "Brief explanation of why this is true/false"
}"#,
        ),
        QuestionKind::ShortAnswer => (
            "one short answer question that needs a 1-3 sentence answer",
            r#"{
  "question": "What...",
  "sample_answer": "Sample correct answer",
  "key_points": ["Key point 1", "Key point 2"],
  "explanation": "Brief explanation"
}"#,
        ),
        QuestionKind::FillBlank => (
            "one fill-in-the-blank sentence, using _____ to mark the blank",
            r#"{
  "question": "The process of _____ involves...",
  "correct_answer": "the missing word or phrase",
  "accepted_answers": ["an acceptable synonym"],
  "explanation": "Brief explanation"
}"#,
        ),
    };

    format!(
        "{PREAMBLE}\n\nBased on the following text, generate {task} at {difficulty} difficulty level. {hint}\n\nText:\n{text}\n\nReturn your response as a single JSON object with this exact format:\n{format}",
        hint = difficulty_hint(difficulty),
        text = excerpt(text),
    )
}

/// Appended to a prompt whose first reply could not be parsed.
pub fn strict_reminder(prompt: &str, kind: QuestionKind) -> String {
    let extra = match kind {
        QuestionKind::MultipleChoice => {
            " \"correct_answer\" must be the letter (A, B, C or D) of one of the listed options."
        }
        QuestionKind::TrueFalse => " \"correct_answer\" must be exactly \"True\" or \"False\".",
        _ => "",
    };
    format!(
        "{prompt}\n\nIMPORTANT: your previous reply could not be read. Reply with ONLY the JSON object, no Markdown, no commentary, every field filled in.{extra}"
    )
}

pub fn grading_prompt(question: &Question, response: &str) -> String {
    let key_points = if question.key_points.is_empty() {
        "(none given)".to_string()
    } else {
        question.key_points.join(", ")
    };
    format!(
        r#"{GRADER_PREAMBLE}

Evaluate if this answer is correct for the given question. Judge meaning, not wording.

Question: {stem}
Sample Answer: {sample}
Key Points: {key_points}
User Answer: {response}

Respond with JSON in this format:
{{
  "correct": true/false,
  "score": 0-100,
  "feedback": "Brief feedback on the answer"
}}"#,
        stem = question.stem,
        sample = question.correct_answer,
    )
}

fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Ask about facts stated directly in the text.",
        Difficulty::Medium => "Test understanding of the key concepts, not just recall.",
        Difficulty::Hard => "Require reasoning across several statements or applying a concept.",
    }
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}
