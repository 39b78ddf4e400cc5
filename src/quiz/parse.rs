//! Turns free-form completion text into a [`Question`] or a typed failure.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::grading::{truth_value, Verdict};
use super::{Question, QuestionKind};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJson,

    #[error("reply is not valid question JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question text is empty")]
    EmptyStem,

    #[error("missing field {0:?}")]
    MissingField(&'static str),

    #[error("need at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option {0:?} appears more than once")]
    DuplicateOption(String),

    #[error("correct answer {0:?} is not one of the options")]
    AnswerNotInOptions(String),

    #[error("{0:?} is neither true nor false")]
    InvalidTruthValue(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    #[serde(deserialize_with = "loose_string")]
    correct_answer: String,
    sample_answer: String,
    explanation: String,
    key_points: Vec<String>,
    #[serde(alias = "alternatives")]
    accepted_answers: Vec<String>,
}

/// Reads `true`, `"True"` and `1` alike as text.
fn loose_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    correct: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    feedback: Option<String>,
}

pub fn parse_question(kind: QuestionKind, chunk_index: usize, reply: &str) -> Result<Question, ParseError> {
    let value = json_value(reply)?;
    // an array reply is accepted; its first object is the question
    let value = match value {
        Value::Array(items) => items.into_iter().next().ok_or(ParseError::NoJson)?,
        other => other,
    };
    let raw: RawQuestion = serde_json::from_value(value)?;

    let stem = raw.question.trim().to_string();
    if stem.is_empty() {
        return Err(ParseError::EmptyStem);
    }
    let answer = raw.correct_answer.trim().to_string();

    let mut question = Question::new(kind, stem, "")
        .with_explanation(raw.explanation.trim())
        .with_source_chunk(chunk_index);

    match kind {
        QuestionKind::MultipleChoice => {
            let options: Vec<String> = raw
                .options
                .iter()
                .map(|o| strip_letter(o).to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if options.len() < 2 {
                return Err(ParseError::TooFewOptions(options.len()));
            }
            // option texts stay unique; grading resolves the answer by text
            if let Some(dup) = duplicate(&options) {
                return Err(ParseError::DuplicateOption(dup.to_string()));
            }
            if answer.is_empty() {
                return Err(ParseError::MissingField("correct_answer"));
            }
            let index = resolve_option(&options, &answer).ok_or(ParseError::AnswerNotInOptions(answer))?;
            question.correct_answer = options[index].clone();
            question = question.with_options(options);
        }
        QuestionKind::TrueFalse => {
            let value = truth_value(&answer).ok_or(ParseError::InvalidTruthValue(answer))?;
            question.correct_answer = String::from(if value { "True" } else { "False" });
        }
        QuestionKind::ShortAnswer => {
            let sample = match raw.sample_answer.trim() {
                "" => answer,
                s => s.to_string(),
            };
            if sample.is_empty() {
                return Err(ParseError::MissingField("sample_answer"));
            }
            question.correct_answer = sample;
            question.key_points = trimmed(raw.key_points);
        }
        QuestionKind::FillBlank => {
            if answer.is_empty() {
                return Err(ParseError::MissingField("correct_answer"));
            }
            question.correct_answer = answer;
            question.accepted_answers = trimmed(raw.accepted_answers);
        }
    }

    Ok(question)
}

pub fn parse_verdict(reply: &str) -> Result<Verdict, ParseError> {
    let raw: RawVerdict = serde_json::from_value(json_value(reply)?)?;
    Ok(Verdict {
        correct: raw.correct,
        score: raw.score.map(|s| s.clamp(0.0, 100.0).round() as u8),
        feedback: raw.feedback.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()),
        fallback: false,
    })
}

/// The first JSON object, or array of objects, embedded in the reply.
///
/// Each `{` or `[` is tried in turn and only one value is read from it, so
/// fences, bracketed tags and trailing chatter around the object are skipped.
fn json_value(reply: &str) -> Result<Value, ParseError> {
    let mut first_error = None;
    for (at, _) in reply.match_indices(['{', '[']) {
        let mut values = serde_json::Deserializer::from_str(&reply[at..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if holds_object(&value) => return Ok(value),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            _ => {}
        }
    }
    Err(first_error.map_or(ParseError::NoJson, ParseError::Json))
}

fn holds_object(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.first().map_or(false, Value::is_object),
        _ => false,
    }
}

fn duplicate(options: &[String]) -> Option<&str> {
    options.iter().enumerate().find_map(|(i, option)| {
        options[..i]
            .iter()
            .any(|earlier| earlier.eq_ignore_ascii_case(option))
            .then_some(option.as_str())
    })
}

/// "B) Paris" -> "Paris"; also handles "B. Paris" and "(B) Paris".
fn strip_letter(option: &str) -> &str {
    let option = option.trim();
    let rest = option.strip_prefix('(').unwrap_or(option);
    let mut chars = rest.chars();
    if let (Some(letter), Some(sep)) = (chars.next(), chars.next()) {
        let rest = chars.as_str();
        let spaced = rest.is_empty() || rest.starts_with(char::is_whitespace);
        if letter.is_ascii_alphabetic() && (sep == ')' || (matches!(sep, '.' | ':') && spaced)) {
            return rest.trim();
        }
    }
    option
}

fn resolve_option(options: &[String], answer: &str) -> Option<usize> {
    let by_letter = {
        let letter = strip_letter_only(answer);
        letter.and_then(|l| {
            let i = (l.to_ascii_uppercase() as u8).checked_sub(b'A')? as usize;
            (i < options.len()).then_some(i)
        })
    };
    by_letter.or_else(|| {
        let text = strip_letter(answer).to_lowercase();
        options.iter().position(|o| o.to_lowercase() == text)
    })
}

/// `"B"`, `"b)"`, `"(B)"` -> `'B'`.
fn strip_letter_only(answer: &str) -> Option<char> {
    let core = answer.trim().trim_matches(|c| matches!(c, '(' | ')' | '.' | ':'));
    let mut chars = core.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}

fn trimmed(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_choice_with_letter_answer() {
        let reply = r#"```json
{
  "question": "Which colour is the sky?",
  "options": ["A) Red", "B) Blue", "C) Green", "D) Black"],
  "correct_answer": "B",
  "explanation": "Scattering."
}
```"#;
        let q = parse_question(QuestionKind::MultipleChoice, 3, reply).unwrap();

        assert_eq!(q.options, vec!["Red", "Blue", "Green", "Black"]);
        assert_eq!(q.correct_answer, "Blue");
        assert!(q.options.contains(&q.correct_answer));
        assert_eq!(q.explanation, "Scattering.");
        assert_eq!(q.source_chunk_index, 3);
    }

    #[test]
    fn multiple_choice_answer_given_as_text() {
        let reply = r#"{"question": "Q?", "options": ["Red", "Blue"], "correct_answer": "b) blue"}"#;
        let q = parse_question(QuestionKind::MultipleChoice, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "Blue");
    }

    #[test]
    fn multiple_choice_answer_outside_options_fails() {
        let reply = r#"{"question": "Q?", "options": ["A) Red", "B) Blue"], "correct_answer": "E"}"#;
        let err = parse_question(QuestionKind::MultipleChoice, 0, reply).unwrap_err();
        assert!(matches!(err, ParseError::AnswerNotInOptions(a) if a == "E"));
    }

    #[test]
    fn multiple_choice_needs_options() {
        let reply = r#"{"question": "Q?", "options": ["A) Red"], "correct_answer": "A"}"#;
        assert!(matches!(
            parse_question(QuestionKind::MultipleChoice, 0, reply),
            Err(ParseError::TooFewOptions(1))
        ));
    }

    #[test]
    fn true_false_normalises_answer() {
        let reply = r#"Sure! {"question": "Water boils at 50C.", "correct_answer": false}"#;
        let q = parse_question(QuestionKind::TrueFalse, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "False");
        assert!(q.options.is_empty());

        let bad = r#"{"question": "Hmm.", "correct_answer": "maybe"}"#;
        assert!(matches!(
            parse_question(QuestionKind::TrueFalse, 0, bad),
            Err(ParseError::InvalidTruthValue(_))
        ));
    }

    #[test]
    fn short_answer_uses_sample_answer() {
        let reply = r#"[{"question": "Why?", "sample_answer": "Because of gravity", "key_points": ["mass", " "]}]"#;
        let q = parse_question(QuestionKind::ShortAnswer, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "Because of gravity");
        assert_eq!(q.key_points, vec!["mass"]);
    }

    #[test]
    fn fill_blank_keeps_alternatives() {
        let reply = r#"{"question": "_____ is the capital of France.", "correct_answer": "Paris", "alternatives": ["paris city"]}"#;
        let q = parse_question(QuestionKind::FillBlank, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "Paris");
        assert_eq!(q.accepted_answers, vec!["paris city"]);
    }

    #[test]
    fn malformed_replies_are_typed_failures() {
        assert!(matches!(parse_question(QuestionKind::FillBlank, 0, "no json here"), Err(ParseError::NoJson)));
        assert!(matches!(parse_question(QuestionKind::FillBlank, 0, "{not json}"), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_question(QuestionKind::FillBlank, 0, r#"{"question": " "}"#),
            Err(ParseError::EmptyStem)
        ));
        assert!(matches!(
            parse_question(QuestionKind::FillBlank, 0, r#"{"question": "x _____"}"#),
            Err(ParseError::MissingField("correct_answer"))
        ));
    }

    #[test]
    fn repeated_option_text_is_rejected() {
        let reply = r#"{"question": "Capital of France?", "options": ["A) Paris", "B) Paris", "C) Rome"], "correct_answer": "B"}"#;
        let err = parse_question(QuestionKind::MultipleChoice, 0, reply).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateOption(o) if o == "Paris"));
    }

    #[test]
    fn bracketed_tag_before_the_object_is_skipped() {
        let reply = r#"[Multiple choice]
{"question": "Sky?", "options": ["A) Red", "B) Blue"], "correct_answer": "B"}"#;
        let q = parse_question(QuestionKind::MultipleChoice, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "Blue");
    }

    #[test]
    fn braces_in_trailing_chatter_are_ignored() {
        let reply = r#"{"question": "Water is wet.", "correct_answer": "True"}
{Let me know if you want more}"#;
        let q = parse_question(QuestionKind::TrueFalse, 0, reply).unwrap();
        assert_eq!(q.correct_answer, "True");

        let v = parse_verdict("Verdict: {\"correct\": false} [end]").unwrap();
        assert!(!v.correct);
    }

    #[test]
    fn verdict_parses_and_clamps() {
        let v = parse_verdict(r#"{"correct": true, "score": 250, "feedback": "Good"}"#).unwrap();
        assert!(v.correct);
        assert_eq!(v.score, Some(100));
        assert_eq!(v.feedback.as_deref(), Some("Good"));

        assert!(parse_verdict("I think it's right").is_err());
    }

    #[test]
    fn option_prefixes_are_stripped() {
        assert_eq!(strip_letter("A) Red"), "Red");
        assert_eq!(strip_letter("(c) Blue"), "Blue");
        assert_eq!(strip_letter("D. Black"), "Black");
        assert_eq!(strip_letter("Apple pie"), "Apple pie");
        assert_eq!(strip_letter("A.I. systems"), "A.I. systems");
    }
}
