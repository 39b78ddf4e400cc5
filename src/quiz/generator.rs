use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use super::ai_helper::{ApiError, Completion};
use super::grading::{substring_match, Verdict};
use super::parse::{parse_question, parse_verdict, ParseError};
use super::prompt::{grading_prompt, question_prompt, strict_reminder};
use super::{Difficulty, Question, QuestionKind, TypeMix};
use crate::pdf::Chunk;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unreadable reply after a retry: {0}")]
    Malformed(#[from] ParseError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A question slot that produced nothing.
#[derive(Debug)]
pub struct SlotFailure {
    pub kind: QuestionKind,
    pub chunk_index: usize,
    pub error: GenerationError,
}

#[derive(Debug, Default)]
pub struct Batch {
    pub questions: Vec<Question>,
    pub failures: Vec<SlotFailure>,
}

/// Hands out chunk indices round-robin and remembers which ones were used.
#[derive(Debug, Clone)]
pub struct ChunkCursor {
    len: usize,
    next: usize,
    last: Option<usize>,
    used: Vec<bool>,
}

impl ChunkCursor {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            next: 0,
            last: None,
            used: vec![false; len],
        }
    }

    /// Next chunk index, never the one just handed out unless there is only one.
    pub fn pick(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let mut index = self.next % self.len;
        if self.len > 1 && Some(index) == self.last {
            index = (index + 1) % self.len;
        }
        self.next = index + 1;
        self.last = Some(index);
        self.used[index] = true;
        Some(index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used.iter().all(|u| *u)
    }

    pub fn unused(&self) -> usize {
        self.used.iter().filter(|u| !**u).count()
    }
}

pub struct QuestionGenerator<C> {
    api: C,
    rng: StdRng,
}

impl<C: Completion> QuestionGenerator<C> {
    pub fn new(api: C) -> Self {
        Self {
            api,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn with_seed(api: C, seed: u64) -> Self {
        Self {
            api,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &C {
        &self.api
    }

    /// Generates up to `count` questions, one completion call per question.
    ///
    /// A reply that can't be parsed is retried once with a stricter prompt;
    /// if that fails too, or the call itself fails, the slot is dropped and
    /// reported in [`Batch::failures`].
    pub async fn generate_batch(
        &mut self,
        chunks: &[Chunk],
        cursor: &mut ChunkCursor,
        count: usize,
        mix: &TypeMix,
        difficulty: Difficulty,
    ) -> Batch {
        let mut batch = Batch::default();

        for kind in mix.plan(count, &mut self.rng) {
            let Some(chunk) = cursor.pick().and_then(|i| chunks.get(i)) else {
                break;
            };

            match self.generate_one(chunk, kind, difficulty).await {
                Ok(question) => batch.questions.push(question),
                Err(error) => {
                    log::warn!("Dropping {} question from chunk {}: {}", kind, chunk.index, error);
                    batch.failures.push(SlotFailure {
                        kind,
                        chunk_index: chunk.index,
                        error,
                    });
                }
            }
        }

        log::info!(
            "Generated {} of {} questions ({} dropped)",
            batch.questions.len(),
            count,
            batch.failures.len()
        );
        batch
    }

    pub async fn generate_one(
        &self,
        chunk: &Chunk,
        kind: QuestionKind,
        difficulty: Difficulty,
    ) -> Result<Question, GenerationError> {
        let prompt = question_prompt(kind, difficulty, &chunk.text);

        let reply = self.api.complete(&prompt).await?;
        match parse_question(kind, chunk.index, &reply) {
            Ok(question) => Ok(question),
            Err(first) => {
                log::debug!("Retrying {} question from chunk {}: {}", kind, chunk.index, first);
                let reply = self.api.complete(&strict_reminder(&prompt, kind)).await?;
                Ok(parse_question(kind, chunk.index, &reply)?)
            }
        }
    }

    /// Asks the model whether a short answer means the same as the expected one.
    ///
    /// Falls back to a local substring comparison when the call fails or the
    /// verdict can't be read.
    pub async fn grade_short_answer(&self, question: &Question, response: &str) -> Verdict {
        let verdict = match self.api.complete(&grading_prompt(question, response)).await {
            Ok(reply) => parse_verdict(&reply).map_err(GenerationError::from),
            Err(e) => Err(GenerationError::from(e)),
        };

        verdict.unwrap_or_else(|e| {
            log::warn!("Grading short answer locally: {}", e);
            Verdict {
                correct: substring_match(&question.correct_answer, response),
                fallback: true,
                ..Verdict::default()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::quiz::ai_helper::testing::{mc_reply, ScriptedCompletion};

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                index: i,
                text: format!("Section {} text.", i),
                first_page: 1,
                last_page: 1,
            })
            .collect()
    }

    fn generator(replies: Vec<Result<String, ApiError>>) -> QuestionGenerator<ScriptedCompletion> {
        QuestionGenerator::with_seed(ScriptedCompletion::new(replies), 42)
    }

    #[test]
    fn cursor_round_robins_without_immediate_repeats() {
        let mut cursor = ChunkCursor::new(3);
        let picks: Vec<_> = (0..7).map(|_| cursor.pick().unwrap()).collect();

        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
        assert!(picks.windows(2).all(|w| w[0] != w[1]));
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn cursor_tracks_unused_chunks() {
        let mut cursor = ChunkCursor::new(3);
        cursor.pick();
        assert_eq!(cursor.unused(), 2);
        assert!(!cursor.is_exhausted());

        let mut single = ChunkCursor::new(1);
        assert_eq!((single.pick(), single.pick()), (Some(0), Some(0)));
        assert_eq!(ChunkCursor::new(0).pick(), None);
    }

    #[tokio::test]
    async fn batch_of_valid_multiple_choice() {
        let mut gen = generator(vec![mc_reply("Q1", "A"), mc_reply("Q2", "C")]);
        let chunks = chunks(2);
        let mut cursor = ChunkCursor::new(2);

        let batch = gen
            .generate_batch(&chunks, &mut cursor, 2, &TypeMix::new([(QuestionKind::MultipleChoice, 1)]), Difficulty::Medium)
            .await;

        assert!(batch.failures.is_empty());
        assert_eq!(batch.questions.len(), 2);
        for q in &batch.questions {
            assert!(q.options.contains(&q.correct_answer));
        }
        assert_eq!(batch.questions[0].correct_answer, "Red");
        assert_eq!(batch.questions[1].source_chunk_index, 1);
        assert!(gen.api().prompts()[1].contains("Section 1 text."));
        assert!(cursor.is_exhausted());
    }

    #[tokio::test]
    async fn malformed_reply_is_retried_once_with_reminder() {
        let mut gen = generator(vec![Ok("Sorry, I can't.".into()), mc_reply("Q", "B")]);
        let mut cursor = ChunkCursor::new(1);

        let batch = gen
            .generate_batch(&chunks(1), &mut cursor, 1, &TypeMix::new([(QuestionKind::MultipleChoice, 1)]), Difficulty::Easy)
            .await;

        assert_eq!(batch.questions.len(), 1);
        let prompts = gen.api().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("could not be read"));
    }

    #[tokio::test]
    async fn second_malformed_reply_drops_only_that_slot() {
        let mut gen = generator(vec![
            Ok("nope".into()),
            Ok("{\"question\": \"still no options\"}".into()),
            Ok(r#"{"question": "Water is wet.", "correct_answer": "True"}"#.into()),
        ]);
        let mut cursor = ChunkCursor::new(2);

        let batch = gen
            .generate_batch(&chunks(2), &mut cursor, 2, &TypeMix::new([(QuestionKind::TrueFalse, 1)]), Difficulty::Medium)
            .await;

        assert_eq!(batch.questions.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert!(matches!(batch.failures[0].error, GenerationError::Malformed(_)));
        assert_eq!(batch.failures[0].chunk_index, 0);
    }

    #[tokio::test]
    async fn api_failures_give_an_empty_batch() {
        let mut gen = generator(vec![
            Err(ApiError::Transport("connection refused".into())),
            Err(ApiError::Timeout(Duration::from_secs(30))),
        ]);
        let mut cursor = ChunkCursor::new(2);

        let batch = gen
            .generate_batch(&chunks(2), &mut cursor, 2, &TypeMix::default(), Difficulty::Medium)
            .await;

        assert!(batch.questions.is_empty());
        assert_eq!(batch.failures.len(), 2);
        // transport errors are not retried
        assert_eq!(gen.api().prompts().len(), 2);
    }

    #[tokio::test]
    async fn short_answer_graded_by_model() {
        let gen = generator(vec![Ok(r#"{"correct": true, "score": 90, "feedback": "Nice"}"#.into())]);
        let q = Question::new(QuestionKind::ShortAnswer, "Why?", "Gravity pulls objects down");

        let verdict = gen.grade_short_answer(&q, "things fall").await;
        assert!(verdict.correct);
        assert_eq!(verdict.score, Some(90));
        assert!(!verdict.fallback);
    }

    #[tokio::test]
    async fn short_answer_falls_back_on_timeout() {
        let gen = generator(vec![Err(ApiError::Timeout(Duration::from_secs(30)))]);
        let q = Question::new(QuestionKind::ShortAnswer, "What pulls objects down?", "gravity");

        let verdict = gen.grade_short_answer(&q, "It's Gravity").await;
        assert!(verdict.correct);
        assert!(verdict.fallback);
        assert_eq!(verdict.score, None);
    }

    #[tokio::test]
    async fn unreadable_verdict_falls_back() {
        let gen = generator(vec![Ok("Looks right to me".into())]);
        let q = Question::new(QuestionKind::ShortAnswer, "Q", "mitosis");

        let verdict = gen.grade_short_answer(&q, "meiosis").await;
        assert!(!verdict.correct);
        assert!(verdict.fallback);
    }
}
