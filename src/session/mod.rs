pub mod select;
pub mod stats;
pub mod terminal;

use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::pdf::Chunk;
use crate::quiz::ai_helper::Completion;
use crate::quiz::generator::{ChunkCursor, QuestionGenerator};
use crate::quiz::grading::{grade_objective, Verdict};
use crate::quiz::{Difficulty, Question, TypeMix};
use stats::{Scorecard, Tally};
use terminal::{answer_prompt, Reply, Terminal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub difficulty: Difficulty,
    pub batch_size: usize,
    pub mix: TypeMix,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            difficulty: config.difficulty,
            batch_size: config.batch_size,
            mix: TypeMix::default(),
        }
    }
}

/// The questions of one batch and how far the user got through them.
struct Round {
    questions: Vec<Question>,
    position: usize,
    /// Overall tally when the batch started.
    baseline: Tally,
}

enum State {
    ConfiguringDifficulty,
    BatchGenerating,
    Presenting(Round),
    Grading(Round, String),
    BatchSummary(Round),
    Ended,
}

pub struct QuizSession<'a, C, R, W> {
    generator: QuestionGenerator<C>,
    chunks: &'a [Chunk],
    cursor: ChunkCursor,
    settings: SessionSettings,
    ask_settings: bool,
    term: Terminal<R, W>,
    scorecard: Scorecard,
    batch_number: usize,
}

impl<'a, C: Completion, R: BufRead, W: Write> QuizSession<'a, C, R, W> {
    pub fn new(
        generator: QuestionGenerator<C>,
        chunks: &'a [Chunk],
        settings: SessionSettings,
        term: Terminal<R, W>,
    ) -> Self {
        Self {
            generator,
            chunks,
            cursor: ChunkCursor::new(chunks.len()),
            settings,
            ask_settings: true,
            term,
            scorecard: Scorecard::default(),
            batch_number: 0,
        }
    }

    /// Use the given settings as they are instead of showing the settings menu.
    pub fn skip_settings_menu(mut self) -> Self {
        self.ask_settings = false;
        self
    }

    /// Runs until the user quits or every chunk has been used, then returns the scorecard.
    pub async fn run(mut self) -> io::Result<Scorecard> {
        let mut state = if self.ask_settings {
            State::ConfiguringDifficulty
        } else {
            State::BatchGenerating
        };

        loop {
            state = match state {
                State::ConfiguringDifficulty => self.configure()?,
                State::BatchGenerating => self.generate().await?,
                State::Presenting(round) => self.present(round)?,
                State::Grading(round, response) => self.grade(round, response).await?,
                State::BatchSummary(round) => self.summarize(round)?,
                State::Ended => break,
            };
        }

        self.term.statistics(self.scorecard.stats())?;
        log::info!(
            "Session ended after {} batches, {} answers",
            self.batch_number,
            self.scorecard.history().len()
        );
        Ok(self.scorecard)
    }

    fn configure(&mut self) -> io::Result<State> {
        let default = self.settings.clone();

        self.term.info("\nQuiz Settings:")?;
        for (i, difficulty) in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard].iter().enumerate() {
            let marker = if *difficulty == default.difficulty { " - Default" } else { "" };
            self.term.line(&format!(
                "{}. {} ({} questions/batch){}",
                i + 1,
                difficulty.title(),
                default.batch_size,
                marker
            ))?;
        }
        self.term.line("4. Custom")?;

        let choice = self.term.ask("\nSelect difficulty (1-4, Enter for default): ")?.unwrap_or_default();
        match choice.as_str() {
            "1" => self.settings.difficulty = Difficulty::Easy,
            "2" => self.settings.difficulty = Difficulty::Medium,
            "3" => self.settings.difficulty = Difficulty::Hard,
            "4" => {
                let difficulty = self.term.ask("Difficulty (easy/medium/hard): ")?.unwrap_or_default();
                match difficulty.parse::<Difficulty>() {
                    Ok(d) => self.settings.difficulty = d,
                    Err(_) if difficulty.is_empty() => {}
                    Err(e) => self.term.warn(&format!("{}; using {}", e, default.difficulty))?,
                }

                let size = self.term.ask("Questions per batch: ")?.unwrap_or_default();
                match size.parse::<usize>() {
                    Ok(n) if n > 0 => self.settings.batch_size = n,
                    _ if size.is_empty() => {}
                    _ => self.term.warn(&format!("Invalid number; using {}", default.batch_size))?,
                }
            }
            _ => {}
        }

        self.term.heading("Quiz Session Started")?;
        self.term.info(&format!("Difficulty: {}", self.settings.difficulty.title()))?;
        self.term.info(&format!("Questions per batch: {}", self.settings.batch_size))?;
        self.term.note("Type 'quit' or 'exit' anytime to end the session")?;
        self.term.note("Type 'skip' to skip a question")?;
        Ok(State::BatchGenerating)
    }

    async fn generate(&mut self) -> io::Result<State> {
        self.batch_number += 1;
        self.term.section(&format!("Batch {}", self.batch_number))?;
        self.term.note("Generating questions... (this may take a moment)")?;

        let batch = self
            .generator
            .generate_batch(
                self.chunks,
                &mut self.cursor,
                self.settings.batch_size,
                &self.settings.mix,
                self.settings.difficulty,
            )
            .await;

        for failure in &batch.failures {
            self.term.warn(&format!(
                "Could not generate a {} question from section {}: {}",
                failure.kind.title(),
                failure.chunk_index + 1,
                failure.error
            ))?;
        }

        if batch.questions.is_empty() {
            self.term.warn("No questions could be generated for this batch.")?;
            if self.cursor.is_exhausted() {
                self.term.warn("Every section of the document has been tried. Ending session.")?;
                return Ok(State::Ended);
            }
            return Ok(if self.term.confirm("Try another section? (Y/n): ")? {
                State::BatchGenerating
            } else {
                State::Ended
            });
        }

        Ok(State::Presenting(Round {
            questions: batch.questions,
            position: 0,
            baseline: self.scorecard.stats().overall(),
        }))
    }

    fn present(&mut self, mut round: Round) -> io::Result<State> {
        if round.position >= round.questions.len() {
            return Ok(State::BatchSummary(round));
        }
        let question = &round.questions[round.position];

        let source = self
            .chunks
            .get(question.source_chunk_index)
            .map(|c| c.pages_label())
            .unwrap_or_default();
        self.term
            .show_question(question, round.position + 1, round.questions.len(), &source)?;

        loop {
            let line = self.term.ask(answer_prompt(question.kind))?;
            match line.as_deref().map(Reply::parse).unwrap_or(Reply::Quit) {
                Reply::Empty => self.term.warn("Please enter an answer or 'skip'")?,
                Reply::Skip => {
                    self.term.note("Skipped")?;
                    self.scorecard.skip();
                    round.position += 1;
                    return Ok(State::Presenting(round));
                }
                Reply::Quit => {
                    self.term.note("\nEnding quiz session...")?;
                    return Ok(State::Ended);
                }
                Reply::Answer(response) => return Ok(State::Grading(round, response)),
            }
        }
    }

    async fn grade(&mut self, mut round: Round, response: String) -> io::Result<State> {
        let question = round.questions[round.position].clone();

        let verdict = match grade_objective(&question, &response) {
            Some(correct) => Verdict::local(correct),
            None => self.generator.grade_short_answer(&question, &response).await,
        };

        self.term.show_verdict(&question, &verdict)?;
        self.scorecard.record(question, response, verdict.correct);

        round.position += 1;
        Ok(State::Presenting(round))
    }

    fn summarize(&mut self, round: Round) -> io::Result<State> {
        let overall = self.scorecard.stats().overall();
        self.term.batch_score(overall.since(round.baseline))?;
        self.term.statistics(self.scorecard.stats())?;

        if self.cursor.is_exhausted() {
            self.term.success("\nYou have been quizzed on every section of this document.")?;
            return Ok(State::Ended);
        }
        self.term
            .info(&format!("{} sections not yet covered", self.cursor.unused()))?;

        if self.term.confirm("\nContinue to next batch? (Y/n): ")? {
            Ok(State::BatchGenerating)
        } else {
            self.term.note("\nEnding quiz session...")?;
            Ok(State::Ended)
        }
    }
}
