use std::io::{self, BufRead, Write};

use owo_colors::OwoColorize;

use super::stats::{SessionStats, Tally};
use crate::quiz::grading::Verdict;
use crate::quiz::{Question, QuestionKind};

/// What the user typed at an answer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    Skip,
    Quit,
    Empty,
}

impl Reply {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => Reply::Empty,
            "skip" => Reply::Skip,
            "quit" | "exit" => Reply::Quit,
            _ => Reply::Answer(line.to_string()),
        }
    }
}

/// Line-based terminal: one prompt, one line back.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one line; `None` once input is closed.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt.yellow())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Yes unless the user answers n/no/quit/exit or input is closed.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(match self.ask(prompt)? {
            Some(answer) => !matches!(answer.to_lowercase().as_str(), "n" | "no" | "quit" | "exit"),
            None => false,
        })
    }

    pub fn title(&mut self) -> io::Result<()> {
        let rule = "=".repeat(60);
        writeln!(self.output, "{}", rule.cyan().bold())?;
        writeln!(self.output, "{}", "  PDF QUIZ BOT - Interactive Learning Assistant".cyan().bold())?;
        writeln!(self.output, "{}", rule.cyan().bold())?;
        writeln!(self.output)
    }

    pub fn heading(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "\n{}", format!(" {} ", text).black().on_green())
    }

    pub fn section(&mut self, text: &str) -> io::Result<()> {
        let rule = "=".repeat(50);
        writeln!(self.output, "\n{}", rule.magenta())?;
        writeln!(self.output, "{}", text.magenta())?;
        writeln!(self.output, "{}", rule.magenta())
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text.cyan())
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text.green())
    }

    pub fn note(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text.yellow())
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text.red())
    }

    pub fn show_question(&mut self, question: &Question, number: usize, total: usize, source: &str) -> io::Result<()> {
        writeln!(self.output, "\n{}", format!(" Question {}/{} ", number, total).white().on_blue())?;
        writeln!(self.output, "{}", format!("Type: {}  ({})", question.kind.title(), source).cyan())?;
        writeln!(self.output, "\n{}\n", question.stem.bold())?;

        match question.kind {
            QuestionKind::MultipleChoice => {
                for (i, option) in question.options.iter().enumerate() {
                    writeln!(self.output, "  {}) {}", Question::option_letter(i), option)?;
                }
            }
            QuestionKind::TrueFalse => {
                writeln!(self.output, "  {} or {}?", "True (T)".green(), "False (F)".red())?;
            }
            QuestionKind::FillBlank => {
                writeln!(self.output, "  {}", "Fill in the blank".yellow())?;
            }
            QuestionKind::ShortAnswer => {}
        }
        Ok(())
    }

    pub fn show_verdict(&mut self, question: &Question, verdict: &Verdict) -> io::Result<()> {
        if verdict.correct {
            writeln!(self.output, "\n{}", "✓ Correct!".green().bold())?;
        } else {
            writeln!(self.output, "\n{}", "✗ Incorrect".red().bold())?;
        }

        if !question.explanation.is_empty() {
            writeln!(self.output, "{}", format!("Explanation: {}", question.explanation).cyan())?;
        }
        writeln!(self.output, "Correct answer: {}", question.display_answer().green())?;

        if let Some(feedback) = &verdict.feedback {
            writeln!(self.output, "{}", format!("Feedback: {}", feedback).cyan())?;
        }
        if let Some(score) = verdict.score {
            writeln!(self.output, "{}", format!("Score: {}/100", score).yellow())?;
        }
        if verdict.fallback {
            writeln!(self.output, "{}", "(graded locally, the AI grader was unavailable)".yellow())?;
        }
        Ok(())
    }

    pub fn batch_score(&mut self, batch: Tally) -> io::Result<()> {
        writeln!(
            self.output,
            "\n{}",
            format!("Batch score: {}/{} ({:.1}%)", batch.correct, batch.asked, batch.accuracy()).bold()
        )
    }

    pub fn statistics(&mut self, stats: &SessionStats) -> io::Result<()> {
        let overall = stats.overall();
        writeln!(self.output, "\n{}", " Session Statistics ".black().on_cyan())?;
        writeln!(self.output, "Total Questions: {}", overall.asked)?;
        writeln!(self.output, "{}", format!("Correct: {}", overall.correct).green())?;
        writeln!(self.output, "{}", format!("Incorrect: {}", overall.incorrect()).red())?;
        if stats.skipped() > 0 {
            writeln!(self.output, "Skipped: {}", stats.skipped())?;
        }
        writeln!(self.output, "{}", format!("Accuracy: {:.1}%", overall.accuracy()).yellow())?;

        if overall.asked > 0 {
            writeln!(self.output, "\n{}", "Breakdown by Type:".cyan())?;
            for (kind, tally) in stats.by_kind() {
                writeln!(
                    self.output,
                    "  {}: {}/{} ({:.1}%)",
                    kind.title(),
                    tally.correct,
                    tally.asked,
                    tally.accuracy()
                )?;
            }
        }
        Ok(())
    }
}

pub fn answer_prompt(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::MultipleChoice => "Your answer (A/B/C/D or 'skip'): ",
        QuestionKind::TrueFalse => "Your answer (T/F or 'skip'): ",
        _ => "Your answer (or 'skip'): ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_words_are_recognised() {
        assert_eq!(Reply::parse("  SKIP "), Reply::Skip);
        assert_eq!(Reply::parse("quit"), Reply::Quit);
        assert_eq!(Reply::parse("Exit"), Reply::Quit);
        assert_eq!(Reply::parse("   "), Reply::Empty);
        assert_eq!(Reply::parse(" B "), Reply::Answer("B".into()));
    }

    #[test]
    fn ask_reads_lines_until_closed() {
        let mut out = Vec::new();
        let mut term = Terminal::new("first\n  second  \n".as_bytes(), &mut out);

        assert_eq!(term.ask("> ").unwrap(), Some("first".to_string()));
        assert_eq!(term.ask("> ").unwrap(), Some("second".to_string()));
        assert_eq!(term.ask("> ").unwrap(), None);
    }

    #[test]
    fn confirm_defaults_to_yes() {
        let mut out = Vec::new();
        let mut term = Terminal::new("\ny\nNo\n".as_bytes(), &mut out);

        assert!(term.confirm("? ").unwrap());
        assert!(term.confirm("? ").unwrap());
        assert!(!term.confirm("? ").unwrap());
        assert!(!term.confirm("? ").unwrap());
    }

    #[test]
    fn statistics_show_breakdown() {
        let mut card = crate::session::stats::Scorecard::default();
        card.record(Question::new(QuestionKind::TrueFalse, "s", "True"), "t".into(), true);
        card.record(Question::new(QuestionKind::TrueFalse, "s", "True"), "f".into(), false);

        let mut out = Vec::new();
        Terminal::new("".as_bytes(), &mut out).statistics(card.stats()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total Questions: 2"));
        assert!(text.contains("Accuracy: 50.0%"));
        assert!(text.contains("True False: 1/2 (50.0%)"));
    }
}
