mod config;
mod pdf;
mod quiz;
mod session;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use owo_colors::OwoColorize;
use thiserror::Error;

use config::{Config, ConfigError};
use pdf::ExtractionError;
use quiz::ai_helper::{ApiError, ChatGptCompletion};
use quiz::generator::QuestionGenerator;
use quiz::{Difficulty, QuestionKind, TypeMix};
use session::select::{select_document, NoDocumentError};
use session::terminal::Terminal;
use session::{QuizSession, SessionSettings};

/// Quizzes you on a PDF with questions written by an AI model.
#[derive(Debug, Parser)]
#[command(name = "pdf-quiz-bot", version)]
struct Cli {
    /// PDF to study; without it you pick one from the current directory.
    pdf: Option<PathBuf>,

    /// easy, medium or hard. Skips the settings menu.
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// Questions per batch. Skips the settings menu.
    #[arg(long, value_parser = parse_batch_size)]
    batch_size: Option<usize>,

    /// Only ask these kinds, e.g. `--types multiple_choice,true_false`.
    #[arg(long, value_delimiter = ',')]
    types: Vec<QuestionKind>,

    /// Print the pages mentioning KEYWORD and exit instead of quizzing.
    #[arg(long, value_name = "KEYWORD", conflicts_with = "page")]
    search: Option<String>,

    /// Print the text of page N and exit instead of quizzing.
    #[arg(long, value_name = "N")]
    page: Option<u32>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NoDocument(#[from] NoDocumentError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{0:?} has no text that can be split into sections")]
    EmptyDocument(PathBuf),

    #[error("could not set up the completion client: {0}")]
    Client(#[from] ApiError),

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();
    log::debug!("{:?}", cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            if let StartupError::Config(ConfigError::MissingApiKey) = e {
                eprintln!("{}", "Please create a .env file with your OpenAI API key:".yellow());
                eprintln!("  OPENAI_API_KEY=your-api-key-here");
            }
            if let StartupError::NoDocument(NoDocumentError::NoneInDirectory(_)) = e {
                eprintln!("{}", "Usage: pdf-quiz-bot <path-to-pdf>".yellow());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let mut term = Terminal::new(io::stdin().lock(), io::stdout());
    term.title()?;

    // browsing works offline, quizzing needs the key up front
    let browsing = cli.search.is_some() || cli.page.is_some();
    let config = if browsing { None } else { Some(Config::from_env()?) };

    let path = select_document(cli.pdf, Path::new("."), &mut term)?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    term.info(&format!("Extracting text from PDF: {}", name))?;
    let pages = pdf::extract(&path)?;

    let Some(config) = config else {
        if let Some(number) = cli.page {
            term.success(&format!("Page {} of {}", number, pdf::page_count(&pages)))?;
            term.line(pdf::page_text(&pages, number))?;
            return Ok(());
        }
        let keyword = cli.search.unwrap_or_default();
        let hits = pdf::search(&pages, &keyword);
        term.info(&format!("{} pages mention {:?}", hits.len(), keyword))?;
        for hit in hits {
            term.success(&format!("\nPage {}", hit.page))?;
            term.line(&hit.snippet)?;
        }
        return Ok(());
    };

    let chunks = pdf::chunk(&pages, config.chunk_size, config.chunk_overlap);
    if chunks.is_empty() {
        return Err(StartupError::EmptyDocument(path));
    }
    term.success(&format!("Successfully loaded {} pages", pdf::page_count(&pages)))?;
    term.success(&format!("Created {} text segments for quizzing", chunks.len()))?;

    let api = ChatGptCompletion::new(&config.api_key, &config.model, config.timeout)?;
    let generator = QuestionGenerator::new(api);

    let mut settings = SessionSettings::from_config(&config);
    let menu = cli.difficulty.is_none() && cli.batch_size.is_none();
    if let Some(difficulty) = cli.difficulty {
        settings.difficulty = difficulty;
    }
    if let Some(batch_size) = cli.batch_size {
        settings.batch_size = batch_size;
    }
    if !cli.types.is_empty() {
        settings.mix = TypeMix::new(cli.types.iter().map(|kind| (*kind, 1)));
    }

    let mut session = QuizSession::new(generator, &chunks, settings, term);
    if !menu {
        session = session.skip_settings_menu();
    }
    session.run().await?;

    println!("\n{}", "Thank you for using PDF Quiz Bot!".green());
    println!("{}", "Keep learning! 📚".cyan());
    Ok(())
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{:?} is not a positive number", s)),
    }
}
