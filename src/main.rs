//! Gramdex CLI — train an n-gram engine and query it interactively.
//!
//! Thin wrapper over the `gramdex` library crate.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use gramdex::{StringFuzzy, StringPredict, TokenFuzzy, TokenPredict, load_corpus};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EngineKind {
    /// Rank trained strings by substring overlap.
    StringFuzzy,
    /// Predict the next character after a prefix.
    StringPredict,
    /// Rank trained token sequences by shared windows.
    TokenFuzzy,
    /// Predict the next token after a prefix.
    TokenPredict,
}

/// Gramdex — n-gram fuzzy matching and next-symbol prediction.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Engine variant to run.
    #[arg(long, value_enum, default_value_t = EngineKind::StringFuzzy)]
    engine: EngineKind,

    /// Minimum gram size (default: the engine's own default).
    #[arg(long)]
    n_min: Option<usize>,

    /// Maximum gram size (default: the engine's own default).
    #[arg(long)]
    n_max: Option<usize>,

    /// Maximum results per query.
    #[arg(long, default_value_t = 10)]
    max_results: usize,

    /// Case sensitivity for the string engines (default: false for
    /// string-fuzzy, true for string-predict).
    #[arg(long)]
    case_sensitive: Option<bool>,

    /// Training file: one lexicon entry per line, `#` comments skipped.
    /// Token engines split each line on whitespace.
    #[arg(long)]
    train: Option<PathBuf>,

    /// Load an exported JSON model before training.
    #[arg(long)]
    load_model: Option<PathBuf>,

    /// Write the trained model as JSON.
    #[arg(long)]
    save_model: Option<PathBuf>,
}

/// One engine variant behind a uniform train/query surface.
enum Engine {
    StringFuzzy(StringFuzzy),
    StringPredict(StringPredict),
    TokenFuzzy(TokenFuzzy<String>),
    TokenPredict(TokenPredict<String>),
}

impl Engine {
    fn build(args: &Args) -> Engine {
        let (n_min, n_max) = (args.n_min, args.n_max);
        match args.engine {
            EngineKind::StringFuzzy => Engine::StringFuzzy(StringFuzzy::new(
                n_min.unwrap_or(3),
                n_max.unwrap_or(5),
                args.max_results,
                args.case_sensitive.unwrap_or(false),
            )),
            EngineKind::StringPredict => Engine::StringPredict(StringPredict::new(
                n_min.unwrap_or(1),
                n_max.unwrap_or(25),
                args.max_results,
                args.case_sensitive.unwrap_or(true),
            )),
            EngineKind::TokenFuzzy => Engine::TokenFuzzy(TokenFuzzy::new(
                n_min.unwrap_or(3),
                n_max.unwrap_or(5),
                args.max_results,
            )),
            EngineKind::TokenPredict => Engine::TokenPredict(TokenPredict::new(
                n_min.unwrap_or(3),
                n_max.unwrap_or(25),
                args.max_results,
            )),
        }
    }

    fn train(&mut self, corpus: &[String]) {
        match self {
            Engine::StringFuzzy(engine) => {
                engine.train(corpus);
            }
            Engine::StringPredict(engine) => {
                engine.train(corpus);
            }
            Engine::TokenFuzzy(engine) => {
                engine.train(&tokenize_corpus(corpus));
            }
            Engine::TokenPredict(engine) => {
                engine.train(&tokenize_corpus(corpus));
            }
        }
    }

    /// Run one query line and return printable (value, score) pairs.
    fn answer(&mut self, line: &str) -> Vec<(String, f64)> {
        match self {
            Engine::StringFuzzy(engine) => {
                engine.search(line);
                engine
                    .results()
                    .iter()
                    .map(|m| (m.value.clone(), m.strength))
                    .collect()
            }
            Engine::StringPredict(engine) => {
                engine.predict(line);
                engine
                    .results()
                    .iter()
                    .map(|p| (p.value.to_string(), p.probability))
                    .collect()
            }
            Engine::TokenFuzzy(engine) => {
                engine.search(&tokenize_line(line));
                engine
                    .results()
                    .iter()
                    .map(|m| (m.value.join(" "), m.strength))
                    .collect()
            }
            Engine::TokenPredict(engine) => {
                engine.predict(&tokenize_line(line));
                engine
                    .results()
                    .iter()
                    .map(|p| (p.value.clone(), p.probability))
                    .collect()
            }
        }
    }

    fn load_model(&mut self, path: &Path) -> io::Result<()> {
        let text = fs::read_to_string(path)?;
        match self {
            Engine::StringFuzzy(engine) => {
                let model = serde_json::from_str(&text).map_err(io::Error::other)?;
                engine.load(model).map_err(io::Error::other)?;
            }
            Engine::StringPredict(engine) => {
                let model = serde_json::from_str(&text).map_err(io::Error::other)?;
                engine.load(model).map_err(io::Error::other)?;
            }
            Engine::TokenFuzzy(engine) => {
                let model = serde_json::from_str(&text).map_err(io::Error::other)?;
                engine.load(model).map_err(io::Error::other)?;
            }
            Engine::TokenPredict(engine) => {
                let model = serde_json::from_str(&text).map_err(io::Error::other)?;
                engine.load(model).map_err(io::Error::other)?;
            }
        }
        Ok(())
    }

    fn save_model(&self, path: &Path) -> io::Result<()> {
        let json = match self {
            Engine::StringFuzzy(engine) => serde_json::to_string_pretty(&engine.export()),
            Engine::StringPredict(engine) => serde_json::to_string_pretty(&engine.export()),
            Engine::TokenFuzzy(engine) => serde_json::to_string_pretty(&engine.export()),
            Engine::TokenPredict(engine) => serde_json::to_string_pretty(&engine.export()),
        }
        .map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

fn tokenize_corpus(corpus: &[String]) -> Vec<Vec<String>> {
    corpus.iter().map(|line| tokenize_line(line)).collect()
}

fn tokenize_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(|t| t.to_string()).collect()
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let mut engine = Engine::build(&args);

    if let Some(ref path) = args.load_model {
        engine.load_model(path)?;
        eprintln!("Loaded model from {}.", path.display());
    }

    if let Some(ref path) = args.train {
        eprintln!("Training from {}...", path.display());
        let corpus = load_corpus(path)?;
        engine.train(&corpus);
        eprintln!("Trained on {} entries.", corpus.len());
    }

    if let Some(ref path) = args.save_model {
        engine.save_model(path)?;
        eprintln!("Saved model to {}.", path.display());
    }

    // Query loop.
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let answers = engine.answer(trimmed);
        if answers.is_empty() {
            writeln!(stdout, "(no results)")?;
        } else {
            for (value, score) in answers {
                writeln!(stdout, "{value}\t{score:.6}")?;
            }
        }
        stdout.flush()?;
    }

    Ok(())
}
