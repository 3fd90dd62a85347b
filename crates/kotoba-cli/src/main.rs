//! Kotoba CLI
//!
//! Interactive terminal client for the lesson engine. Commands map
//! one-to-one onto engine operations; all state lives in the engine.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kotoba_core::{App, Config, FileBackend, SessionStore, UiSurface};
use kotoba_transport::HttpOracle;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::TerminalUi;

/// Kotoba - Japanese Lesson Client
///
/// Connects to a remote tutoring service, walks lessons step by step,
/// and tracks your progress locally.
#[derive(Parser, Debug)]
#[command(name = "kotoba")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: kotoba.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Service endpoint URL (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,

    /// Session file path (overrides the config file)
    #[arg(long, value_name = "FILE")]
    session: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(ref server) = args.server {
        config.server_url.clone_from(server);
    }
    if let Some(ref session) = args.session {
        config.session_file.clone_from(session);
    }
    config.validate()?;

    tracing::info!(server = %config.server_url, "Kotoba starting");

    let oracle = Arc::new(HttpOracle::new(&config.server_url)?);
    let ui = Arc::new(TerminalUi::default());
    let session = SessionStore::new(Box::new(FileBackend::new(&config.session_file)));
    let app = App::new(oracle, Arc::clone(&ui) as Arc<dyn UiSurface>, session, &config);

    run_op(app.bootstrap().await);

    println!("Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            if !line.trim().is_empty() {
                println!("Unknown command. Type 'help' for commands.");
            }
            continue;
        };

        match command {
            Command::Login => login(&app, &mut lines).await?,
            Command::List => run_op(app.load_menu().await),
            Command::Open(id) => run_op(app.open_lesson(id).await),
            Command::Next => run_op(app.advance_step().await),
            Command::Submit(sentence) => run_op(app.submit(&sentence).await),
            Command::Hint => run_op(app.request_hint().await),
            Command::Regen => regenerate(&app, &mut lines).await?,
            Command::Logout => run_op(app.logout().await),
            Command::Help => print_help(),
            Command::Quit => break,
        }
    }

    Ok(())
}

/// Engine operations surface their own notices; a failure here only
/// needs a debug trace.
fn run_op(result: kotoba_core::Result<()>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
    }
}

async fn login(app: &App, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()> {
    println!("Email:");
    let email = lines.next_line().await?.unwrap_or_default();
    println!("Username:");
    let username = lines.next_line().await?.unwrap_or_default();
    println!("Password:");
    let password = lines.next_line().await?.unwrap_or_default();
    run_op(app.login(email.trim(), username.trim(), password.trim()).await);
    Ok(())
}

/// Regeneration discards the current material, so it requires an
/// explicit confirmation.
async fn regenerate(app: &App, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()> {
    println!("Regenerate this lesson's content? The current material will be discarded. (y/N)");
    let answer = lines.next_line().await?.unwrap_or_default();
    if answer.trim().eq_ignore_ascii_case("y") {
        run_op(app.regenerate().await);
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load_from_dir(Path::new(".")).map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  login            Sign in to the lesson service");
    println!("  list             Show the lesson menu");
    println!("  open <id>        Open a lesson");
    println!("  next             Continue to the next step");
    println!("  submit <text>    Submit a sentence for the current step");
    println!("  hint             Fetch a vocabulary hint (vocab step)");
    println!("  regen            Regenerate the open lesson's content");
    println!("  logout           Sign out and clear the session");
    println!("  quit             Exit");
}

// ============================================================================
// Command parsing
// ============================================================================

/// A parsed interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login,
    List,
    Open(u32),
    Next,
    Submit(String),
    Hint,
    Regen,
    Logout,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line; returns `None` for unrecognized input.
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };

        match head {
            "login" => Some(Self::Login),
            "list" | "menu" => Some(Self::List),
            "open" => rest.parse().ok().map(Self::Open),
            "next" | "continue" => Some(Self::Next),
            "submit" if !rest.is_empty() => Some(Self::Submit(rest.to_string())),
            "hint" => Some(Self::Hint),
            "regen" | "regenerate" => Some(Self::Regen),
            "logout" => Some(Self::Logout),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}
