//! Command-line interface for tidyup.
//!
//! Parses arguments, opens a [`Session`] and drives it:
//! - `organize`: scan, classify, confirm, move
//! - `scan`: show what would be sent to the classifier
//! - `undo`: revert the most recent batch
//! - `history`: list undoable batches
//! - `set-key`: store the API key

use crate::classifier::Classifier;
use crate::config::{AppConfig, ConfigError};
use crate::error::{Result, TidyError};
use crate::file_organizer::MoveDirective;
use crate::output::OutputFormatter;
use crate::session::Session;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "tidyup",
    version,
    about = "Sort a folder into subfolders suggested by a language model, with undo"
)]
pub struct Cli {
    /// Configuration file (default: ./.tidyuprc.toml, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// State file holding the API key and the move history.
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// More log output on stderr; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write debug logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify the files of a folder and move the accepted ones.
    Organize(OrganizeArgs),
    /// List the files that would be classified.
    Scan {
        dir: PathBuf,
    },
    /// Move the files of the most recent batch back.
    Undo {
        /// Only show what would be restored.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the batches that can be undone.
    History,
    /// Store the OpenAI API key in the state file.
    SetKey {
        key: String,
    },
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    pub dir: PathBuf,

    /// Show the proposed moves without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Classify locally by file type instead of calling the model.
    #[arg(long)]
    pub offline: bool,

    /// Only move these files (repeatable).
    #[arg(long, value_name = "NAME")]
    pub only: Vec<String>,

    /// Leave these files where they are (repeatable).
    #[arg(long, value_name = "NAME")]
    pub skip: Vec<String>,
}

/// Runs a parsed command line, reading confirmations from stdin.
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdin = io::stdin();
    run_cli_with_input(cli, &mut stdin.lock())
}

/// Runs a parsed command line, reading confirmations from `input`.
pub fn run_cli_with_input(cli: Cli, input: &mut dyn BufRead) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let state_path = match cli.state {
        Some(path) => path,
        None => config.state_path().ok_or(ConfigError::NoStateLocation)?,
    };
    let mut session = Session::open(config, state_path)?;
    log::debug!("using state file {}", session.state_path().display());

    match cli.command {
        Command::Organize(args) => organize(&mut session, &args, input),
        Command::Scan { dir } => scan(&session, &dir),
        Command::Undo { dry_run } => undo(&mut session, dry_run),
        Command::History => {
            OutputFormatter::history(session.history());
            Ok(())
        }
        Command::SetKey { key } => {
            session.save_api_key(&key)?;
            OutputFormatter::success(&format!(
                "API key saved to {}",
                session.state_path().display()
            ));
            Ok(())
        }
    }
}

fn resolve_folder(session: &Session, dir: &Path) -> Result<PathBuf> {
    session
        .select_folder(dir)
        .ok_or_else(|| TidyError::InvalidBasePath {
            path: dir.to_path_buf(),
            reason: "not an existing directory".to_string(),
        })
}

fn organize(session: &mut Session, args: &OrganizeArgs, input: &mut dyn BufRead) -> Result<()> {
    // Pick the classifier first so a missing key fails before any work.
    let classifier: Box<dyn Classifier> = if args.offline {
        Box::new(session.offline_classifier())
    } else {
        Box::new(session.remote_classifier()?)
    };

    let base = resolve_folder(session, &args.dir)?;
    OutputFormatter::info(&format!("Organizing contents of: {}", base.display()));

    let files = session.scan_folder(&base)?;
    OutputFormatter::info(&format!("Analyzing {} files...", files.len()));
    let suggestions = session.analyze_files(classifier.as_ref(), &files)?;

    let directives = select(session.plan_moves(&files, &suggestions), args);
    if directives.is_empty() {
        OutputFormatter::warning("Nothing to move.");
        return Ok(());
    }

    OutputFormatter::plan(&directives, &suggestions);

    if args.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "{} files would be moved. No files were modified.",
            directives.len()
        ));
        return Ok(());
    }

    if !args.yes && !prompt_confirm(&format!("Move {} files?", directives.len()), input)? {
        OutputFormatter::info("Cancelled. No files were moved.");
        return Ok(());
    }

    let progress = OutputFormatter::create_progress_bar(directives.len() as u64);
    let results = session.execute_moves_with_progress(&directives, &base, |result| {
        progress.set_message(result.name.clone());
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    OutputFormatter::move_summary(&results);
    if results.iter().any(|r| r.success) {
        OutputFormatter::info("Use 'tidyup undo' to put them back.");
    }
    Ok(())
}

/// Applies `--only` and `--skip` to the plan.
fn select(directives: Vec<MoveDirective>, args: &OrganizeArgs) -> Vec<MoveDirective> {
    for name in args.only.iter().chain(&args.skip) {
        if !directives.iter().any(|d| &d.name == name) {
            OutputFormatter::warning(&format!("{name} is not in the proposed moves"));
        }
    }

    directives
        .into_iter()
        .filter(|d| args.only.is_empty() || args.only.contains(&d.name))
        .filter(|d| !args.skip.contains(&d.name))
        .collect()
}

fn scan(session: &Session, dir: &Path) -> Result<()> {
    let base = resolve_folder(session, dir)?;
    let files = session.scan_folder(&base)?;
    OutputFormatter::header(&format!("{} files in {}", files.len(), base.display()));
    OutputFormatter::file_table(&files);
    Ok(())
}

fn undo(session: &mut Session, dry_run: bool) -> Result<()> {
    if dry_run {
        let preview = session.preview_undo();
        if preview.is_empty() {
            OutputFormatter::warning("Nothing to undo");
        }
        for (name, target) in preview {
            OutputFormatter::dry_run_notice(&format!("{name} → {}", target.display()));
        }
        return Ok(());
    }

    let report = session.undo_last();
    OutputFormatter::undo_summary(&report);
    Ok(())
}

/// Asks a yes/no question; an empty answer or end of input means no.
fn prompt_confirm(question: &str, input: &mut dyn BufRead) -> Result<bool> {
    let mut answer = String::new();
    loop {
        print!("{question} (y/N): ");
        io::stdout().flush().map_err(TidyError::Prompt)?;

        answer.clear();
        if input.read_line(&mut answer).map_err(TidyError::Prompt)? == 0 {
            return Ok(false);
        }

        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}
