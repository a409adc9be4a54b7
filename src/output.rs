//! Terminal output: colored messages, the move plan, progress and summaries.

use crate::classifier::{Confidence, Suggestion};
use crate::file_organizer::{MoveDirective, MoveResult};
use crate::history::HistoryEntry;
use crate::scanner::FileRecord;
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// All terminal output of the CLI, styled consistently.
///
/// Provides:
/// - Status lines (✓ success, ✗ error, ⚠ warning, cyan info)
/// - The scanned file table and the proposed move plan
/// - A progress bar for move batches
/// - Move, undo and history summaries
///
/// Errors go to stderr; everything else to stdout.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// OutputFormatter::success("Moved 3 files successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// OutputFormatter::error("API key not configured");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an informational message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a bold section header preceded by a blank line.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a yellow `[DRY RUN]` line.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidyup::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("2 files would be moved. No files were modified.");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Fixed-width confidence tag: green high, yellow medium, red low, dim
    /// otherwise.
    fn confidence_label(confidence: &Confidence) -> ColoredString {
        let label = format!("{:<6}", confidence.to_string());
        match confidence {
            Confidence::High => label.green(),
            Confidence::Medium => label.yellow(),
            Confidence::Low => label.red(),
            Confidence::Unrecognized(_) => label.dimmed(),
        }
    }

    /// Lists scanned files with size and detected type.
    pub fn file_table(files: &[FileRecord]) {
        let width = files.iter().map(|f| f.name.len()).max().unwrap_or(4).max(4);
        println!("{:<width$}  {:>9}  {}", "Name".bold(), "Size".bold(), "Type".bold());
        for file in files {
            let kind = file
                .mime_type
                .clone()
                .unwrap_or_else(|| format!(".{}", file.extension));
            println!("{:<width$}  {:>9}  {}", file.name, file.human_size(), kind.dimmed());
        }
    }

    /// Shows each planned move with the classifier's confidence and reason.
    pub fn plan(directives: &[MoveDirective], suggestions: &[Suggestion]) {
        Self::header("PROPOSED MOVES");
        for directive in directives {
            let suggestion = suggestions.iter().find(|s| s.name == directive.name);
            let confidence = suggestion
                .map(|s| Self::confidence_label(&s.confidence))
                .unwrap_or_else(|| "      ".normal());
            println!(
                "  {} {} → {}/",
                confidence,
                directive.name,
                directive.folder.cyan()
            );
            if let Some(s) = suggestion
                && !s.reason.is_empty()
            {
                println!("         {}", s.reason.dimmed());
            }
        }
    }

    /// Creates a progress bar for a batch of `total` moves.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of directives in the batch
    ///
    /// # Returns
    ///
    /// A `ProgressBar` the caller advances once per result and clears when
    /// the batch is done.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints each failed move, then how many files were moved.
    ///
    /// # Arguments
    ///
    /// * `results` - One result per executed directive
    pub fn move_summary(results: &[MoveResult]) {
        let moved = results.iter().filter(|r| r.success).count();
        for failure in results.iter().filter(|r| !r.success) {
            Self::error(&format!(
                "{}: {}",
                failure.name,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }

        let noun = if moved == 1 { "file" } else { "files" };
        if moved == results.len() {
            Self::success(&format!("Moved {moved} {noun} successfully!"));
        } else {
            Self::warning(&format!(
                "Moved {moved} {noun}, {} failed",
                results.len() - moved
            ));
        }
    }

    /// Prints the per-file outcome of an undo and a closing line.
    ///
    /// Moves that were kept for a retry are called out separately.
    pub fn undo_summary(report: &UndoReport) {
        if !report.success {
            Self::warning(report.error.as_deref().unwrap_or("Nothing to undo"));
            return;
        }

        for restore in &report.results {
            match &restore.error {
                None => println!("  {} {}", "↩".green(), restore.name),
                Some(reason) => println!("  {} {}: {}", "✗".red(), restore.name, reason),
            }
        }

        if report.is_complete_success() {
            Self::success(&format!("Undid {} file moves", report.count));
        } else {
            Self::warning(&format!(
                "Undid {} of {} file moves",
                report.count,
                report.results.len()
            ));
        }
        if report.retained > 0 {
            Self::warning(&format!(
                "{} moves could not be undone and were kept; run undo again after fixing them",
                report.retained
            ));
        }
    }

    /// Lists the undoable batches, most recent first.
    pub fn history(entries: &[HistoryEntry]) {
        if entries.is_empty() {
            Self::info("No batches to undo.");
            return;
        }

        Self::header(&format!("UNDOABLE BATCHES ({})", entries.len()));
        for (index, entry) in entries.iter().enumerate().rev() {
            println!(
                "  {:>3}. {}  {}  {} {}",
                index + 1,
                entry.timestamp.dimmed(),
                entry.base_folder.display(),
                entry.moves.len().to_string().green(),
                if entry.moves.len() == 1 { "file" } else { "files" }
            );
        }
    }
}
