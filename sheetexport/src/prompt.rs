//! Terminal prompts and workbook selection

use anyhow::Result;
use colored::*;
use sheetexport_core::reader::is_workbook_path;
use sheetexport_core::{Notice, NoticeKind, Prompter, Question, QuestionKind};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Asks questions on a terminal. With `assume_yes` every question is accepted
/// without reading input.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), assume_yes)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }

    fn ask(&mut self, question: &Question) -> io::Result<bool> {
        let title = if question.warning {
            question.title.yellow().bold()
        } else {
            question.title.bold()
        };
        writeln!(self.output)?;
        writeln!(self.output, "{}", title)?;
        writeln!(self.output, "{}", question.message)?;

        let choices = match question.kind {
            QuestionKind::YesNo => "[y/N]",
            QuestionKind::OkCancel => "[ok/Cancel]",
        };
        write!(self.output, "{} ", choices.dimmed())?;

        if self.assume_yes {
            writeln!(self.output, "{}", "yes (--yes)".green())?;
            return Ok(true);
        }
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();

        Ok(match question.kind {
            QuestionKind::YesNo => matches!(answer.as_str(), "y" | "yes"),
            QuestionKind::OkCancel => matches!(answer.as_str(), "ok" | "o" | "y" | "yes"),
        })
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, question: &Question) -> bool {
        // A closed or broken terminal counts as "no"
        self.ask(question).unwrap_or(false)
    }

    fn notify(&mut self, notice: &Notice) {
        let title = match notice.kind {
            NoticeKind::Info => notice.title.green().bold(),
            NoticeKind::Error => notice.title.red().bold(),
        };
        let _ = writeln!(self.output, "\n{}\n{}", title, notice.message);
    }
}

/// Workbooks in `dir`, sorted by name. Office lock files (`~$...`) are skipped.
pub fn workbook_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_workbook_path(path))
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("~$"))
        })
        .collect();
    candidates.sort();
    Ok(candidates)
}

/// Let the user pick a workbook from `dir` by number, or type any path.
/// Returns `None` when the input is empty.
pub fn select_workbook<R: BufRead, W: Write>(
    dir: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<Option<PathBuf>> {
    let candidates = workbook_candidates(dir)?;

    writeln!(output, "{}", "Select Excel Workbook".bold())?;
    if candidates.is_empty() {
        writeln!(output, "  (no .xlsx or .xlsm files in {})", dir.display())?;
    }
    for (i, path) in candidates.iter().enumerate() {
        let name = path.file_name().unwrap_or(path.as_os_str());
        writeln!(output, "  {} {}", format!("[{}]", i + 1).cyan(), name.to_string_lossy())?;
    }
    write!(output, "Enter a number or a path (empty to cancel): ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let choice = line.trim().trim_matches('"');

    if choice.is_empty() {
        return Ok(None);
    }
    let listed = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| candidates.get(i));
    Ok(Some(listed.cloned().unwrap_or_else(|| dir.join(choice))))
}
