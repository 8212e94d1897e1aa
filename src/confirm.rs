//! Human-in-the-loop gate for destructive operations.
//!
//! The restore path only ever talks to a [`ConfirmationSource`]. The binary
//! wires up [`PromptConfirmation`] on stdin/stdout; tests use
//! [`ScriptedConfirmation`].

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::report;
use crate::store::Snapshot;

/// The only answer that lets a restore proceed. Case-sensitive.
pub const AFFIRMATIVE: &str = "YES";

pub trait ConfirmationSource {
    /// Ask `prompt`; true only when the answer is the affirmative token.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;

    /// Ask which snapshot to restore. None when nothing was chosen.
    fn choose_snapshot(&mut self, available: &[Snapshot]) -> io::Result<Option<String>>;
}

pub fn is_affirmative(answer: &str) -> bool {
    answer.trim() == AFFIRMATIVE
}

/// Line-based prompts on any reader/writer pair.
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
}

impl PromptConfirmation<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        PromptConfirmation::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptConfirmation { input, output }
    }

    /// Write `prompt` and read one line. None at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl<R: BufRead, W: Write> ConfirmationSource for PromptConfirmation<R, W> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let prompt = format!("{prompt} Type {AFFIRMATIVE} to continue: ");
        Ok(self.ask(&prompt)?.is_some_and(|answer| is_affirmative(&answer)))
    }

    fn choose_snapshot(&mut self, available: &[Snapshot]) -> io::Result<Option<String>> {
        if available.is_empty() {
            writeln!(self.output, "No backups found.")?;
            return Ok(None);
        }

        writeln!(self.output, "Available backups:")?;
        write!(self.output, "{}", report::table::render(available))?;

        let answer = self.ask("Enter the backup file name to restore: ")?;
        Ok(answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()))
    }
}

/// Replays canned answers in order and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirmation {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedConfirmation {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }
}

impl ConfirmationSource for ScriptedConfirmation {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self.next(prompt).is_some_and(|a| is_affirmative(&a)))
    }

    fn choose_snapshot(&mut self, _available: &[Snapshot]) -> io::Result<Option<String>> {
        Ok(self.next("choose snapshot").filter(|a| !a.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn only_exact_yes_is_affirmative() {
        assert!(is_affirmative("YES"));
        assert!(is_affirmative("YES\n"));
        assert!(is_affirmative("  YES\r\n"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative("Yes"));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative("YES please"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn prompt_reads_lines_in_order() {
        let input = b"YES\napp_backup_20240101_000000.db.gz\n";
        let mut out = Vec::new();
        let mut prompt = PromptConfirmation::new(&input[..], &mut out);

        assert!(prompt.confirm("This replaces the database.").unwrap());

        let snap = Snapshot {
            name: "app_backup_20240101_000000.db.gz".into(),
            path: PathBuf::from("/nonexistent/app_backup_20240101_000000.db.gz"),
            created: chrono::NaiveDateTime::default(),
            compressed: true,
        };
        let chosen = prompt.choose_snapshot(&[snap]).unwrap();
        assert_eq!(chosen.as_deref(), Some("app_backup_20240101_000000.db.gz"));

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Type YES to continue"));
        assert!(shown.contains("Available backups:"));
    }

    #[test]
    fn end_of_input_declines() {
        let mut out = Vec::new();
        let mut prompt = PromptConfirmation::new(&b""[..], &mut out);
        assert!(!prompt.confirm("Sure?").unwrap());
    }

    #[test]
    fn empty_list_is_not_prompted() {
        let mut out = Vec::new();
        let mut prompt = PromptConfirmation::new(&b"ignored\n"[..], &mut out);
        assert_eq!(prompt.choose_snapshot(&[]).unwrap(), None);
        assert!(String::from_utf8(out).unwrap().contains("No backups found."));
    }

    #[test]
    fn scripted_runs_out_to_no() {
        let mut scripted = ScriptedConfirmation::new(["YES"]);
        assert!(scripted.confirm("first").unwrap());
        assert!(!scripted.confirm("second").unwrap());
        assert_eq!(scripted.prompts, vec!["first", "second"]);
    }
}
