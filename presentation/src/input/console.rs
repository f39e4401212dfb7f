//! Interactive human player input.
//!
//! When a human-controlled character has to speak, the rendered task is shown
//! and the next line typed on stdin becomes the character's utterance.
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   Your move, Brussae
//! ═══════════════════════════════════════════════════════════════
//!   <task prompt>
//!
//! (blank lines are ignored, /quit ends the session)
//! Brussae>
//! ```

use crate::progress::reporter::StageProgress;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tavern_application::{HumanInputError, HumanInputPort};
use tracing::debug;

const QUIT_COMMANDS: [&str; 3] = ["/quit", "/exit", "/q"];

/// Terminal-based [`HumanInputPort`].
pub struct ConsoleHumanInput {
    progress: Option<Arc<StageProgress>>,
}

impl ConsoleHumanInput {
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Hide this spinner while waiting for the person to type.
    pub fn with_progress(mut self, progress: Arc<StageProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn display_prompt(&self, speaker: &str, prompt: &str) {
        let rule = "═══════════════════════════════════════════════════════════════";
        println!();
        println!("{}", rule.yellow().bold());
        println!("{}", format!("  Your move, {speaker}").yellow().bold());
        println!("{}", rule.yellow().bold());
        for line in prompt.lines() {
            println!("  {}", line.dimmed());
        }
        println!();
        println!("{}", "(blank lines are ignored, /quit ends the session)".dimmed());
    }

    /// Read the first non-blank line from `reader`.
    fn read_answer<R: BufRead, W: Write>(
        reader: &mut R,
        prompt_out: &mut W,
        speaker: &str,
    ) -> Result<String, HumanInputError> {
        loop {
            write!(prompt_out, "{}> ", speaker.cyan().bold())
                .and_then(|_| prompt_out.flush())
                .map_err(|e| HumanInputError::Io(e.to_string()))?;

            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| HumanInputError::Io(e.to_string()))?;
            if read == 0 {
                return Err(HumanInputError::Cancelled);
            }

            let answer = line.trim();
            if QUIT_COMMANDS.contains(&answer.to_lowercase().as_str()) {
                return Err(HumanInputError::Cancelled);
            }
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
        }
    }
}

impl Default for ConsoleHumanInput {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanInputPort for ConsoleHumanInput {
    fn read_input(&self, speaker: &str, prompt: &str) -> Result<String, HumanInputError> {
        debug!(speaker, "Waiting for human input");
        let ask = || {
            self.display_prompt(speaker, prompt);
            Self::read_answer(&mut io::stdin().lock(), &mut io::stdout(), speaker)
        };
        match &self.progress {
            Some(progress) => progress.suspend(ask),
            None => ask(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(input: &str) -> Result<String, HumanInputError> {
        colored::control::set_override(false);
        let mut out = Vec::new();
        ConsoleHumanInput::read_answer(&mut Cursor::new(input), &mut out, "Brussae")
    }

    #[test]
    fn test_first_line_is_the_answer() {
        assert_eq!(answer("I raise my shield.\nignored\n").unwrap(), "I raise my shield.");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(answer("\n   \nI pray.\n").unwrap(), "I pray.");
    }

    #[test]
    fn test_end_of_input_cancels() {
        assert_eq!(answer(""), Err(HumanInputError::Cancelled));
        assert_eq!(answer("\n\n"), Err(HumanInputError::Cancelled));
    }

    #[test]
    fn test_quit_command_cancels() {
        assert_eq!(answer("/QUIT\n"), Err(HumanInputError::Cancelled));
    }

    #[test]
    fn test_prompt_is_written_per_attempt() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        ConsoleHumanInput::read_answer(&mut Cursor::new("\nok\n"), &mut out, "Brussae").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Brussae> Brussae> ");
    }
}
