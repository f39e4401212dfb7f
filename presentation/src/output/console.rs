//! Console formatting for the story as it unfolds

use colored::Colorize;
use tavern_domain::{DiffToken, DifficultyAssessment, Resolution, Stage, WordDiff};

/// Formats session events for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn banner(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    pub fn round_header(round: u32) -> String {
        format!("\n{}\n{}", format!("Round {round}").cyan().bold(), "-".repeat(40))
    }

    pub fn turn_header(character: &str) -> String {
        format!("\n{}", format!("── {character}'s turn ──").yellow().bold())
    }

    pub fn stage(stage: Stage, character: &str) -> String {
        format!("{} {} {}", "->".cyan(), stage.to_string().bold(), character.dimmed())
    }

    pub fn utterance(speaker: &str, text: &str) -> String {
        format!("{}\n{}\n", format!("{speaker}:").green().bold(), Self::indent(text, "  "))
    }

    /// Inline word diff: removed words struck through in red, inserted words
    /// underlined in green.
    pub fn diff(diff: &WordDiff) -> String {
        diff.tokens()
            .iter()
            .map(|token| match token {
                DiffToken::Equal(text) => text.normal().to_string(),
                DiffToken::Removed(text) => text.red().strikethrough().to_string(),
                DiffToken::Inserted(text) => text.green().underline().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn enforcement(speaker: &str, diff: &WordDiff) -> String {
        format!(
            "{} {} (+{} -{})\n{}\n",
            "Enforcer edited".magenta().bold(),
            speaker,
            diff.inserted_words(),
            diff.removed_words(),
            Self::indent(&Self::diff(diff), "  ")
        )
    }

    pub fn resolution(
        character: &str,
        assessment: &DifficultyAssessment,
        resolution: &Resolution,
    ) -> String {
        let outcome = if resolution.success {
            "success".green().bold()
        } else {
            "failure".red().bold()
        };
        format!(
            "{} {} rolls {} against {} ({}): {}\n  {}\n",
            "Dice:".cyan().bold(),
            character,
            resolution.roll,
            resolution.threshold,
            assessment.difficulty,
            outcome,
            assessment.reasoning.dimmed()
        )
    }

    pub fn summary(round: u32, summary: &str) -> String {
        format!(
            "\n{}\n{}\n",
            format!("Round {round} summary").cyan().bold(),
            Self::indent(summary, "  ")
        )
    }

    pub fn failure(character: &str, error: &str) -> String {
        format!("{} {}: {}", "Turn aborted".red().bold(), character, error)
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
