//! Presentation layer for tavern
//!
//! This crate contains the CLI definition, the console narrator that prints
//! the story as it unfolds, the stage spinner and interactive human input.

pub mod cli;
pub mod input;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use input::console::ConsoleHumanInput;
pub use output::console::ConsoleFormatter;
pub use output::narrator::ConsoleNarrator;
pub use progress::reporter::StageProgress;
