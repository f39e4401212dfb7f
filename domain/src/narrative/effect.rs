//! Lingering environmental effects (fog, collapsing tunnels, blessings).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentalEffect {
    pub name: String,
    pub description: String,
    pub started_round: u32,
    /// Rounds the effect lasts. `None` means until removed.
    pub duration: Option<u32>,
}

impl EnvironmentalEffect {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        started_round: u32,
        duration: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            started_round,
            duration,
        }
    }

    pub fn is_active(&self, current_round: u32) -> bool {
        match self.duration {
            None => true,
            Some(duration) => current_round.saturating_sub(self.started_round) < duration,
        }
    }

    /// Rounds left including the current one, `None` when permanent.
    pub fn remaining(&self, current_round: u32) -> Option<u32> {
        self.duration.map(|duration| {
            (self.started_round + duration).saturating_sub(current_round)
        })
    }
}

impl fmt::Display for EnvironmentalEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}
