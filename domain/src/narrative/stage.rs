//! The eight stages of a player's turn.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DescribeSituation,
    AskQuestions,
    AnswerQuestions,
    DeclareIntent,
    PeerFeedback,
    FinalDecision,
    AssessDifficulty,
    Resolve,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::DescribeSituation,
        Stage::AskQuestions,
        Stage::AnswerQuestions,
        Stage::DeclareIntent,
        Stage::PeerFeedback,
        Stage::FinalDecision,
        Stage::AssessDifficulty,
        Stage::Resolve,
    ];

    /// 1-based position in the turn.
    pub fn number(&self) -> u8 {
        match self {
            Stage::DescribeSituation => 1,
            Stage::AskQuestions => 2,
            Stage::AnswerQuestions => 3,
            Stage::DeclareIntent => 4,
            Stage::PeerFeedback => 5,
            Stage::FinalDecision => 6,
            Stage::AssessDifficulty => 7,
            Stage::Resolve => 8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::DescribeSituation => "Describe situation",
            Stage::AskQuestions => "Ask questions",
            Stage::AnswerQuestions => "Answer questions",
            Stage::DeclareIntent => "Declare intent",
            Stage::PeerFeedback => "Party feedback",
            Stage::FinalDecision => "Final decision",
            Stage::AssessDifficulty => "Assess difficulty",
            Stage::Resolve => "Resolve action",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_follow_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.number() as usize, i + 1);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Stage::PeerFeedback.to_string(), "5. Party feedback");
    }
}
