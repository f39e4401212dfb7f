//! Difficulty assessment and roll resolution.

use crate::prompt::schema::{OutputSchema, validate_as};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// How hard an attempted action is, as judged by the narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    AutoSucceed,
    Easy,
    Average,
    Hard,
    SuperHard,
    AutoFail,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 6] = [
        DifficultyTier::AutoSucceed,
        DifficultyTier::Easy,
        DifficultyTier::Average,
        DifficultyTier::Hard,
        DifficultyTier::SuperHard,
        DifficultyTier::AutoFail,
    ];

    /// Highest percentile roll that still succeeds.
    pub fn threshold(&self) -> u8 {
        match self {
            DifficultyTier::AutoSucceed => 100,
            DifficultyTier::Easy => 80,
            DifficultyTier::Average => 60,
            DifficultyTier::Hard => 40,
            DifficultyTier::SuperHard => 20,
            DifficultyTier::AutoFail => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::AutoSucceed => "auto_succeed",
            DifficultyTier::Easy => "easy",
            DifficultyTier::Average => "average",
            DifficultyTier::Hard => "hard",
            DifficultyTier::SuperHard => "super_hard",
            DifficultyTier::AutoFail => "auto_fail",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of the difficulty stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyAssessment {
    pub difficulty: DifficultyTier,
    pub reasoning: String,
}

impl fmt::Display for DifficultyAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.difficulty, self.reasoning)
    }
}

fn assessment_parameters() -> Value {
    let tiers: Vec<&str> = DifficultyTier::ALL.iter().map(|t| t.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "difficulty": {
                "type": "string",
                "enum": tiers,
                "description": "How hard the proposed action is"
            },
            "reasoning": {
                "type": "string",
                "description": "One or two sentences explaining the rating"
            }
        },
        "required": ["difficulty", "reasoning"],
        "additionalProperties": false
    })
}

pub const DIFFICULTY_SCHEMA: OutputSchema = OutputSchema::new(
    "difficulty_assessment",
    "Rate the difficulty of a proposed action",
    assessment_parameters,
    validate_as::<DifficultyAssessment>,
);

/// Outcome of comparing a percentile roll with a tier's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub roll: u8,
    pub threshold: u8,
    pub success: bool,
}

impl Resolution {
    /// A roll succeeds when it does not exceed the threshold.
    pub fn resolve(tier: DifficultyTier, roll: u8) -> Self {
        let threshold = tier.threshold();
        Self {
            roll,
            threshold,
            success: roll <= threshold,
        }
    }
}
