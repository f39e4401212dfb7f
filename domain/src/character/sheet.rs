//! Character sheets, used verbatim as prompt context.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    pub traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub flaws: Vec<String>,
    pub quirks: Vec<String>,
}

/// Everything an agent needs to know to play (or adjudicate) a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub name: String,
    #[serde(default)]
    pub pronouns: String,
    #[serde(default = "default_level")]
    pub level: u8,
    pub class: String,
    pub race: String,
    #[serde(default)]
    pub key_abilities: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: Personality,
}

fn default_level() -> u8 {
    1
}

impl CharacterSheet {
    pub fn new(name: impl Into<String>, class: impl Into<String>, race: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pronouns: String::new(),
            level: default_level(),
            class: class.into(),
            race: race.into(),
            key_abilities: Vec::new(),
            equipment: Vec::new(),
            description: String::new(),
            personality: Personality::default(),
        }
    }

    pub fn with_pronouns(mut self, pronouns: impl Into<String>) -> Self {
        self.pronouns = pronouns.into();
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_abilities<I, S>(mut self, abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_abilities = abilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipment<I, S>(mut self, equipment: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.equipment = equipment.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    /// One-line summary used when listing the party.
    pub fn headline(&self) -> String {
        format!(
            "{}, level {} {} {}",
            self.name, self.level, self.race, self.class
        )
    }

    /// Names of required personality lists that are empty.
    pub fn missing_personality(&self) -> Vec<&'static str> {
        let p = &self.personality;
        [
            ("traits", &p.traits),
            ("ideals", &p.ideals),
            ("bonds", &p.bonds),
            ("flaws", &p.flaws),
        ]
        .into_iter()
        .filter(|(_, list)| list.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidCharacter(
                "character name is empty".to_string(),
            ));
        }
        let missing = self.missing_personality();
        if !missing.is_empty() {
            return Err(DomainError::InvalidCharacter(format!(
                "{} has no {}",
                self.name,
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, label: &str, items: &[String]) -> fmt::Result {
    if !items.is_empty() {
        writeln!(f, "{label}: {}", items.join("; "))?;
    }
    Ok(())
}

impl fmt::Display for CharacterSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        if !self.pronouns.is_empty() {
            writeln!(f, "Pronouns: {}", self.pronouns)?;
        }
        writeln!(f, "Level {} {} {}", self.level, self.race, self.class)?;
        if !self.description.is_empty() {
            writeln!(f, "Description: {}", self.description)?;
        }
        write_list(f, "Key abilities", &self.key_abilities)?;
        write_list(f, "Equipment", &self.equipment)?;
        write_list(f, "Traits", &self.personality.traits)?;
        write_list(f, "Ideals", &self.personality.ideals)?;
        write_list(f, "Bonds", &self.personality.bonds)?;
        write_list(f, "Flaws", &self.personality.flaws)?;
        write_list(f, "Quirks", &self.personality.quirks)
    }
}
