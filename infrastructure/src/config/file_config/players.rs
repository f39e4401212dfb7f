//! Party roster from TOML (`[[players]]` array)

use super::agents::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tavern_domain::{
    CharacterSheet, ConfigIssue, ConfigIssueCode, Controller, Personality,
};

/// One party member.
///
/// # Example
///
/// ```toml
/// [[players]]
/// name = "Brussae"
/// model = "human"
/// voice = "iP95p4xoKVk53GoZ742B"
/// class = "Paladin"
/// race = "Human"
/// level = 2
///
/// [players.personality]
/// traits = ["brave", "direct"]
/// ideals = ["protect the innocent"]
/// bonds = ["sworn to defend the weak"]
/// flaws = ["too trusting"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePlayerConfig {
    /// `provider|model`, or `human` for a person at the keyboard
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Speech voice id
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(flatten)]
    pub sheet: CharacterSheet,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl FilePlayerConfig {
    pub fn new(sheet: CharacterSheet) -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            voice: None,
            sheet,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    pub fn parse_controller(&self) -> (Option<Controller>, Vec<ConfigIssue>) {
        match Controller::parse(&self.model) {
            Ok(controller) => (Some(controller), Vec::new()),
            Err(e) => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidModel,
                    format!("players.{}.model: {e}", self.name()),
                )],
            ),
        }
    }
}

/// The three-character party played when no roster is configured.
pub fn default_roster() -> Vec<FilePlayerConfig> {
    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    vec![
        FilePlayerConfig::new(
            CharacterSheet::new("Brussae", "Paladin", "Human")
                .with_pronouns("he/him")
                .with_level(2)
                .with_abilities(["divine magic", "combat", "healing"])
                .with_equipment(["longsword", "shield", "chain mail"])
                .with_description("A warrior of faith, devoted to protecting the innocent")
                .with_personality(Personality {
                    traits: list(&["brave", "compassionate", "direct"]),
                    ideals: list(&["protect the innocent", "uphold justice"]),
                    bonds: list(&["sworn to defend the weak", "devoted to their deity"]),
                    flaws: list(&["too trusting", "sees everything as good vs evil"]),
                    quirks: list(&[
                        "always cleans their sword after battle",
                        "prays before every meal",
                    ]),
                }),
        )
        .with_model("human")
        .with_voice("iP95p4xoKVk53GoZ742B"),
        FilePlayerConfig::new(
            CharacterSheet::new("Shadowstep", "Rogue", "Elf")
                .with_pronouns("he/him")
                .with_level(3)
                .with_abilities(["stealth", "lockpicking", "acrobatics"])
                .with_equipment(["daggers", "thieves tools", "leather armor"])
                .with_description("A nimble burglar with a heart of gold")
                .with_personality(Personality {
                    traits: list(&["cunning", "cautious", "witty"]),
                    ideals: list(&["freedom", "loyalty to friends"]),
                    bonds: list(&["protective of street urchins", "owes a debt to a noble"]),
                    flaws: list(&["greedy", "overconfident in their abilities"]),
                    quirks: list(&[
                        "always checks for traps, even in safe places",
                        "collects small trinkets",
                    ]),
                }),
        )
        .with_voice("JBFqnCBsd6RMkjVDRZzb"),
        FilePlayerConfig::new(
            CharacterSheet::new("Eldara", "Wizard", "half-elf")
                .with_pronouns("she/her")
                .with_level(2)
                .with_abilities(["arcane magic", "investigation", "history"])
                .with_equipment(["staff", "spellbook", "component pouch"])
                .with_description("A scholarly mage seeking ancient knowledge")
                .with_personality(Personality {
                    traits: list(&["analytical", "curious", "reserved"]),
                    ideals: list(&["knowledge", "magical preservation"]),
                    bonds: list(&["ancient magical texts", "wizard academy"]),
                    flaws: list(&[
                        "overthinks simple problems",
                        "dismissive of non-magical solutions",
                    ]),
                    quirks: list(&[
                        "takes notes about everything",
                        "speaks in unnecessarily complex terms",
                    ]),
                }),
        )
        .with_voice("Xb7hH8MSUJpSbSDYk0k2"),
    ]
}

/// Roster-level checks: names, sheets, controllers.
pub fn validate_roster(players: &[FilePlayerConfig]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    if players.is_empty() {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::NoPlayers,
            "players: the party needs at least one player",
        ));
        return issues;
    }

    let mut seen = HashSet::new();
    let mut humans = 0;
    for (index, player) in players.iter().enumerate() {
        let name = player.name().trim();
        if name.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyPlayerName,
                format!("players[{index}]: name cannot be empty"),
            ));
            continue;
        }
        if !seen.insert(name.to_lowercase()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicatePlayerName,
                format!("players: '{name}' appears more than once"),
            ));
        }

        let missing = player.sheet.missing_personality();
        if !missing.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::IncompleteCharacterSheet,
                format!(
                    "players.{name}.personality: {} cannot be empty",
                    missing.join(", ")
                ),
            ));
        }

        let (controller, controller_issues) = player.parse_controller();
        issues.extend(controller_issues);
        if controller.is_some_and(|c| c.is_human()) {
            humans += 1;
        }
    }

    if humans > 1 {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::MultipleHumans,
            format!("players: {humans} players are human-controlled and will share one console"),
        ));
    }
    issues
}
