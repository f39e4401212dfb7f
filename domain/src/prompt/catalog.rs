//! Built-in personas and tasks for the tabletop session.
//!
//! Every task is a `'static` constant so templates are checked once by the
//! catalog tests rather than at every turn.

use super::template::Task;
use crate::rules::difficulty::DIFFICULTY_SCHEMA;

/// Display names of the non-player personas.
pub mod persona {
    pub const DUNGEON_MASTER: &str = "Dungeon Master";
    pub const ENFORCER: &str = "Enforcer";
    pub const CHRONICLER: &str = "Chronicler";
}

pub const DUNGEON_MASTER_SYSTEM: &str = "\
You are an experienced Dungeon Master running a tabletop fantasy adventure. \
You describe places, creatures and consequences vividly and fairly. \
You never decide what a player character thinks, feels, says or does: \
those choices belong to the players. Keep each reply focused and under 200 words.";

pub const ENFORCER_SYSTEM: &str = "\
You are a Roleplay Enforcer. You receive a passage written during a tabletop game \
and return it unchanged unless it breaks a table rule. When it does, make the \
smallest possible edit that fixes the violation. Reply with the passage only, \
without commentary.";

pub const CHRONICLER_SYSTEM: &str = "\
You are the Chronicler of an adventuring party. You keep an accurate, compact \
record of events, decisions and their consequences so the story can continue \
without losing important details.";

/// System prompt for a player persona.
pub fn player_system(character_name: &str, character_sheet: &str) -> String {
    format!(
        "You are playing {character_name}, a character in a tabletop fantasy adventure. \
Stay in character, speak in the first person, and only decide your own actions. \
The Dungeon Master decides outcomes.\n\nYour character sheet:\n{character_sheet}"
    )
}

pub const DESCRIBE_INITIAL_SITUATION: Task = Task::new(
    "describe_initial_situation",
    "Open the adventure for the acting character",
    "\
The adventure is about to begin. Set the scene for {character_name}.

Story so far:
{the_story_so_far}

{character_name}'s character sheet:
{character_sheet}

The rest of the party:
{other_characters}

Describe where {character_name} is, what they can see, hear and smell, and what \
immediate situation demands their attention. Establish the mood of the place. \
End by asking {character_name} what they do.",
);

pub const DESCRIBE_SITUATION: Task = Task::new(
    "describe_situation",
    "Describe the current situation to the acting character",
    "\
It is {character_name}'s turn.

Story so far:
{the_story_so_far}

{character_name}'s character sheet:
{character_sheet}

The rest of the party:
{other_characters}

Describe what {character_name} now perceives, building on recent events. \
Mention anything that has changed since their last action. \
End by asking {character_name} what they do.",
);

pub const ASK_QUESTIONS: Task = Task::new(
    "ask_questions",
    "Ask the Dungeon Master clarifying questions",
    "\
Story so far:
{the_story_so_far}

The Dungeon Master just told you:
{what_the_dm_just_told_you}

Your character sheet:
{character_sheet}

As {character_name}, ask the Dungeon Master at most three short questions about \
what you can perceive or already know. Do not take any action yet.",
);

pub const ANSWER_QUESTIONS: Task = Task::new(
    "answer_questions",
    "Answer the acting character's questions",
    "\
Story so far:
{the_story_so_far}

You just told {character_name}:
{what_you_just_told_the_player}

{character_name}'s character sheet:
{character_sheet}

{character_name} asks:
{questions}

Answer each question using only what {character_name} could reasonably perceive \
or know. Do not reveal hidden information and do not describe any action \
{character_name} has not taken.",
);

pub const DECLARE_INTENT: Task = Task::new(
    "declare_intent",
    "Propose an action for the party to weigh in on",
    "\
Story so far:
{the_story_so_far}

The Dungeon Master told you:
{what_the_dm_just_told_you}

You asked:
{player_questions}

The Dungeon Master answered:
{dm_answers}

Your character sheet:
{character_sheet}

As {character_name}, say what you are thinking of doing next. This is a proposal \
to your companions, not a final decision.",
);

pub const PROVIDE_FEEDBACK: Task = Task::new(
    "provide_feedback",
    "React in character to a companion's proposed action",
    "\
Story so far:
{the_story_so_far}

The Dungeon Master told {acting_character_name}:
{what_the_dm_just_told_you}

{acting_character_name} is considering:
{intended_action}

Your character sheet:
{other_character_sheet}

As {other_character_name}, give {acting_character_name} a brief reaction in \
character: support, a warning, or an alternative. Speak only for yourself.",
);

pub const MAKE_DECISION: Task = Task::new(
    "make_decision",
    "Commit to a final action",
    "\
Story so far:
{the_story_so_far}

The Dungeon Master told you:
{what_the_dm_just_told_you}

You proposed:
{intended_action}

Your companions said:
{party_feedback}

Your character sheet:
{character_sheet}

As {character_name}, state the single action you now commit to. Describe only \
what you attempt, not whether it works.",
);

pub const ASSESS_DIFFICULTY: Task = Task::new(
    "assess_difficulty",
    "Rate how hard the committed action is",
    "\
Story so far:
{the_story_so_far}

You told {character_name}:
{what_you_just_told_the_player}

{character_name}'s character sheet:
{character_sheet}

{character_name} attempts:
{proposed_action}

Rate the difficulty of this attempt for this character in this situation as one \
of auto_succeed, easy, average, hard, super_hard or auto_fail, and explain why \
in one or two sentences.",
)
.with_schema(DIFFICULTY_SCHEMA);

pub const RESOLVE_ACTION: Task = Task::new(
    "resolve_action",
    "Narrate the outcome of a resolved roll",
    "\
Story so far:
{the_story_so_far}

You told {character_name}:
{what_you_just_told_the_player}

{character_name}'s character sheet:
{character_sheet}

{character_name} attempted:
{proposed_action}

Difficulty: {difficulty_assessment}
Roll: {roll} (succeeds on {success_threshold} or less)
Succeeded: {did_roll_succeed}

Narrate the outcome. It must match the result of the roll. Describe the \
consequences in the world without deciding how {character_name} feels about them.",
);

pub const ENFORCE_DM: Task = Task::new(
    "enforce_dm",
    "Keep narration from deciding for player characters",
    "\
Table rule: the Dungeon Master must never state what a player character thinks, \
feels, says or does beyond what that player has explicitly declared.

Passage:
{dm_output}

Return the passage with any violating sentences minimally rewritten or removed. \
If there is no violation, return it exactly as written.",
);

pub const ENFORCE_PLAYER: Task = Task::new(
    "enforce_player",
    "Keep players from dictating outcomes",
    "\
Table rule: a player must never decide the outcome of an action, control another \
character, or declare what they find. Those belong to the Dungeon Master. A player \
may only describe what their own character attempts, says and feels.

Passage:
{player_output}

Return the passage with any violating sentences minimally rewritten as attempts \
or removed. If there is no violation, return it exactly as written.",
);

pub const SUMMARIZE_ROUND: Task = Task::new(
    "summarize_round",
    "Summarize a completed round",
    "\
Round {round_number} has ended.

How the adventure began:
{initial_situation}

Previous summary:
{previous_summary}

The party:
{party_members}

What happened this round:
{round_events}

Write a summary of this round in at most 150 words. Start with \"Round \
{round_number}:\". Keep names, decisions, outcomes and unresolved threats.",
);

pub const SUMMARIZE_TURN: Task = Task::new(
    "summarize_turn",
    "Summarize a single character's turn",
    "\
Summarize {character_name}'s turn in two or three sentences:

{turn_events}",
);

pub const COMPRESS_MEMORY: Task = Task::new(
    "compress_memory",
    "Condense a long story into its essentials",
    "\
Condense the following story into at most {max_words} words. Keep names, \
promises, injuries, items and open threats; drop descriptive detail.

{story}",
);

/// Every built-in task, for validation and listings.
pub const ALL_TASKS: [Task; 14] = [
    DESCRIBE_INITIAL_SITUATION,
    DESCRIBE_SITUATION,
    ASK_QUESTIONS,
    ANSWER_QUESTIONS,
    DECLARE_INTENT,
    PROVIDE_FEEDBACK,
    MAKE_DECISION,
    ASSESS_DIFFICULTY,
    RESOLVE_ACTION,
    ENFORCE_DM,
    ENFORCE_PLAYER,
    SUMMARIZE_ROUND,
    SUMMARIZE_TURN,
    COMPRESS_MEMORY,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_parses() {
        for task in ALL_TASKS {
            assert!(task.required_inputs().is_ok(), "{}", task.name);
        }
    }

    #[test]
    fn test_task_names_are_unique() {
        let mut names: Vec<_> = ALL_TASKS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_TASKS.len());
    }

    #[test]
    fn test_enforcer_tasks_take_a_single_input() {
        assert_eq!(ENFORCE_DM.required_inputs().unwrap(), vec!["dm_output"]);
        assert_eq!(
            ENFORCE_PLAYER.required_inputs().unwrap(),
            vec!["player_output"]
        );
    }

    #[test]
    fn test_only_difficulty_is_structured() {
        let structured: Vec<_> = ALL_TASKS
            .iter()
            .filter(|t| t.is_structured())
            .map(|t| t.name)
            .collect();
        assert_eq!(structured, vec!["assess_difficulty"]);
    }

    #[test]
    fn test_resolve_action_inputs() {
        let mut inputs = RESOLVE_ACTION.required_inputs().unwrap();
        inputs.sort_unstable();
        assert_eq!(
            inputs,
            vec![
                "character_name",
                "character_sheet",
                "did_roll_succeed",
                "difficulty_assessment",
                "proposed_action",
                "roll",
                "success_threshold",
                "the_story_so_far",
                "what_you_just_told_the_player",
            ]
        );
    }

    #[test]
    fn test_player_system_embeds_sheet() {
        let prompt = player_system("Eldara", "Level 3 Half-elf Wizard");
        assert!(prompt.starts_with("You are playing Eldara"));
        assert!(prompt.ends_with("Level 3 Half-elf Wizard"));
    }
}
