//! Player characters.

pub mod sheet;

pub use sheet::{CharacterSheet, Personality};
