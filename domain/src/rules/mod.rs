//! Game rules: difficulty tiers, percentile dice and action resolution.

pub mod dice;
pub mod difficulty;
