//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelSpec`] - a parsed `provider|model` pair
//! - [`model::Controller`] - who drives a persona (a model or a human)
//! - [`error::DomainError`] - domain-level errors
//! - [`validation::ConfigIssue`] - structured configuration findings

pub mod error;
pub mod model;
pub mod string;
pub mod validation;
