pub mod console;
pub mod narrator;
