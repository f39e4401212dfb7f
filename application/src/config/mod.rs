//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RetryPolicy`] - model call attempts, backoff and per-attempt timeout
//! - [`SessionParams`] - rounds, speech, round summaries and pacing

pub mod retry_policy;
pub mod session_params;

pub use retry_policy::RetryPolicy;
pub use session_params::SessionParams;
