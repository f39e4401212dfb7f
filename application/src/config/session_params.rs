//! Session parameters - round loop control.

use std::time::Duration;

/// Parameters of a play session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Rounds to play. Every player takes one turn per round.
    pub rounds: u32,
    /// Send enforced utterances to the speech queue.
    pub speech_enabled: bool,
    /// Ask the Chronicler for round summaries instead of a plain digest.
    pub chronicle_rounds: bool,
    /// When set, closed rounds are replaced in every prompt by this many of
    /// their most recent summaries. `None` keeps the whole story.
    pub summary_lookback: Option<usize>,
    /// Pause between two audio clips.
    pub playback_gap: Duration,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            rounds: 5,
            speech_enabled: false,
            chronicle_rounds: true,
            summary_lookback: None,
            playback_gap: Duration::from_millis(100),
        }
    }
}

impl SessionParams {
    // ==================== Builder Methods ====================

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_speech(mut self, enabled: bool) -> Self {
        self.speech_enabled = enabled;
        self
    }

    pub fn with_chronicle_rounds(mut self, enabled: bool) -> Self {
        self.chronicle_rounds = enabled;
        self
    }

    pub fn with_summary_lookback(mut self, rounds: usize) -> Self {
        self.summary_lookback = Some(rounds);
        self
    }

    pub fn with_playback_gap(mut self, gap: Duration) -> Self {
        self.playback_gap = gap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SessionParams::default();
        assert_eq!(params.rounds, 5);
        assert!(!params.speech_enabled);
        assert_eq!(params.summary_lookback, None);
        assert_eq!(params.playback_gap, Duration::from_millis(100));
    }

    #[test]
    fn test_builder() {
        let params = SessionParams::default()
            .with_rounds(2)
            .with_speech(true)
            .with_chronicle_rounds(false)
            .with_summary_lookback(2);
        assert_eq!(params.rounds, 2);
        assert!(params.speech_enabled);
        assert!(!params.chronicle_rounds);
        assert_eq!(params.summary_lookback, Some(2));
    }
}
