//! Run Session use case
//!
//! Plays rounds until the requested number is reached or a turn fails. Every
//! player acts once per round, in roster order. When a round ends, exactly one
//! summary is recorded: the Chronicler's when one is configured and answers,
//! otherwise a digest of the round's outcomes.

use super::execute_turn::{GameMaster, TurnError, TurnRecord};
use crate::agent::Agent;
use crate::ports::conversation_logger::ConversationEvent;
use crate::runtime::RespondError;
use serde_json::json;
use std::sync::Arc;
use tavern_domain::{TaskInputs, catalog};
use tracing::{error, info, warn};

/// Outcome of one completed round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub number: u32,
    pub turns: Vec<TurnRecord>,
    pub summary: String,
}

impl GameMaster {
    /// Play one full round and fold it into a summary.
    pub async fn execute_round(&mut self) -> Result<RoundReport, TurnError> {
        let number = self.state.current_round();
        info!(round = number, players = self.players.len(), "Round started");
        self.observer.on_round_start(number);

        let mut turns = Vec::with_capacity(self.players.len());
        for index in 0..self.players.len() {
            turns.push(self.execute_turn(index).await?);
        }

        let summary = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TurnError::Cancelled),
            summary = self.summarize_round() => summary,
        };
        self.state.close_round(summary.clone());
        for issue in self.state.validate() {
            warn!(round = number, %issue, "Game state inconsistency");
        }

        self.observer.on_round_complete(number, &summary);
        self.logger.log(ConversationEvent::new(
            "round_summary",
            json!({ "round": number, "summary": summary }),
        ));
        info!(round = number, "Round completed");

        Ok(RoundReport {
            number,
            turns,
            summary,
        })
    }

    /// Play `rounds` rounds. Stops at the first failed turn.
    pub async fn run(&mut self, rounds: u32) -> Result<Vec<RoundReport>, TurnError> {
        let mut reports = Vec::with_capacity(rounds as usize);
        for _ in 0..rounds {
            match self.execute_round().await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    if e.is_cancelled() {
                        info!(completed = reports.len(), "Session cancelled");
                    } else {
                        error!(completed = reports.len(), error = %e, "Session halted");
                    }
                    return Err(e);
                }
            }
        }
        Ok(reports)
    }

    async fn summarize_round(&self) -> String {
        let Some(chronicler) = &self.chronicler else {
            return self.state.round().digest();
        };

        match self.chronicle(chronicler).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Chronicler failed, using round digest");
                self.state.round().digest()
            }
        }
    }

    async fn chronicle(&self, chronicler: &Arc<Agent>) -> Result<String, RespondError> {
        let party = self
            .players
            .iter()
            .map(|p| p.sheet.headline())
            .collect::<Vec<_>>()
            .join("\n");
        let inputs = TaskInputs::new()
            .with("round_number", self.state.current_round())
            .with("initial_situation", self.state.initial_situation())
            .with(
                "previous_summary",
                self.state.previous_summary().unwrap_or("None yet."),
            )
            .with("party_members", party)
            .with("round_events", self.state.round_events());

        let summary = self
            .runtime
            .submit(chronicler, catalog::SUMMARIZE_ROUND, inputs)
            .await?
            .into_text();
        Ok(summary)
    }
}
