//! Single-slot rendezvous for human-driven characters.
//!
//! Unlike the job queues this is not FIFO: at most one request is pending, and
//! a second requester waits for the slot before posting its own. A requester
//! that gives up withdraws its request, so answers only ever reach the request
//! they were given for.

use crate::ports::human_input::{HumanInputError, HumanInputPort};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, Semaphore, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Prefix marking a human answer in message-based front ends.
pub const INPUT_PREFIX: &str = "INPUT:";

/// Extract the payload of an `INPUT:`-prefixed message.
pub fn parse_input_message(message: &str) -> Option<&str> {
    message.strip_prefix(INPUT_PREFIX).map(str::trim)
}

/// What the person is being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub id: u64,
    pub speaker: String,
    pub prompt: String,
}

struct Pending {
    request: InputRequest,
    reply: oneshot::Sender<String>,
}

pub struct HumanInputSlot {
    permit: Semaphore,
    pending: Mutex<Option<Pending>>,
    posted: Notify,
    next_id: AtomicU64,
}

/// Withdraws request `id` if it is still pending when the requester stops
/// waiting.
struct Withdraw<'a> {
    slot: &'a HumanInputSlot,
    id: u64,
}

impl Drop for Withdraw<'_> {
    fn drop(&mut self) {
        if self.slot.cancel_request(self.id) {
            debug!(id = self.id, "Abandoned human input request withdrawn");
        }
    }
}

impl Default for HumanInputSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanInputSlot {
    pub fn new() -> Self {
        Self {
            permit: Semaphore::new(1),
            pending: Mutex::new(None),
            posted: Notify::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Post a request and wait for the answer.
    pub async fn request(
        &self,
        speaker: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<String, HumanInputError> {
        let _permit = self
            .permit
            .acquire()
            .await
            .map_err(|_| HumanInputError::Cancelled)?;

        let (reply, answer) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = InputRequest {
            id,
            speaker: speaker.into(),
            prompt: prompt.into(),
        };
        debug!(id, speaker = %request.speaker, "Waiting for human input");
        *self.slot() = Some(Pending { request, reply });
        // Dropped before the permit, so the next requester finds the slot empty.
        let _withdraw = Withdraw { slot: self, id };
        self.posted.notify_one();

        answer.await.map_err(|_| HumanInputError::Cancelled)
    }

    /// The request currently waiting for an answer, if any.
    pub fn pending_request(&self) -> Option<InputRequest> {
        self.slot().as_ref().map(|p| p.request.clone())
    }

    /// Wait until a request is pending.
    pub async fn next_request(&self) -> InputRequest {
        loop {
            let posted = self.posted.notified();
            if let Some(request) = self.pending_request() {
                return request;
            }
            posted.await;
        }
    }

    /// Answer the pending request.
    pub fn fulfill(&self, text: impl Into<String>) -> Result<(), HumanInputError> {
        let pending = self.slot().take().ok_or(HumanInputError::NoPendingRequest)?;
        pending
            .reply
            .send(text.into())
            .map_err(|_| HumanInputError::Cancelled)
    }

    /// Answer request `id`. Fails with [`HumanInputError::Cancelled`] when
    /// that request is no longer pending.
    pub fn answer(&self, id: u64, text: impl Into<String>) -> Result<(), HumanInputError> {
        let pending = self
            .slot()
            .take_if(|p| p.request.id == id)
            .ok_or(HumanInputError::Cancelled)?;
        pending
            .reply
            .send(text.into())
            .map_err(|_| HumanInputError::Cancelled)
    }

    /// Answer with an `INPUT:`-prefixed message.
    pub fn fulfill_message(&self, message: &str) -> Result<(), HumanInputError> {
        let text = parse_input_message(message).ok_or_else(|| {
            HumanInputError::InvalidInput(format!("expected '{INPUT_PREFIX}' prefix"))
        })?;
        self.fulfill(text)
    }

    /// Drop the pending request; its requester sees [`HumanInputError::Cancelled`].
    pub fn cancel_pending(&self) {
        if self.slot().take().is_some() {
            debug!("Pending human input request cancelled");
        }
    }

    /// Drop request `id` if it is the one pending. Returns whether it was.
    pub fn cancel_request(&self, id: u64) -> bool {
        self.slot().take_if(|p| p.request.id == id).is_some()
    }
}

/// Answer slot requests from a blocking [`HumanInputPort`] until cancelled.
pub(crate) fn spawn_input_bridge(
    slot: Arc<HumanInputSlot>,
    port: Arc<dyn HumanInputPort>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                _ = cancel.cancelled() => break,
                request = slot.next_request() => request,
            };

            let port = Arc::clone(&port);
            let asked = request.clone();
            let read =
                tokio::task::spawn_blocking(move || port.read_input(&asked.speaker, &asked.prompt));
            // A blocked read cannot be interrupted; leave it behind on cancel.
            let answer = tokio::select! {
                _ = cancel.cancelled() => break,
                answer = read => answer,
            };

            match answer {
                Ok(Ok(text)) => {
                    if let Err(e) = slot.answer(request.id, text) {
                        debug!(speaker = %request.speaker, error = %e, "Human answer arrived too late");
                    }
                }
                Ok(Err(e)) => {
                    warn!(speaker = %request.speaker, error = %e, "Human input failed");
                    slot.cancel_request(request.id);
                }
                Err(e) => {
                    warn!(error = %e, "Human input task panicked");
                    slot.cancel_request(request.id);
                }
            }
        }
        debug!("Human input bridge stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::human_input::ScriptedInput;
    use std::time::Duration;

    #[test]
    fn test_parse_input_message() {
        assert_eq!(parse_input_message("INPUT: I open the door"), Some("I open the door"));
        assert_eq!(parse_input_message("CHAT: hello"), None);
    }

    #[test]
    fn test_fulfill_without_request_fails() {
        let slot = HumanInputSlot::new();
        assert_eq!(slot.fulfill("hi"), Err(HumanInputError::NoPendingRequest));
    }

    #[tokio::test]
    async fn test_request_is_answered_by_fulfill() {
        let slot = Arc::new(HumanInputSlot::new());
        let asker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("Brussae", "What do you do?").await })
        };

        let request = slot.next_request().await;
        assert_eq!(request.speaker, "Brussae");
        slot.fulfill_message("INPUT: I raise my shield").unwrap();

        assert_eq!(asker.await.unwrap().unwrap(), "I raise my shield");
        assert!(slot.pending_request().is_none());
    }

    #[tokio::test]
    async fn test_only_one_request_is_outstanding() {
        let slot = Arc::new(HumanInputSlot::new());
        let first = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("A", "first").await })
        };
        let second = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("B", "second").await })
        };

        let request = slot.next_request().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The second requester is still waiting for the slot.
        assert_eq!(slot.pending_request(), Some(request.clone()));
        slot.fulfill(format!("answer {}", request.prompt)).unwrap();

        let next = slot.next_request().await;
        assert_ne!(next.speaker, request.speaker);
        slot.fulfill(format!("answer {}", next.prompt)).unwrap();

        assert_eq!(first.await.unwrap().unwrap(), "answer first");
        assert_eq!(second.await.unwrap().unwrap(), "answer second");
    }

    #[tokio::test]
    async fn test_cancel_pending_releases_requester() {
        let slot = Arc::new(HumanInputSlot::new());
        let asker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("A", "?").await })
        };
        slot.next_request().await;
        slot.cancel_pending();
        assert_eq!(asker.await.unwrap(), Err(HumanInputError::Cancelled));
    }

    #[tokio::test]
    async fn test_abandoned_request_is_withdrawn() {
        let slot = HumanInputSlot::new();

        let gave_up =
            tokio::time::timeout(Duration::from_millis(10), slot.request("A", "first")).await;
        assert!(gave_up.is_err());
        assert!(slot.pending_request().is_none());
        assert_eq!(slot.fulfill("answer"), Err(HumanInputError::NoPendingRequest));
    }

    #[tokio::test]
    async fn test_late_answer_does_not_reach_next_request() {
        let slot = Arc::new(HumanInputSlot::new());
        let stale = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("A", "first").await })
        };
        let first = slot.next_request().await;
        stale.abort();
        let _ = stale.await;

        let asker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("B", "second").await })
        };
        let second = slot.next_request().await;
        assert_eq!(second.speaker, "B");
        assert_ne!(second.id, first.id);

        assert_eq!(
            slot.answer(first.id, "meant for A"),
            Err(HumanInputError::Cancelled)
        );
        slot.answer(second.id, "meant for B").unwrap();
        assert_eq!(asker.await.unwrap().unwrap(), "meant for B");
    }

    struct Stuck;

    impl HumanInputPort for Stuck {
        fn read_input(&self, _speaker: &str, _prompt: &str) -> Result<String, HumanInputError> {
            std::thread::sleep(Duration::from_millis(300));
            Err(HumanInputError::Cancelled)
        }
    }

    #[tokio::test]
    async fn test_bridge_stops_while_port_is_blocked() {
        let slot = Arc::new(HumanInputSlot::new());
        let cancel = CancellationToken::new();
        let bridge = spawn_input_bridge(Arc::clone(&slot), Arc::new(Stuck), cancel.clone());

        let asker = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request("A", "?").await })
        };
        slot.next_request().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_millis(100), bridge)
            .await
            .expect("bridge kept waiting on the blocked port")
            .unwrap();
        slot.cancel_pending();
        assert_eq!(asker.await.unwrap(), Err(HumanInputError::Cancelled));
    }

    #[tokio::test]
    async fn test_bridge_answers_from_port() {
        let slot = Arc::new(HumanInputSlot::new());
        let cancel = CancellationToken::new();
        let bridge = spawn_input_bridge(
            Arc::clone(&slot),
            Arc::new(ScriptedInput::new(["I search the altar"])),
            cancel.clone(),
        );

        let answer = slot.request("Brussae", "Your move").await.unwrap();
        assert_eq!(answer, "I search the altar");

        // Script exhausted: the next request is cancelled, not hung.
        assert_eq!(
            slot.request("Brussae", "Again").await,
            Err(HumanInputError::Cancelled)
        );

        cancel.cancel();
        bridge.await.unwrap();
    }
}
