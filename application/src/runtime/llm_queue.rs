//! The LLM job queue.
//!
//! A single worker executes jobs one at a time in submission order and hands
//! each result back through the job's reply slot.

use crate::agent::{Agent, AgentError};
use std::sync::Arc;
use tavern_domain::{AgentOutput, Task, TaskInputs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct LlmJob {
    pub agent: Arc<Agent>,
    pub task: Task,
    pub inputs: TaskInputs,
    pub reply: oneshot::Sender<Result<AgentOutput, AgentError>>,
}

pub(crate) fn spawn_llm_worker(
    cancel: CancellationToken,
) -> (mpsc::UnboundedSender<LlmJob>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<LlmJob>();

    let worker = tokio::spawn(async move {
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = job.agent.execute_task(&job.task, &job.inputs) => result,
            };

            if let Err(e) = &result {
                warn!(agent = job.agent.name(), task = job.task.name, error = %e, "LLM job failed");
            }
            if job.reply.send(result).is_err() {
                debug!(task = job.task.name, "LLM job result discarded: requester is gone");
            }
        }
        debug!("LLM worker stopped");
    });

    (tx, worker)
}
