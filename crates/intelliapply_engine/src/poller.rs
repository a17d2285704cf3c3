use std::time::Duration;

use intelliapply_logging::{ia_debug, ia_info, ia_warn};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, FailureKind, JobsApi, TaskState};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Why a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Finished(TaskState),
    /// Transport or decoding failure; not retried.
    Aborted(FailureKind),
    Cancelled,
}

/// Polls a refresh task every `interval` until it reaches a terminal state,
/// a request fails, or `cancel` fires.
///
/// The first request goes out one interval after the call. Every response is
/// emitted as [`EngineEvent::PollUpdate`]; nothing is emitted once `cancel`
/// has fired, and an in-flight request is dropped on cancellation.
pub async fn poll_refresh_task(
    api: &dyn JobsApi,
    task_id: &str,
    interval: Duration,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) -> PollOutcome {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ia_info!("Polling refresh task {} every {:?}", task_id, interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(task_id),
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(task_id),
            result = api.refresh_status(task_id) => result,
        };
        if cancel.is_cancelled() {
            return cancelled(task_id);
        }

        let outcome = match &result {
            Ok(status) if status.status.is_terminal() => Some(PollOutcome::Finished(status.status)),
            Ok(status) => {
                ia_debug!("Task {} is {:?}: {}", task_id, status.status, status.message);
                None
            }
            Err(err) => {
                ia_warn!("Polling task {} failed: {}", task_id, err);
                Some(PollOutcome::Aborted(err.kind.clone()))
            }
        };
        sink.emit(EngineEvent::PollUpdate {
            task_id: task_id.to_string(),
            result,
        });
        if let Some(outcome) = outcome {
            ia_info!("Stopped polling task {}: {:?}", task_id, outcome);
            return outcome;
        }
    }
}

fn cancelled(task_id: &str) -> PollOutcome {
    ia_debug!("Polling task {} cancelled", task_id);
    PollOutcome::Cancelled
}
