use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use intelliapply_core::{
    Effect, ErrorKind, Job, JobCounts, JobStatus, Msg, RequestFailure, StatusCounts, TaskReport,
    TaskStatus,
};
use intelliapply_engine::{ApiError, EngineEvent, EngineHandle, FailureKind};
use intelliapply_logging::{ia_debug, ia_info, ia_warn};

/// Where the dashboard loop hands off effects it cannot run itself.
pub trait EffectQueue {
    fn enqueue(&mut self, effects: Vec<Effect>);
    fn shutdown(&mut self);
}

/// Executes dashboard effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    event_loop: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let event_loop = spawn_event_loop(engine.clone(), msg_tx);
        Self {
            engine,
            event_loop: Some(event_loop),
        }
    }
}

impl EffectQueue for EffectRunner {
    /// Runs engine-side effects. `RedirectToLogin` is left to the caller.
    fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            ia_debug!("Effect {:?}", effect);
            match effect {
                Effect::StartRefresh => self.engine.start_refresh(),
                Effect::StartPolling { task_id } => self.engine.start_polling(task_id),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::StartProgressCycle => self.engine.start_progress_cycle(),
                Effect::StopProgressCycle => self.engine.stop_progress_cycle(),
                Effect::ReloadAll { request_id } => self.engine.reload_all(request_id),
                Effect::ReloadCounts => self.engine.reload_counts(),
                Effect::UpdateJobStatus { job_id, status } => {
                    self.engine.update_job_status(job_id, status_to_wire(status))
                }
                Effect::ScheduleMessageClear { token } => self.engine.schedule_message_clear(token),
                Effect::Teardown => self.engine.teardown(),
                Effect::RedirectToLogin => {}
            }
        }
    }

    /// Stops the engine and waits for the event loop to drain.
    fn shutdown(&mut self) {
        self.engine.shutdown();
        if let Some(event_loop) = self.event_loop.take() {
            if event_loop.join().is_err() {
                ia_warn!("Engine event loop panicked");
            }
        }
    }
}

fn spawn_event_loop(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                if msg_tx.send(msg_for_event(event)).is_err() {
                    ia_info!("Dashboard gone; engine event loop exiting");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                ia_debug!("Engine stopped; event loop exiting");
                break;
            }
        }
    })
}

pub fn msg_for_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::RefreshRequested(Ok(accepted)) => Msg::RefreshAccepted {
            task_id: accepted.task_id,
            message: accepted.message,
        },
        EngineEvent::RefreshRequested(Err(err)) => Msg::RefreshRejected(failure_from(err)),
        EngineEvent::PollUpdate { task_id, result } => Msg::PollResult {
            task_id,
            result: result
                .map(|status| TaskReport {
                    status: task_status_from_wire(status.status),
                    message: status.message,
                })
                .map_err(failure_from),
        },
        EngineEvent::Reloaded {
            request_id,
            jobs,
            counts,
        } => Msg::Reloaded {
            request_id,
            jobs: jobs
                .map(|jobs| jobs.into_iter().map(job_from_wire).collect())
                .map_err(failure_from),
            counts: counts.map(counts_from_wire).map_err(failure_from),
        },
        EngineEvent::CountsReloaded(counts) => {
            Msg::CountsReloaded(counts.map(counts_from_wire).map_err(failure_from))
        }
        EngineEvent::StatusUpdated { job_id, result } => Msg::StatusChangeFinished {
            job_id,
            result: result.map_err(failure_from),
        },
        EngineEvent::MessageClearDue { token } => Msg::MessageClearDue { token },
        EngineEvent::ProgressTick => Msg::ProgressTick,
    }
}

fn failure_from(err: ApiError) -> RequestFailure {
    let kind = match err.kind {
        FailureKind::Network => ErrorKind::Network,
        FailureKind::Timeout => ErrorKind::Timeout,
        FailureKind::Unauthorized(_) => ErrorKind::Unauthorized,
        FailureKind::Server(_) => ErrorKind::Server,
        FailureKind::MalformedPayload => ErrorKind::Malformed,
        FailureKind::InvalidRequest | FailureKind::HttpStatus(_) => ErrorKind::Rejected,
    };
    if kind == ErrorKind::Unauthorized {
        ia_warn!("Backend rejected credentials: {}", err);
    }
    RequestFailure::new(kind, err.to_string())
}

fn job_from_wire(job: intelliapply_engine::MatchedJob) -> Job {
    Job {
        id: job.id,
        title: job.title,
        company: job.company,
        location: job.location,
        description: job.description,
        url: job.url,
        source: job.source,
        posted_date: job.posted_date,
        scraped_at: job.scraped_at,
        created_at: job.created_at,
        relevance_score: job.relevance_score,
        status: status_from_wire(job.status),
    }
}

fn counts_from_wire(counts: intelliapply_engine::JobCounts) -> JobCounts {
    JobCounts {
        total: counts.total,
        by_status: StatusCounts {
            pending: counts.by_status.pending,
            interested: counts.by_status.interested,
            applied: counts.by_status.applied,
            ignored: counts.by_status.ignored,
        },
    }
}

fn status_from_wire(status: intelliapply_engine::JobStatus) -> JobStatus {
    match status {
        intelliapply_engine::JobStatus::Pending => JobStatus::Pending,
        intelliapply_engine::JobStatus::Interested => JobStatus::Interested,
        intelliapply_engine::JobStatus::Applied => JobStatus::Applied,
        intelliapply_engine::JobStatus::Ignored => JobStatus::Ignored,
    }
}

fn status_to_wire(status: JobStatus) -> intelliapply_engine::JobStatus {
    match status {
        JobStatus::Pending => intelliapply_engine::JobStatus::Pending,
        JobStatus::Interested => intelliapply_engine::JobStatus::Interested,
        JobStatus::Applied => intelliapply_engine::JobStatus::Applied,
        JobStatus::Ignored => intelliapply_engine::JobStatus::Ignored,
    }
}

fn task_status_from_wire(state: intelliapply_engine::TaskState) -> TaskStatus {
    match state {
        intelliapply_engine::TaskState::Pending => TaskStatus::Pending,
        intelliapply_engine::TaskState::Running => TaskStatus::Running,
        intelliapply_engine::TaskState::Completed => TaskStatus::Completed,
        intelliapply_engine::TaskState::Failed => TaskStatus::Failed,
    }
}
