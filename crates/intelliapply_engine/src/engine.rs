use std::future::Future;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use intelliapply_logging::{ia_debug, ia_error, ia_info};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::poller::{poll_refresh_task, ChannelEventSink, EventSink};
use crate::{ApiError, EngineEvent, FailureKind, JobId, JobStatus, JobsApi};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    /// Delay before a completed refresh's messages are cleared.
    pub message_clear_delay: Duration,
    pub progress_cycle_interval: Duration,
    /// Upper bound for the job-list half of a reload.
    pub reload_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            message_clear_delay: Duration::from_secs(5),
            progress_cycle_interval: Duration::from_secs(2),
            reload_timeout: Duration::from_secs(5),
        }
    }
}

enum EngineCommand {
    StartRefresh,
    StartPolling { task_id: String },
    StopPolling,
    StartProgressCycle,
    StopProgressCycle,
    ReloadAll { request_id: u64 },
    ReloadCounts,
    UpdateJobStatus { job_id: JobId, status: JobStatus },
    ScheduleMessageClear { token: u64 },
    Teardown,
    Shutdown,
}

/// Runs dashboard IO on a background tokio runtime and reports back through
/// [`EngineEvent`]s.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn JobsApi>, settings: EngineSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ia_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let mut worker = Worker::new(api, settings, runtime.handle().clone(), sink);
            while let Ok(command) = cmd_rx.recv() {
                if !worker.handle(command) {
                    break;
                }
            }
            worker.teardown();
            runtime.shutdown_background();
            ia_info!("Engine stopped");
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn start_refresh(&self) {
        self.send(EngineCommand::StartRefresh);
    }

    /// Starts polling `task_id`, cancelling any poll already running.
    pub fn start_polling(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            task_id: task_id.into(),
        });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn start_progress_cycle(&self) {
        self.send(EngineCommand::StartProgressCycle);
    }

    pub fn stop_progress_cycle(&self) {
        self.send(EngineCommand::StopProgressCycle);
    }

    pub fn reload_all(&self, request_id: u64) {
        self.send(EngineCommand::ReloadAll { request_id });
    }

    pub fn reload_counts(&self) {
        self.send(EngineCommand::ReloadCounts);
    }

    pub fn update_job_status(&self, job_id: JobId, status: JobStatus) {
        self.send(EngineCommand::UpdateJobStatus { job_id, status });
    }

    pub fn schedule_message_clear(&self, token: u64) {
        self.send(EngineCommand::ScheduleMessageClear { token });
    }

    /// Cancels every timer and pending request of the current session.
    pub fn teardown(&self) {
        self.send(EngineCommand::Teardown);
    }

    /// Stops the engine thread after tearing the session down.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    ///
    /// Fails with `Disconnected` once the engine thread has stopped and every
    /// queued event was delivered.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        match self.event_rx.lock() {
            Ok(event_rx) => event_rx.recv_timeout(timeout),
            Err(_) => Err(mpsc::RecvTimeoutError::Disconnected),
        }
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

struct Worker {
    api: Arc<dyn JobsApi>,
    settings: EngineSettings,
    runtime: Handle,
    sink: Arc<dyn EventSink>,
    session: CancellationToken,
    poll: Option<CancellationToken>,
    progress: Option<CancellationToken>,
}

impl Worker {
    fn new(
        api: Arc<dyn JobsApi>,
        settings: EngineSettings,
        runtime: Handle,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            api,
            settings,
            runtime,
            sink,
            session: CancellationToken::new(),
            poll: None,
            progress: None,
        }
    }

    /// Returns false when the engine should stop.
    fn handle(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::StartRefresh => {
                let api = self.api.clone();
                self.spawn_in_session(async move {
                    EngineEvent::RefreshRequested(api.start_refresh().await)
                });
            }
            EngineCommand::StartPolling { task_id } => {
                // One poll timer per session, ever.
                if let Some(previous) = self.poll.take() {
                    previous.cancel();
                }
                let cancel = self.session.child_token();
                self.poll = Some(cancel.clone());
                let api = self.api.clone();
                let sink = self.sink.clone();
                let interval = self.settings.poll_interval;
                self.runtime.spawn(async move {
                    poll_refresh_task(api.as_ref(), &task_id, interval, &cancel, sink.as_ref())
                        .await;
                });
            }
            EngineCommand::StopPolling => {
                if let Some(poll) = self.poll.take() {
                    poll.cancel();
                }
            }
            EngineCommand::StartProgressCycle => {
                if let Some(previous) = self.progress.take() {
                    previous.cancel();
                }
                let cancel = self.session.child_token();
                self.progress = Some(cancel.clone());
                let sink = self.sink.clone();
                let period = self.settings.progress_cycle_interval;
                self.runtime.spawn(async move {
                    let mut ticker =
                        tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                    loop {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = ticker.tick() => sink.emit(EngineEvent::ProgressTick),
                        }
                    }
                });
            }
            EngineCommand::StopProgressCycle => {
                if let Some(progress) = self.progress.take() {
                    progress.cancel();
                }
            }
            EngineCommand::ReloadAll { request_id } => {
                let api = self.api.clone();
                let reload_timeout = self.settings.reload_timeout;
                self.spawn_in_session(async move {
                    let jobs = async {
                        tokio::time::timeout(reload_timeout, api.matched_jobs())
                            .await
                            .unwrap_or_else(|_| {
                                Err(ApiError::new(
                                    FailureKind::Timeout,
                                    format!("matched jobs not received within {reload_timeout:?}"),
                                ))
                            })
                    };
                    let (jobs, counts) = futures_util::future::join(jobs, api.job_counts()).await;
                    EngineEvent::Reloaded {
                        request_id,
                        jobs,
                        counts,
                    }
                });
            }
            EngineCommand::ReloadCounts => {
                let api = self.api.clone();
                self.spawn_in_session(async move {
                    EngineEvent::CountsReloaded(api.job_counts().await)
                });
            }
            EngineCommand::UpdateJobStatus { job_id, status } => {
                let api = self.api.clone();
                self.spawn_in_session(async move {
                    EngineEvent::StatusUpdated {
                        job_id,
                        result: api.update_job_status(job_id, status).await,
                    }
                });
            }
            EngineCommand::ScheduleMessageClear { token } => {
                let delay = self.settings.message_clear_delay;
                self.spawn_in_session(async move {
                    tokio::time::sleep(delay).await;
                    EngineEvent::MessageClearDue { token }
                });
            }
            EngineCommand::Teardown => self.teardown(),
            EngineCommand::Shutdown => return false,
        }
        true
    }

    fn teardown(&mut self) {
        ia_debug!("Tearing down dashboard session");
        self.session.cancel();
        self.session = CancellationToken::new();
        self.poll = None;
        self.progress = None;
    }

    /// Runs `work` and emits its event unless the session is torn down first.
    fn spawn_in_session<F>(&self, work: F)
    where
        F: Future<Output = EngineEvent> + Send + 'static,
    {
        let cancel = self.session.child_token();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                event = work => {
                    if !cancel.is_cancelled() {
                        sink.emit(event);
                    }
                }
            }
        });
    }
}
