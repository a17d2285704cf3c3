use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use intelliapply_core::{update, DashboardState, Effect, JobId, JobStatus, Msg, Phase};
use intelliapply_engine::{EngineHandle, ReqwestApiClient};
use intelliapply_logging::{ia_info, ia_warn};

use super::config::AppConfig;
use super::effects::{EffectQueue, EffectRunner};
use super::render::{self, ProgressPrinter};

/// Upper bound for a dashboard command, refresh included.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub enum DashboardCommand {
    Jobs,
    Refresh,
    SetStatus { job_id: JobId, status: JobStatus },
    Show { job_id: JobId },
}

pub fn run_dashboard(config: &AppConfig, command: DashboardCommand) -> anyhow::Result<()> {
    if !config.is_authenticated() {
        bail!("No access token configured. Sign in and set INTELLIAPPLY_ACCESS_TOKEN.");
    }
    let client = ReqwestApiClient::new(config.client_settings(), Arc::new(config.token_provider()))
        .context("cannot create API client")?;
    let engine = EngineHandle::new(Arc::new(client), config.engine_settings());

    let (msg_tx, msg_rx) = mpsc::channel();
    let mut app = DashboardApp::new(EffectRunner::new(engine, msg_tx), msg_rx);
    let result = app.execute(command);
    app.close();
    result
}

struct DashboardApp<Q: EffectQueue> {
    state: DashboardState,
    runner: Q,
    msg_rx: mpsc::Receiver<Msg>,
    printer: ProgressPrinter,
    follow_progress: bool,
    login_required: bool,
}

impl<Q: EffectQueue> DashboardApp<Q> {
    /// `msg_rx` receives the messages produced for effects handed to `runner`.
    fn new(runner: Q, msg_rx: mpsc::Receiver<Msg>) -> Self {
        Self {
            state: DashboardState::new(),
            runner,
            msg_rx,
            printer: ProgressPrinter::default(),
            follow_progress: false,
            login_required: false,
        }
    }

    fn execute(&mut self, command: DashboardCommand) -> anyhow::Result<()> {
        self.dispatch_msg(Msg::Mounted {
            authenticated: true,
        });
        self.run_until(|state, _| !state.view().loading)?;

        match command {
            DashboardCommand::Jobs => {}
            DashboardCommand::Refresh => {
                self.follow_progress = true;
                self.dispatch_msg(Msg::RefreshClicked);
                self.run_until(|state, _| state.phase() == &Phase::Idle && !state.view().loading)?;
                self.follow_progress = false;
            }
            DashboardCommand::SetStatus { job_id, status } => {
                if self.state.job(job_id).is_none() {
                    bail!("Job {job_id} is not among your matched jobs");
                }
                self.dispatch_msg(Msg::StatusChangeRequested { job_id, status });
                let mut succeeded = None;
                self.run_until(|_, msg| match msg {
                    Some(Msg::StatusChangeFinished { job_id: done, result }) if *done == job_id => {
                        succeeded = Some(result.is_ok());
                        false
                    }
                    // Success refreshes counts; failure reloads everything.
                    Some(Msg::CountsReloaded(_)) => succeeded == Some(true),
                    Some(Msg::Reloaded { .. }) => succeeded == Some(false),
                    _ => false,
                })?;
                print_lines(&render::dashboard(&self.state.view()));
                if succeeded != Some(true) {
                    bail!("Could not change the status of job {job_id}");
                }
                return Ok(());
            }
            DashboardCommand::Show { job_id } => {
                self.dispatch_msg(Msg::JobSelected { job_id });
                let view = self.state.view();
                let Some(detail) = view.selected else {
                    bail!("Job {job_id} is not among your matched jobs");
                };
                print_lines(&render::job_detail(&detail));
                return Ok(());
            }
        }

        print_lines(&render::dashboard(&self.state.view()));
        Ok(())
    }

    /// Pumps engine messages into the state machine until `done` holds.
    ///
    /// `done` also sees the message just applied, `None` for the initial check.
    fn run_until(
        &mut self,
        mut done: impl FnMut(&DashboardState, Option<&Msg>) -> bool,
    ) -> anyhow::Result<()> {
        if done(&self.state, None) {
            return Ok(());
        }
        let deadline = Instant::now() + COMMAND_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                bail!("Timed out waiting for the backend");
            }
            let msg = match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => msg,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => bail!("Engine stopped unexpectedly"),
            };
            self.dispatch_msg(msg.clone());
            if self.login_required {
                bail!("Your session has expired. Sign in again and update INTELLIAPPLY_ACCESS_TOKEN.");
            }
            if done(&self.state, Some(&msg)) {
                return Ok(());
            }
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty && self.follow_progress {
            print_lines(&self.printer.delta(&self.state.view()));
        }
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        if effects.contains(&Effect::RedirectToLogin) {
            ia_warn!("Session rejected by backend; login required");
            self.login_required = true;
        }
        self.runner.enqueue(effects);
    }

    fn close(&mut self) {
        self.dispatch_msg(Msg::Unmounted);
        self.runner.shutdown();
        ia_info!("Dashboard closed");
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
