use crate::{
    Banner, DashboardState, Effect, JobCounts, Msg, Phase, RefreshTask, RequestFailure,
    TaskReport, TaskStatus,
};

const STATUS_CHANGE_FAILED: &str = "Failed to update job status. Please try again.";
const REFRESH_FAILED: &str = "Job refresh failed. Please try again later.";
const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: DashboardState, msg: Msg) -> (DashboardState, Vec<Effect>) {
    // Results that arrive after teardown belong to a dead session.
    if !state.is_mounted() && !matches!(msg, Msg::Mounted { .. }) {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Mounted { authenticated } => {
            if state.is_mounted() {
                return (state, Vec::new());
            }
            state.mount(authenticated);
            if authenticated {
                let request_id = state.begin_reload();
                state.set_phase(Phase::Reloading { request_id });
                vec![Effect::ReloadAll { request_id }]
            } else {
                Vec::new()
            }
        }
        Msg::Unmounted => {
            state.unmount();
            vec![Effect::Teardown]
        }
        Msg::RefreshClicked => {
            if !state.is_authenticated() || state.phase() != &Phase::Idle {
                return (state, Vec::new());
            }
            state.clear_banner();
            state.reset_messages();
            state.set_phase(Phase::Starting);
            vec![Effect::StartRefresh]
        }
        Msg::RefreshAccepted { task_id, message } => {
            if state.phase() != &Phase::Starting {
                return (state, Vec::new());
            }
            state.push_message(&message);
            state.set_phase(Phase::Refreshing(RefreshTask {
                id: task_id.clone(),
                status: TaskStatus::Pending,
                message,
            }));
            state.progress_mut().start();
            vec![Effect::StartPolling { task_id }, Effect::StartProgressCycle]
        }
        Msg::RefreshRejected(failure) => {
            if state.phase() != &Phase::Starting {
                return (state, Vec::new());
            }
            state.set_phase(Phase::Idle);
            let mut effects = Vec::new();
            report_failure(&mut state, &failure, REFRESH_FAILED, &mut effects);
            effects
        }
        Msg::PollResult { task_id, result } => {
            if state.active_task_id() != Some(&task_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(report) => apply_poll_report(&mut state, &task_id, report),
                Err(failure) => {
                    state.progress_mut().stop();
                    state.set_phase(Phase::Idle);
                    let mut effects = vec![Effect::StopPolling, Effect::StopProgressCycle];
                    report_failure(&mut state, &failure, REFRESH_FAILED, &mut effects);
                    effects
                }
            }
        }
        Msg::ProgressTick => {
            if matches!(state.phase(), Phase::Refreshing(_)) {
                state.progress_mut().advance();
            }
            Vec::new()
        }
        Msg::MessageClearDue { token } => {
            state.clear_messages_if_current(token);
            Vec::new()
        }
        Msg::Reloaded {
            request_id,
            jobs,
            counts,
        } => {
            let mut effects = Vec::new();
            let mut problems = Vec::new();
            let jobs = jobs.unwrap_or_else(|failure| {
                problems.push(failure);
                Vec::new()
            });
            let counts = counts.unwrap_or_else(|failure| {
                problems.push(failure);
                JobCounts::default()
            });
            if state.finish_reload(request_id, jobs, counts) {
                for failure in &problems {
                    if failure.is_unauthorized() {
                        expire_session(&mut state, &mut effects);
                    }
                }
                if let Some(failure) = problems.first() {
                    if !failure.is_unauthorized() {
                        state.set_banner(Banner::warning(format!(
                            "Some job data could not be loaded: {failure}"
                        )));
                    }
                }
            }
            if state.phase() == &(Phase::Reloading { request_id }) {
                state.set_phase(Phase::Idle);
            }
            effects
        }
        Msg::StatusChangeRequested { job_id, status } => {
            if !state.is_authenticated() {
                return (state, Vec::new());
            }
            state.set_job_status(job_id, status);
            vec![Effect::UpdateJobStatus { job_id, status }]
        }
        Msg::StatusChangeFinished { result, .. } => match result {
            Ok(()) => vec![Effect::ReloadCounts],
            Err(failure) => {
                let mut effects = Vec::new();
                report_failure(&mut state, &failure, STATUS_CHANGE_FAILED, &mut effects);
                // Server state wins; refetch to undo the optimistic edit.
                let request_id = state.begin_reload();
                effects.push(Effect::ReloadAll { request_id });
                effects
            }
        },
        Msg::CountsReloaded(result) => {
            let mut effects = Vec::new();
            match result {
                Ok(counts) => state.set_counts(counts),
                Err(failure) if failure.is_unauthorized() => {
                    expire_session(&mut state, &mut effects);
                }
                Err(failure) => {
                    state.set_banner(Banner::warning(format!(
                        "Job counts could not be refreshed: {failure}"
                    )));
                }
            }
            effects
        }
        Msg::JobSelected { job_id } => {
            if state.job(job_id).is_some() {
                state.select(Some(job_id));
            }
            Vec::new()
        }
        Msg::JobDeselected => {
            state.select(None);
            Vec::new()
        }
        Msg::BannerDismissed => {
            state.clear_banner();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_poll_report(state: &mut DashboardState, task_id: &str, report: TaskReport) -> Vec<Effect> {
    state.push_message(&report.message);
    if let Some(task) = state.task_mut(task_id) {
        task.status = report.status;
        task.message = report.message.clone();
    }
    state.mark_dirty();

    match report.status {
        TaskStatus::Pending | TaskStatus::Running => Vec::new(),
        TaskStatus::Completed => {
            state.progress_mut().stop();
            let request_id = state.begin_reload();
            state.set_phase(Phase::Reloading { request_id });
            let token = state.next_clear_token();
            vec![
                Effect::StopPolling,
                Effect::StopProgressCycle,
                Effect::ReloadAll { request_id },
                Effect::ScheduleMessageClear { token },
            ]
        }
        TaskStatus::Failed => {
            state.progress_mut().stop();
            state.set_phase(Phase::Idle);
            let message = if report.message.trim().is_empty() {
                REFRESH_FAILED.to_string()
            } else {
                report.message
            };
            state.set_banner(Banner::error(message));
            vec![Effect::StopPolling, Effect::StopProgressCycle]
        }
    }
}

fn report_failure(
    state: &mut DashboardState,
    failure: &RequestFailure,
    fallback: &str,
    effects: &mut Vec<Effect>,
) {
    if failure.is_unauthorized() {
        expire_session(state, effects);
        return;
    }
    let message = if failure.message.trim().is_empty() {
        fallback.to_string()
    } else {
        format!("{fallback} ({failure})")
    };
    state.set_banner(Banner::error(message));
}

fn expire_session(state: &mut DashboardState, effects: &mut Vec<Effect>) {
    if state.expire_session() {
        state.set_banner(Banner::error(SESSION_EXPIRED));
        effects.push(Effect::RedirectToLogin);
    }
}
