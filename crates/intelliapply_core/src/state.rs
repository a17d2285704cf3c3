use crate::view_model::{job_detail_view, job_row_view, DashboardViewModel, PhaseView};
use crate::{Job, JobCounts, JobId, JobStatus, ProgressTicker, RefreshTask, RequestId, TaskId};

/// Where the dashboard is in the refresh workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Refresh request sent, waiting for a task id.
    Starting,
    /// Task accepted; its status is being polled.
    Refreshing(RefreshTask),
    /// Refetching jobs and counts.
    Reloading { request_id: RequestId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Soft failure; the dashboard still shows fallback data.
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

/// Backend status messages for the current refresh, without consecutive repeats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    /// Appends `message` unless it is blank or equal to the last entry.
    pub fn push(&mut self, message: &str) -> bool {
        let message = message.trim();
        if message.is_empty() || self.entries.last().map(String::as_str) == Some(message) {
            return false;
        }
        self.entries.push(message.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    phase: Phase,
    mounted: bool,
    authenticated: bool,
    session_expired: bool,
    jobs: Vec<Job>,
    counts: JobCounts,
    messages: MessageLog,
    progress: ProgressTicker,
    banner: Option<Banner>,
    selected: Option<JobId>,
    next_request_id: RequestId,
    latest_reload: Option<RequestId>,
    last_applied_reload: Option<RequestId>,
    clear_token: u64,
    dirty: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> DashboardViewModel {
        let phase = match &self.phase {
            Phase::Idle => PhaseView::Idle,
            Phase::Starting => PhaseView::Starting,
            Phase::Refreshing(_) => PhaseView::Refreshing,
            Phase::Reloading { .. } => PhaseView::Reloading,
        };
        let task = match &self.phase {
            Phase::Refreshing(task) => Some(task.clone()),
            _ => None,
        };
        DashboardViewModel {
            phase,
            refreshing: self.is_refresh_in_flight(),
            loading: self.latest_reload.is_some(),
            authenticated: self.authenticated,
            session_expired: self.session_expired,
            task,
            jobs: self.jobs.iter().map(job_row_view).collect(),
            counts: self.counts,
            status_messages: self.messages.entries().to_vec(),
            progress_message: self.progress.current(),
            banner: self.banner.clone(),
            selected: self
                .selected
                .and_then(|job_id| self.job(job_id))
                .map(job_detail_view),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// True from the refresh request until the task reaches a terminal status.
    pub fn is_refresh_in_flight(&self) -> bool {
        matches!(self.phase, Phase::Starting | Phase::Refreshing(_))
    }

    pub fn is_loading(&self) -> bool {
        self.latest_reload.is_some()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == job_id)
    }

    pub fn counts(&self) -> JobCounts {
        self.counts
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn active_task_id(&self) -> Option<&TaskId> {
        match &self.phase {
            Phase::Refreshing(task) => Some(&task.id),
            _ => None,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mount(&mut self, authenticated: bool) {
        self.mounted = true;
        self.authenticated = authenticated;
        self.session_expired = false;
        self.mark_dirty();
    }

    pub(crate) fn unmount(&mut self) {
        self.mounted = false;
        self.phase = Phase::Idle;
        self.progress.stop();
        self.latest_reload = None;
        self.clear_token += 1;
        self.mark_dirty();
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.mark_dirty();
    }

    pub(crate) fn task_mut(&mut self, task_id: &str) -> Option<&mut RefreshTask> {
        match &mut self.phase {
            Phase::Refreshing(task) if task.id == task_id => Some(task),
            _ => None,
        }
    }

    /// Allocates a reload id and marks the dashboard as loading.
    pub(crate) fn begin_reload(&mut self) -> RequestId {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.latest_reload = Some(request_id);
        self.mark_dirty();
        request_id
    }

    /// Applies reload results unless a newer reload already landed.
    pub(crate) fn finish_reload(
        &mut self,
        request_id: RequestId,
        jobs: Vec<Job>,
        counts: JobCounts,
    ) -> bool {
        if self.latest_reload == Some(request_id) {
            self.latest_reload = None;
        }
        if self
            .last_applied_reload
            .is_some_and(|applied| applied > request_id)
        {
            return false;
        }
        self.last_applied_reload = Some(request_id);
        self.jobs = jobs;
        self.counts = counts;
        if self.selected.is_some_and(|job_id| self.job(job_id).is_none()) {
            self.selected = None;
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn set_counts(&mut self, counts: JobCounts) {
        self.counts = counts;
        self.mark_dirty();
    }

    /// Optimistically rewrites the cached status of one job.
    pub(crate) fn set_job_status(&mut self, job_id: JobId, status: JobStatus) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.id == job_id) else {
            return false;
        };
        job.status = status;
        self.mark_dirty();
        true
    }

    pub(crate) fn push_message(&mut self, message: &str) {
        if self.messages.push(message) {
            self.mark_dirty();
        }
    }

    /// Clears the log and invalidates any pending clear timer.
    pub(crate) fn reset_messages(&mut self) {
        self.clear_token += 1;
        if !self.messages.is_empty() {
            self.messages.clear();
            self.mark_dirty();
        }
    }

    /// Returns the token a delayed clear must present to take effect.
    pub(crate) fn next_clear_token(&mut self) -> u64 {
        self.clear_token += 1;
        self.clear_token
    }

    pub(crate) fn clear_messages_if_current(&mut self, token: u64) {
        if token == self.clear_token && !self.messages.is_empty() {
            self.messages.clear();
            self.mark_dirty();
        }
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressTicker {
        self.mark_dirty();
        &mut self.progress
    }

    pub(crate) fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
        self.mark_dirty();
    }

    pub(crate) fn clear_banner(&mut self) {
        if self.banner.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Marks the session expired; returns true only the first time.
    pub(crate) fn expire_session(&mut self) -> bool {
        if self.session_expired {
            return false;
        }
        self.session_expired = true;
        self.authenticated = false;
        self.mark_dirty();
        true
    }

    pub(crate) fn select(&mut self, job_id: Option<JobId>) {
        if self.selected != job_id {
            self.selected = job_id;
            self.mark_dirty();
        }
    }
}
