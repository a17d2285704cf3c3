use crate::{Job, JobCounts, JobId, JobStatus, RequestFailure, RequestId, TaskId, TaskStatus};

/// One poll response for a refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub status: TaskStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Dashboard became visible; loads data when authenticated.
    Mounted { authenticated: bool },
    /// Dashboard went away; all session timers are cancelled.
    Unmounted,
    /// User asked for a job refresh.
    RefreshClicked,
    /// Backend accepted the refresh request.
    RefreshAccepted { task_id: TaskId, message: String },
    /// Backend (or transport) rejected the refresh request.
    RefreshRejected(RequestFailure),
    /// Result of one status poll.
    PollResult {
        task_id: TaskId,
        result: Result<TaskReport, RequestFailure>,
    },
    /// Cosmetic progress line should advance.
    ProgressTick,
    MessageClearDue { token: u64 },
    /// Both halves of a reload finished.
    Reloaded {
        request_id: RequestId,
        jobs: Result<Vec<Job>, RequestFailure>,
        counts: Result<JobCounts, RequestFailure>,
    },
    /// User changed a job's status.
    StatusChangeRequested { job_id: JobId, status: JobStatus },
    StatusChangeFinished {
        job_id: JobId,
        result: Result<(), RequestFailure>,
    },
    CountsReloaded(Result<JobCounts, RequestFailure>),
    JobSelected { job_id: JobId },
    JobDeselected,
    BannerDismissed,
    /// Render tick.
    Tick,
    NoOp,
}
