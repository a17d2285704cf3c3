use crate::{JobId, JobStatus, RequestId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue `POST /api/jobs/refresh`.
    StartRefresh,
    /// Begin polling the task; replaces any previous poll timer.
    StartPolling { task_id: TaskId },
    StopPolling,
    StartProgressCycle,
    StopProgressCycle,
    /// Fetch jobs and counts in parallel.
    ReloadAll { request_id: RequestId },
    ReloadCounts,
    UpdateJobStatus { job_id: JobId, status: JobStatus },
    /// Deliver `Msg::MessageClearDue { token }` after the clear delay.
    ScheduleMessageClear { token: u64 },
    RedirectToLogin,
    /// Cancel every timer owned by the session.
    Teardown,
}
