use std::fmt;
use std::str::FromStr;

pub type JobId = i64;
pub type TaskId = String;
pub type RequestId = u64;

/// Per-user status of a matched job. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Interested,
    Applied,
    Ignored,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Interested,
        JobStatus::Applied,
        JobStatus::Ignored,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Interested => "interested",
            JobStatus::Applied => "applied",
            JobStatus::Ignored => "ignored",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown job status {:?} (expected pending, interested, applied or ignored)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub posted_date: Option<String>,
    pub scraped_at: Option<String>,
    pub created_at: Option<String>,
    pub relevance_score: Option<f64>,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pending: u32,
    pub interested: u32,
    pub applied: u32,
    pub ignored: u32,
}

impl StatusCounts {
    pub fn get(&self, status: JobStatus) -> u32 {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Interested => self.interested,
            JobStatus::Applied => self.applied,
            JobStatus::Ignored => self.ignored,
        }
    }
}

/// Aggregate counts as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobCounts {
    pub total: u32,
    pub by_status: StatusCounts,
}

impl JobCounts {
    /// Share of `status` in the total, in percent. Zero when there are no jobs.
    pub fn share_percent(&self, status: JobStatus) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.by_status.get(status)) * 100.0 / f64::from(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

/// A backend refresh task while it is being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTask {
    pub id: TaskId,
    pub status: TaskStatus,
    pub message: String,
}
