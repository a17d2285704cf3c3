//! IntelliApply core: pure dashboard state machine and view-model helpers.
mod effect;
mod failure;
mod job;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{ErrorKind, RequestFailure};
pub use job::{
    JobCounts, Job, JobId, JobStatus, RefreshTask, RequestId, StatusCounts, TaskId, TaskStatus,
    UnknownStatus,
};
pub use msg::{Msg, TaskReport};
pub use progress::{ProgressTicker, PROGRESS_MESSAGES};
pub use state::{Banner, BannerKind, DashboardState, MessageLog, Phase};
pub use update::update;
pub use view_model::{
    DashboardViewModel, JobDetailView, JobRowView, MatchBand, PhaseView, MODERATE_MATCH_THRESHOLD,
    TOP_MATCH_THRESHOLD,
};
