//! IntelliApply engine: backend API client, refresh-task poller and effect execution.
mod auth;
mod client;
mod engine;
mod poller;
mod types;

pub use auth::{StaticToken, TokenProvider};
pub use client::{ClientSettings, JobsApi, ProfileApi, ReqwestApiClient};
pub use engine::{EngineHandle, EngineSettings};
pub use poller::{poll_refresh_task, ChannelEventSink, EventSink, PollOutcome};
pub use types::{
    ApiError, EngineEvent, Experience, FailureKind, JobCounts, JobId, JobStatus, MatchedJob,
    NewExperience, NewSkill, PreferencesUpdate, Profile, RefreshAccepted, RefreshStatus,
    ResumeFile, ResumeUploadResponse, Skill, StatusCounts, TaskState,
};
