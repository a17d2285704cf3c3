use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub type JobId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Interested,
    Applied,
    Ignored,
}

/// A job joined with the current user's match data, as served by `/api/jobs/matched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedJob {
    pub id: JobId,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub scraped_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub status: JobStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub interested: u32,
    #[serde(default)]
    pub applied: u32,
    #[serde(default)]
    pub ignored: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobCounts {
    pub total: u32,
    #[serde(default)]
    pub by_status: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshAccepted {
    pub task_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub status: TaskState,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewExperience {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub desired_roles: Option<String>,
    #[serde(default)]
    pub desired_locations: Option<String>,
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub resume_path: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial profile update. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_roles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_locations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<i64>,
}

impl PreferencesUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeUploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Résumé contents ready for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub fn read(path: &Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path).map_err(|err| {
            ApiError::new(
                FailureKind::InvalidRequest,
                format!("cannot read {}: {err}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("resume")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RefreshRequested(Result<RefreshAccepted, ApiError>),
    PollUpdate {
        task_id: String,
        result: Result<RefreshStatus, ApiError>,
    },
    Reloaded {
        request_id: u64,
        jobs: Result<Vec<MatchedJob>, ApiError>,
        counts: Result<JobCounts, ApiError>,
    },
    CountsReloaded(Result<JobCounts, ApiError>),
    StatusUpdated {
        job_id: JobId,
        result: Result<(), ApiError>,
    },
    MessageClearDue {
        token: u64,
    },
    ProgressTick,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Request could not be built (bad base URL, unreadable file, ...).
    InvalidRequest,
    Network,
    Timeout,
    /// 401/403 that survived the session refresh.
    Unauthorized(u16),
    Server(u16),
    HttpStatus(u16),
    MalformedPayload,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Unauthorized(code) => write!(f, "not authorized (http status {code})"),
            FailureKind::Server(code) => write!(f, "server error (http status {code})"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedPayload => write!(f, "malformed payload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_job_tolerates_missing_optional_fields() {
        let job: MatchedJob = serde_json::from_str(
            r#"{"id": 3, "title": "SRE", "company": "Acme", "location": null, "relevance_score": 0.82}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.relevance_score, Some(0.82));
        assert_eq!(job.location, None);
    }

    #[test]
    fn preferences_skip_unset_fields() {
        let update = PreferencesUpdate {
            desired_roles: Some("Backend Engineer".to_string()),
            ..PreferencesUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"desired_roles": "Backend Engineer"}));
        assert!(PreferencesUpdate::default().is_empty());
    }

    #[test]
    fn resume_mime_follows_extension() {
        assert_eq!(ResumeFile::new("cv.PDF", Vec::new()).mime, "application/pdf");
        assert_eq!(ResumeFile::new("cv", Vec::new()).mime, "application/octet-stream");
    }
}
