use std::sync::Arc;
use std::time::Duration;

use intelliapply_logging::{ia_debug, ia_info, ia_warn};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::{acquire_token, TokenProvider};
use crate::{
    ApiError, Experience, FailureKind, JobCounts, JobId, JobStatus, MatchedJob, NewExperience,
    NewSkill, PreferencesUpdate, Profile, RefreshAccepted, RefreshStatus, ResumeFile,
    ResumeUploadResponse, Skill,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Token lookups per request while no session is available.
    pub token_attempts: u32,
    pub token_retry_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            token_attempts: 3,
            token_retry_delay: Duration::from_millis(150),
        }
    }
}

/// Job endpoints used by the dashboard.
#[async_trait::async_trait]
pub trait JobsApi: Send + Sync {
    async fn matched_jobs(&self) -> Result<Vec<MatchedJob>, ApiError>;

    async fn update_job_status(&self, job_id: JobId, status: JobStatus) -> Result<(), ApiError>;

    async fn start_refresh(&self) -> Result<RefreshAccepted, ApiError>;

    async fn refresh_status(&self, task_id: &str) -> Result<RefreshStatus, ApiError>;

    async fn job_counts(&self) -> Result<JobCounts, ApiError>;
}

/// Profile endpoints: preferences, résumé, skills and experiences.
#[async_trait::async_trait]
pub trait ProfileApi: Send + Sync {
    async fn profile(&self) -> Result<Profile, ApiError>;

    async fn update_preferences(&self, update: &PreferencesUpdate) -> Result<Profile, ApiError>;

    async fn upload_resume(&self, file: ResumeFile) -> Result<ResumeUploadResponse, ApiError>;

    async fn add_skills(&self, skills: &[NewSkill]) -> Result<Vec<Skill>, ApiError>;

    async fn delete_skill(&self, skill_id: i64) -> Result<(), ApiError>;

    async fn delete_all_skills(&self) -> Result<(), ApiError>;

    async fn add_experiences(
        &self,
        experiences: &[NewExperience],
    ) -> Result<Vec<Experience>, ApiError>;

    async fn delete_experience(&self, experience_id: i64) -> Result<(), ApiError>;
}

enum Payload {
    Empty,
    Json(serde_json::Value),
    Resume(ResumeFile),
}

impl Payload {
    fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))
    }
}

pub struct ReqwestApiClient {
    http: reqwest::Client,
    base: Url,
    tokens: Arc<dyn TokenProvider>,
    settings: ClientSettings,
}

impl ReqwestApiClient {
    pub fn new(settings: ClientSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let base = Url::parse(settings.base_url.trim()).map_err(|err| {
            ApiError::new(
                FailureKind::InvalidRequest,
                format!("invalid base url {:?}: {err}", settings.base_url),
            )
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidRequest,
                format!("base url must be http(s): {base}"),
            ));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            http,
            base,
            tokens,
            settings,
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, method: Method, url: Url, payload: Payload) -> Result<Response, ApiError> {
        let token = acquire_token(
            self.tokens.as_ref(),
            self.settings.token_attempts,
            self.settings.token_retry_delay,
        )
        .await;

        ia_debug!("{} {}", method, url.path());
        let response = self
            .dispatch(method.clone(), url.clone(), &payload, token.as_deref())
            .await?;
        let status = response.status();
        if !is_auth_rejection(status) {
            return check_status(response).await;
        }

        ia_warn!("{} {} rejected with {}; refreshing session", method, url.path(), status);
        match self.tokens.refresh_session().await {
            Ok(Some(fresh)) => {
                let retry = self.dispatch(method, url, &payload, Some(&fresh)).await?;
                check_status(retry).await
            }
            Ok(None) => Err(unauthorized(status)),
            Err(err) => {
                ia_warn!("Session refresh failed: {}", err);
                Err(unauthorized(status))
            }
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        payload: &Payload,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(value) => request.json(value),
            Payload::Resume(file) => {
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.mime)
                    .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
                request.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };
        request.send().await.map_err(map_reqwest_error)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        payload: Payload,
    ) -> Result<T, ApiError> {
        let response = self.send(method, self.endpoint(segments), payload).await?;
        decode(response).await
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        payload: Payload,
    ) -> Result<(), ApiError> {
        self.send(method, self.endpoint(segments), payload).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobsApi for ReqwestApiClient {
    async fn matched_jobs(&self) -> Result<Vec<MatchedJob>, ApiError> {
        let jobs: Vec<MatchedJob> = self
            .fetch_json(Method::GET, &["api", "jobs", "matched"], Payload::Empty)
            .await?;
        ia_info!("Received {} matched jobs", jobs.len());
        Ok(jobs)
    }

    async fn update_job_status(&self, job_id: JobId, status: JobStatus) -> Result<(), ApiError> {
        let id = job_id.to_string();
        let body = Payload::json(&serde_json::json!({ "status": status }))?;
        self.execute(Method::PUT, &["api", "jobs", id.as_str(), "status"], body)
            .await
    }

    async fn start_refresh(&self) -> Result<RefreshAccepted, ApiError> {
        let accepted: RefreshAccepted = self
            .fetch_json(Method::POST, &["api", "jobs", "refresh"], Payload::Empty)
            .await?;
        ia_info!("Refresh task {} accepted", accepted.task_id);
        Ok(accepted)
    }

    async fn refresh_status(&self, task_id: &str) -> Result<RefreshStatus, ApiError> {
        self.fetch_json(
            Method::GET,
            &["api", "jobs", "refresh", "status", task_id],
            Payload::Empty,
        )
        .await
    }

    async fn job_counts(&self) -> Result<JobCounts, ApiError> {
        self.fetch_json(Method::GET, &["api", "jobs", "count"], Payload::Empty)
            .await
    }
}

#[async_trait::async_trait]
impl ProfileApi for ReqwestApiClient {
    async fn profile(&self) -> Result<Profile, ApiError> {
        self.fetch_json(Method::GET, &["api", "profile"], Payload::Empty)
            .await
    }

    async fn update_preferences(&self, update: &PreferencesUpdate) -> Result<Profile, ApiError> {
        self.fetch_json(
            Method::PUT,
            &["api", "profile", "preferences"],
            Payload::json(update)?,
        )
        .await
    }

    async fn upload_resume(&self, file: ResumeFile) -> Result<ResumeUploadResponse, ApiError> {
        ia_info!("Uploading resume {} ({} bytes)", file.file_name, file.bytes.len());
        self.fetch_json(
            Method::POST,
            &["api", "profile", "resume"],
            Payload::Resume(file),
        )
        .await
    }

    async fn add_skills(&self, skills: &[NewSkill]) -> Result<Vec<Skill>, ApiError> {
        self.fetch_json(
            Method::POST,
            &["api", "profile", "skills"],
            Payload::json(skills)?,
        )
        .await
    }

    async fn delete_skill(&self, skill_id: i64) -> Result<(), ApiError> {
        let id = skill_id.to_string();
        self.execute(Method::DELETE, &["api", "profile", "skills", id.as_str()], Payload::Empty)
            .await
    }

    async fn delete_all_skills(&self) -> Result<(), ApiError> {
        self.execute(
            Method::DELETE,
            &["api", "profile", "skills", "all"],
            Payload::Empty,
        )
        .await
    }

    async fn add_experiences(
        &self,
        experiences: &[NewExperience],
    ) -> Result<Vec<Experience>, ApiError> {
        self.fetch_json(
            Method::POST,
            &["api", "profile", "experiences"],
            Payload::json(experiences)?,
        )
        .await
    }

    async fn delete_experience(&self, experience_id: i64) -> Result<(), ApiError> {
        let id = experience_id.to_string();
        self.execute(
            Method::DELETE,
            &["api", "profile", "experiences", id.as_str()],
            Payload::Empty,
        )
        .await
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn unauthorized(status: StatusCode) -> ApiError {
    ApiError::new(FailureKind::Unauthorized(status.as_u16()), status.to_string())
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let kind = if is_auth_rejection(status) {
        FailureKind::Unauthorized(status.as_u16())
    } else if status.is_server_error() {
        FailureKind::Server(status.as_u16())
    } else {
        FailureKind::HttpStatus(status.as_u16())
    };
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::new(kind, error_detail(status, &body)))
}

/// Prefers the backend's `{"detail": "..."}` text over the bare status line.
fn error_detail(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail")?.as_str().map(str::to_string))
        .map(|detail| format!("{status}: {detail}"))
        .unwrap_or_else(|| status.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::new(FailureKind::MalformedPayload, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidRequest, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
