use url::Url;

use crate::{Banner, Job, JobCounts, JobId, JobStatus, RefreshTask};

/// Scores above this are flagged as top matches.
pub const TOP_MATCH_THRESHOLD: f64 = 0.8;
pub const MODERATE_MATCH_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseView {
    #[default]
    Idle,
    Starting,
    Refreshing,
    Reloading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBand {
    Strong,
    Moderate,
    Weak,
}

impl MatchBand {
    pub fn for_score(score: f64) -> Self {
        if score > TOP_MATCH_THRESHOLD {
            MatchBand::Strong
        } else if score > MODERATE_MATCH_THRESHOLD {
            MatchBand::Moderate
        } else {
            MatchBand::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardViewModel {
    pub phase: PhaseView,
    pub refreshing: bool,
    pub loading: bool,
    pub authenticated: bool,
    pub session_expired: bool,
    pub task: Option<RefreshTask>,
    pub jobs: Vec<JobRowView>,
    pub counts: JobCounts,
    /// Backend messages for the current refresh.
    pub status_messages: Vec<String>,
    /// Cosmetic line, independent of `status_messages`.
    pub progress_message: Option<&'static str>,
    pub banner: Option<Banner>,
    pub selected: Option<JobDetailView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub status: JobStatus,
    pub match_percent: Option<f64>,
    pub band: Option<MatchBand>,
    pub top_match: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDetailView {
    pub job_id: JobId,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub posted_date: Option<String>,
    pub status: JobStatus,
    pub match_percent: Option<f64>,
    /// Present only for absolute http(s) URLs.
    pub apply_url: Option<String>,
}

pub(crate) fn job_row_view(job: &Job) -> JobRowView {
    JobRowView {
        job_id: job.id,
        title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        status: job.status,
        match_percent: job.relevance_score.map(match_percent),
        band: job.relevance_score.map(MatchBand::for_score),
        top_match: job
            .relevance_score
            .is_some_and(|score| score > TOP_MATCH_THRESHOLD),
    }
}

pub(crate) fn job_detail_view(job: &Job) -> JobDetailView {
    JobDetailView {
        job_id: job.id,
        title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        description: job.description.clone(),
        source: job.source.clone(),
        posted_date: job.posted_date.clone(),
        status: job.status,
        match_percent: job.relevance_score.map(match_percent),
        apply_url: job.url.as_deref().and_then(apply_url),
    }
}

/// Score in percent, rounded to one decimal.
fn match_percent(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

fn apply_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with(score: Option<f64>, url: Option<&str>) -> Job {
        Job {
            id: 9,
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            relevance_score: score,
            url: url.map(str::to_string),
            ..Job::default()
        }
    }

    #[test]
    fn bands_follow_score_thresholds() {
        assert_eq!(MatchBand::for_score(0.95), MatchBand::Strong);
        assert_eq!(MatchBand::for_score(0.8), MatchBand::Moderate);
        assert_eq!(MatchBand::for_score(0.6), MatchBand::Weak);
    }

    #[test]
    fn row_rounds_match_to_one_decimal() {
        let row = job_row_view(&job_with(Some(0.8234), None));
        assert_eq!(row.match_percent, Some(82.3));
        assert!(row.top_match);

        let row = job_row_view(&job_with(None, None));
        assert_eq!(row.match_percent, None);
        assert!(!row.top_match);
    }

    #[test]
    fn apply_link_requires_web_url() {
        let detail = job_detail_view(&job_with(None, Some(" https://news.ycombinator.com/item?id=1 ")));
        assert_eq!(
            detail.apply_url.as_deref(),
            Some("https://news.ycombinator.com/item?id=1")
        );
        assert_eq!(job_detail_view(&job_with(None, Some("javascript:alert(1)"))).apply_url, None);
        assert_eq!(job_detail_view(&job_with(None, Some("/relative"))).apply_url, None);
    }
}
