use chrono::{DateTime, NaiveDate, NaiveDateTime};
use intelliapply_core::{
    Banner, BannerKind, DashboardViewModel, JobCounts, JobDetailView, JobRowView, JobStatus,
    MatchBand,
};
use intelliapply_engine::Profile;

pub fn dashboard(view: &DashboardViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(banner) = &view.banner {
        lines.push(banner_line(banner));
    }
    lines.extend(counts_lines(&view.counts));
    lines.push(String::new());
    lines.extend(job_table(&view.jobs));
    lines
}

pub fn banner_line(banner: &Banner) -> String {
    match banner.kind {
        BannerKind::Warning => format!("warning: {}", banner.message),
        BannerKind::Error => format!("error: {}", banner.message),
    }
}

pub fn counts_lines(counts: &JobCounts) -> Vec<String> {
    let mut lines = vec![format!("Total jobs: {}", counts.total)];
    for status in JobStatus::ALL {
        lines.push(format!(
            "  {:<10} {:>4}  ({:.0}%)",
            status.as_str(),
            counts.by_status.get(status),
            counts.share_percent(status)
        ));
    }
    lines
}

pub fn job_table(rows: &[JobRowView]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["No matched jobs yet. Run `intelliapply refresh` to fetch new postings.".to_string()];
    }
    let mut lines = vec![format!(
        "{:>6}  {:>6}  {:<10}  {}",
        "ID", "MATCH", "STATUS", "JOB"
    )];
    lines.extend(rows.iter().map(job_row));
    lines
}

fn job_row(row: &JobRowView) -> String {
    let marker = if row.top_match { "*" } else { " " };
    let location = row
        .location
        .as_deref()
        .map(|location| format!(" ({location})"))
        .unwrap_or_default();
    format!(
        "{:>6}  {:>6}{} {:<10}  {} @ {}{}",
        row.job_id,
        match_label(row.match_percent),
        marker,
        row.status.as_str(),
        row.title,
        row.company,
        location
    )
}

fn match_label(percent: Option<f64>) -> String {
    percent
        .map(|percent| format!("{percent:.1}%"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn job_detail(detail: &JobDetailView) -> Vec<String> {
    let mut lines = vec![
        format!("{} @ {}", detail.title, detail.company),
        format!("Status:   {}", detail.status.as_str()),
    ];
    if let Some(percent) = detail.match_percent {
        let band = match MatchBand::for_score(percent / 100.0) {
            MatchBand::Strong => "strong",
            MatchBand::Moderate => "moderate",
            MatchBand::Weak => "weak",
        };
        lines.push(format!("Match:    {percent:.1}% ({band})"));
    }
    if let Some(location) = &detail.location {
        lines.push(format!("Location: {location}"));
    }
    if let Some(source) = &detail.source {
        lines.push(format!("Source:   {source}"));
    }
    if let Some(posted) = &detail.posted_date {
        lines.push(format!("Posted:   {}", format_date(posted)));
    }
    match &detail.apply_url {
        Some(url) => lines.push(format!("Apply:    {url}")),
        None => lines.push("Apply:    no application link".to_string()),
    }
    if let Some(description) = &detail.description {
        lines.push(String::new());
        lines.extend(description.lines().map(str::to_string));
    }
    lines
}

/// Prints only what changed in the refresh output since the previous call.
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    printed_messages: usize,
    last_progress: Option<&'static str>,
    last_banner: Option<Banner>,
}

impl ProgressPrinter {
    pub fn delta(&mut self, view: &DashboardViewModel) -> Vec<String> {
        let mut lines = Vec::new();
        if view.status_messages.len() < self.printed_messages {
            self.printed_messages = 0;
        }
        for message in &view.status_messages[self.printed_messages..] {
            lines.push(format!("> {message}"));
        }
        self.printed_messages = view.status_messages.len();

        if view.progress_message != self.last_progress {
            if let Some(progress) = view.progress_message {
                lines.push(format!("  {progress}"));
            }
            self.last_progress = view.progress_message;
        }

        if view.banner != self.last_banner {
            if let Some(banner) = &view.banner {
                lines.push(banner_line(banner));
            }
            self.last_banner = view.banner.clone();
        }
        lines
    }
}

pub fn profile_lines(profile: &Profile) -> Vec<String> {
    let name = [profile.first_name.as_deref(), profile.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let mut lines = vec![format!(
        "Name:      {}",
        if name.is_empty() { "(not set)" } else { name.as_str() }
    )];
    lines.push(format!("Roles:     {}", or_unset(profile.desired_roles.as_deref())));
    lines.push(format!(
        "Locations: {}",
        or_unset(profile.desired_locations.as_deref())
    ));
    lines.push(format!(
        "Salary:    {}",
        profile
            .min_salary
            .map(|salary| format!("from {salary}"))
            .unwrap_or_else(|| "(not set)".to_string())
    ));
    lines.push(format!("Resume:    {}", or_unset(profile.resume_path.as_deref())));

    lines.push(format!("Skills ({}):", profile.skills.len()));
    for skill in &profile.skills {
        match &skill.level {
            Some(level) => lines.push(format!("  [{}] {} ({level})", skill.id, skill.name)),
            None => lines.push(format!("  [{}] {}", skill.id, skill.name)),
        }
    }
    lines.push(format!("Experience ({}):", profile.experiences.len()));
    for experience in &profile.experiences {
        let period = match (&experience.start_date, &experience.end_date) {
            (Some(start), Some(end)) => format!(", {} - {}", format_date(start), format_date(end)),
            (Some(start), None) => format!(", since {}", format_date(start)),
            _ => String::new(),
        };
        lines.push(format!(
            "  [{}] {} @ {}{}",
            experience.id, experience.title, experience.company, period
        ));
    }
    lines
}

fn or_unset(value: Option<&str>) -> &str {
    value.filter(|value| !value.trim().is_empty()).unwrap_or("(not set)")
}

/// Shortens backend timestamps to a calendar date; unknown formats pass through.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.date_naive().to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.date().to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.to_string();
    }
    raw.to_string()
}
