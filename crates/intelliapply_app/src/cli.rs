use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use intelliapply_core::{JobId, JobStatus};

#[derive(Debug, Parser)]
#[command(name = "intelliapply", version, about = "Job matching dashboard for the IntelliApply backend")]
pub struct Cli {
    /// RON configuration file. Defaults to ./intelliapply.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding config and environment.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List matched jobs and status counts.
    Jobs,
    /// Start a backend job refresh and follow it until it finishes.
    Refresh,
    /// Change the status of a matched job.
    Status {
        job_id: JobId,
        /// pending, interested, applied or ignored
        status: JobStatus,
    },
    /// Show one job in detail.
    Show { job_id: JobId },
    /// Print the user profile.
    Profile,
    /// Update search preferences. Omitted fields are left unchanged.
    Preferences(PreferencesArgs),
    /// Upload a résumé (pdf, doc, docx or txt).
    UploadResume { path: PathBuf },
    AddSkill {
        name: String,
        #[arg(long)]
        level: Option<String>,
    },
    RemoveSkill { skill_id: i64 },
    /// Delete every skill on the profile.
    ClearSkills,
    AddExperience(ExperienceArgs),
    RemoveExperience { experience_id: i64 },
}

impl Command {
    /// Commands that drive the dashboard state machine.
    pub fn is_dashboard(&self) -> bool {
        matches!(
            self,
            Command::Jobs | Command::Refresh | Command::Status { .. } | Command::Show { .. }
        )
    }
}

#[derive(Debug, Args)]
pub struct PreferencesArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Comma separated list of roles.
    #[arg(long)]
    pub roles: Option<String>,
    /// Comma separated list of locations.
    #[arg(long)]
    pub locations: Option<String>,
    #[arg(long)]
    pub min_salary: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ExperienceArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub location: Option<String>,
    /// Start date, e.g. 2021-04
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_change() {
        let cli = Cli::try_parse_from(["intelliapply", "status", "42", "Applied"]).unwrap();
        match cli.command {
            Command::Status { job_id, status } => {
                assert_eq!(job_id, 42);
                assert_eq!(status, JobStatus::Applied);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["intelliapply", "status", "42", "hired"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "intelliapply",
            "jobs",
            "--api-url",
            "http://backend:8000",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:8000"));
        assert!(cli.command.is_dashboard());
    }

    #[test]
    fn preferences_accept_partial_updates() {
        let cli =
            Cli::try_parse_from(["intelliapply", "preferences", "--min-salary", "90000"]).unwrap();
        match cli.command {
            Command::Preferences(args) => {
                assert_eq!(args.min_salary, Some(90000));
                assert_eq!(args.first_name, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
