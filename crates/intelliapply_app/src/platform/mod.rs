mod app;
mod config;
mod effects;
mod logging;
mod profile;
mod render;

use anyhow::Context;
use intelliapply_engine::{NewExperience, NewSkill, PreferencesUpdate};
use intelliapply_logging::ia_info;
use log::LevelFilter;

use crate::cli::{Cli, Command};
use app::DashboardCommand;
use config::AppConfig;
use profile::ProfileCommand;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.log_level_filter()?
    };
    logging::initialize(config.log_destination, level);
    ia_info!("intelliapply {} using {}", env!("CARGO_PKG_VERSION"), config.api_url);

    if cli.command.is_dashboard() {
        app::run_dashboard(&config, dashboard_command(cli.command)?)
    } else {
        profile::run_profile(&config, profile_command(cli.command)?)
    }
}

fn dashboard_command(command: Command) -> anyhow::Result<DashboardCommand> {
    Ok(match command {
        Command::Jobs => DashboardCommand::Jobs,
        Command::Refresh => DashboardCommand::Refresh,
        Command::Status { job_id, status } => DashboardCommand::SetStatus { job_id, status },
        Command::Show { job_id } => DashboardCommand::Show { job_id },
        other => anyhow::bail!("{other:?} is not a dashboard command"),
    })
}

fn profile_command(command: Command) -> anyhow::Result<ProfileCommand> {
    Ok(match command {
        Command::Profile => ProfileCommand::Show,
        Command::Preferences(args) => ProfileCommand::Preferences(PreferencesUpdate {
            first_name: args.first_name,
            last_name: args.last_name,
            desired_roles: args.roles,
            desired_locations: args.locations,
            min_salary: args.min_salary,
        }),
        Command::UploadResume { path } => ProfileCommand::UploadResume(path),
        Command::AddSkill { name, level } => ProfileCommand::AddSkill(NewSkill { name, level }),
        Command::RemoveSkill { skill_id } => ProfileCommand::RemoveSkill(skill_id),
        Command::ClearSkills => ProfileCommand::ClearSkills,
        Command::AddExperience(args) => ProfileCommand::AddExperience(NewExperience {
            title: args.title,
            company: args.company,
            location: args.location,
            start_date: args.start,
            end_date: args.end,
            description: args.description,
        }),
        Command::RemoveExperience { experience_id } => {
            ProfileCommand::RemoveExperience(experience_id)
        }
        other => anyhow::bail!("{other:?} is not a profile command"),
    })
}
