//! Profile commands. These are single request/response calls and bypass the
//! dashboard state machine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use intelliapply_engine::{
    NewExperience, NewSkill, PreferencesUpdate, ProfileApi, ReqwestApiClient, ResumeFile,
};
use intelliapply_logging::ia_info;

use super::config::AppConfig;
use super::render;

pub enum ProfileCommand {
    Show,
    Preferences(PreferencesUpdate),
    UploadResume(PathBuf),
    AddSkill(NewSkill),
    RemoveSkill(i64),
    ClearSkills,
    AddExperience(NewExperience),
    RemoveExperience(i64),
}

pub fn run_profile(config: &AppConfig, command: ProfileCommand) -> anyhow::Result<()> {
    if !config.is_authenticated() {
        bail!("No access token configured. Sign in and set INTELLIAPPLY_ACCESS_TOKEN.");
    }
    if let ProfileCommand::Preferences(update) = &command {
        if update.is_empty() {
            bail!("Nothing to update. Pass at least one preference flag.");
        }
    }

    let client = ReqwestApiClient::new(config.client_settings(), Arc::new(config.token_provider()))
        .context("cannot create API client")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;

    let lines = runtime.block_on(execute(&client, command))?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn execute(api: &dyn ProfileApi, command: ProfileCommand) -> anyhow::Result<Vec<String>> {
    let lines = match command {
        ProfileCommand::Show => render::profile_lines(&api.profile().await?),
        ProfileCommand::Preferences(update) => {
            let profile = api.update_preferences(&update).await?;
            ia_info!("Preferences updated");
            render::profile_lines(&profile)
        }
        ProfileCommand::UploadResume(path) => {
            let file = ResumeFile::read(&path)?;
            let response = api.upload_resume(file).await?;
            if !response.success {
                bail!("Resume upload was not accepted: {}", response.message);
            }
            vec![response.message]
        }
        ProfileCommand::AddSkill(skill) => {
            let added = api.add_skills(std::slice::from_ref(&skill)).await?;
            added
                .iter()
                .map(|skill| format!("Added skill [{}] {}", skill.id, skill.name))
                .collect()
        }
        ProfileCommand::RemoveSkill(skill_id) => {
            api.delete_skill(skill_id).await?;
            vec![format!("Removed skill {skill_id}")]
        }
        ProfileCommand::ClearSkills => {
            api.delete_all_skills().await?;
            vec!["Removed all skills".to_string()]
        }
        ProfileCommand::AddExperience(experience) => {
            let added = api
                .add_experiences(std::slice::from_ref(&experience))
                .await?;
            added
                .iter()
                .map(|entry| {
                    format!(
                        "Added experience [{}] {} @ {}",
                        entry.id, entry.title, entry.company
                    )
                })
                .collect()
        }
        ProfileCommand::RemoveExperience(experience_id) => {
            api.delete_experience(experience_id).await?;
            vec![format!("Removed experience {experience_id}")]
        }
    };
    Ok(lines)
}
