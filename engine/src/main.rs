// Skillforge
// Main entry point for the skillforge binary

use clap::Parser;
use sdk::errors::{EngineError, ForgeErrorExt};
use skillforge_engine::cli::{Cli, Command, SkillAction};
use skillforge_engine::config::Config;
use skillforge_engine::handlers::{
    handle_chat, handle_doctor, handle_exec, handle_run, handle_skill_add, handle_skill_catalog,
    handle_skill_list, handle_skill_remove, handle_skill_show, OutputFormat,
};
use skillforge_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let result = run(Cli::parse()).await;

    if let Err(e) = &result {
        if let Some(engine_error) = e.downcast_ref::<EngineError>() {
            eprintln!("hint: {}", engine_error.user_hint());
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // A missing .env is fine; keys may come from the real environment
    dotenvy::dotenv().ok();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Skillforge v{} ({} - {})", version, commit, timestamp);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Run { message } => {
            tracing::info!("Running orchestration");
            handle_run(message, &config, format).await
        }

        Command::Chat { message } => handle_chat(message, &config, format).await,

        Command::Exec { file, timeout } => {
            tracing::info!("Executing {}", file.display());
            handle_exec(&file, timeout, &config, format).await
        }

        Command::Skill { action } => {
            tracing::debug!("Skill management: {:?}", action);
            match action {
                SkillAction::List => handle_skill_list(&config, format).await,
                SkillAction::Catalog => handle_skill_catalog(&config).await,
                SkillAction::Show { name } => handle_skill_show(&name, &config, format).await,
                SkillAction::Add { file, name } => {
                    handle_skill_add(&file, name, &config, format).await
                }
                SkillAction::Remove { name } => handle_skill_remove(&name, &config, format).await,
            }
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
