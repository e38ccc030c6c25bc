//! skillgap: skill-gap analysis between resumes and job descriptions

mod analysis;
mod cli;
mod config;
mod engine;
mod error;
mod extraction;
mod matching;
mod ontology;
mod output;
mod schema;

use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use config::EngineConfig;
use engine::{AnalysisRequest, GapEngine};
use error::{Result, SkillGapError};
use extraction::KeywordExtractor;
use log::{error, info};
use ontology::OntologyIndex;
use output::formatter::formatter_for;
use output::ReportRenderer;
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: EngineConfig) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            ontology,
            job_title,
            company,
            output,
            detailed,
            save,
        } => {
            cli::validate_file_extension(&resume, &["txt", "md"])
                .map_err(|e| SkillGapError::InvalidInput(format!("Resume file: {}", e)))?;
            cli::validate_file_extension(&job, &["txt", "md"])
                .map_err(|e| SkillGapError::InvalidInput(format!("Job description file: {}", e)))?;
            let output_format = cli::parse_output_format(&output).map_err(SkillGapError::InvalidInput)?;

            info!("Starting gap analysis: {} vs {}", resume.display(), job.display());

            let index = OntologyIndex::from_json_file(&ontology)?;
            let extractor = KeywordExtractor::new(index.skill_names())?;
            let engine = GapEngine::new(extractor, index, config.clone())?;

            let request = AnalysisRequest {
                resume_text: std::fs::read_to_string(&resume)?,
                job_text: std::fs::read_to_string(&job)?,
                job_title,
                company,
                ..AnalysisRequest::default()
            };
            let analysis = engine.analyze(&request).await?;

            let formatter = formatter_for(output_format, config.output.color_output, detailed);
            let formatted = formatter.format(&analysis)?;
            emit(&formatted, save.as_deref())?;
        }

        Commands::Render { input, save } => {
            let payload: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&input)?)?;
            let report = ReportRenderer::new(config.score_weights.level_grace).render_value(&payload)?;
            emit(&report, save.as_deref())?;
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    SkillGapError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("{}", content);
            }
            ConfigAction::Reset => {
                EngineConfig::default().save()?;
                println!("Configuration reset to defaults");
            }
            ConfigAction::Path => {
                println!("{}", EngineConfig::config_path().display());
            }
        },
    }

    Ok(())
}

fn emit(content: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            std::fs::write(path, content)?;
            println!("Saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
