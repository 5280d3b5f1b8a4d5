//! Rescore CLI - ATS résumé analysis
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use rescore::{form, render, AnalysisState, Config, Orchestrator, Storage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rescore")]
#[command(author, version, about = "CLI for ATS resume analysis and scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a resume PDF against the scoring backend
    Analyze {
        /// Path to the resume PDF
        resume: PathBuf,
        /// Email address for the report
        #[arg(long)]
        email: String,
        /// Phone number to include in the report
        #[arg(long)]
        phone: Option<String>,
        /// Target job role for the analysis
        #[arg(long)]
        job_role: Option<String>,
        /// Skip the report email even when EmailJS is configured
        #[arg(long)]
        no_email: bool,
    },
    /// List past analyses
    List,
    /// Delete the stored analysis for a resume
    Delete {
        /// Path to the resume PDF
        resume: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            resume,
            email,
            phone,
            job_role,
            no_email,
        } => {
            let request = form::collect(&resume, &email, phone, job_role).await?;

            let mut config = Config::load()?;
            if no_email {
                config.email = Default::default();
            }
            let storage_path = config.storage.path.clone();

            println!("Uploading: {}", request.file_name);

            let mut orchestrator = Orchestrator::new(config)?;
            let resume_bytes = request.resume.clone();
            let user_email = request.email.clone();
            orchestrator.submit(request).await?;

            match orchestrator.state() {
                AnalysisState::Success => {
                    let result = match orchestrator.result().cloned() {
                        Some(result) => result,
                        None => anyhow::bail!("analysis succeeded without a result"),
                    };

                    render::print_result(&result);

                    // Persist to the local history, best effort.
                    match Storage::open(&storage_path) {
                        Ok(storage) => {
                            if let Err(e) = storage.store(
                                &resume_bytes,
                                &file_name_of(&resume),
                                user_email.as_deref(),
                                &result,
                            ) {
                                eprintln!("Warning: Failed to store analysis: {}", e);
                            }
                        }
                        Err(e) => eprintln!("Warning: Failed to open history: {}", e),
                    }

                    // Let the fire-and-forget email finish before exiting.
                    let email_enabled = orchestrator.email_enabled();
                    let email_sent = orchestrator.settle_email().await;
                    render::print_email_outcome(
                        email_sent,
                        user_email.as_deref().filter(|_| email_enabled),
                    );
                }
                AnalysisState::Error => {
                    let message = orchestrator.error().unwrap_or("unknown error");
                    eprintln!("{} {}", "Error:".red().bold(), message);
                    std::process::exit(1);
                }
                other => anyhow::bail!("analysis ended in unexpected state {:?}", other),
            }
        }
        Commands::List => {
            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;
            let analyses = storage.list_all()?;

            if analyses.is_empty() {
                println!("No stored analyses found.");
            } else {
                println!("Stored analyses ({}):\n", analyses.len());
                for stored in analyses {
                    render::print_history_entry(&stored);
                }
            }
        }
        Commands::Delete { resume } => {
            let config = Config::load()?;
            let storage = Storage::open(&config.storage.path)?;
            let bytes = tokio::fs::read(&resume).await?;

            if storage.delete(&bytes)? {
                println!("Deleted stored analysis for {}", resume.display());
            } else {
                println!("No stored analysis found for {}", resume.display());
            }
        }
    }

    Ok(())
}

/// File name component of a path for display and storage
fn file_name_of(path: &PathBuf) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
