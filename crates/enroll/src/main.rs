//! `turmas-enroll` -- command-line front end for student enrollment.
//!
//! Fills in the enrollment form from a JSON draft, validates it, checks the
//! child's name against the registration service and submits it.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                 | Description                    |
//! |-------------------------------|----------|-------------------------|--------------------------------|
//! | `TURMAS_API_URL`              | no       | `http://localhost:8080` | Registration service base URL  |
//! | `TURMAS_REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request timeout in seconds |

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use turmas_client::{ClientConfig, RegistrationApi};
use turmas_core::controller::FormController;
use turmas_core::form::FormEdit;
use turmas_core::lookup::NameCheck;
use turmas_enroll::draft::EnrollmentDraft;
use turmas_enroll::render;

#[derive(Debug, Parser)]
#[command(name = "turmas-enroll", version, about = "Cadastro de aluno")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every class code.
    Classes,
    /// List the relationship codes for authorized adults.
    Relationships,
    /// Check whether a child's name is already registered.
    CheckName {
        /// Full name of the child.
        name: String,
    },
    /// Validate and submit an enrollment draft.
    Submit {
        /// Path to the JSON draft.
        draft: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "turmas_enroll=info,turmas_client=info,turmas_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "turmas-enroll failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Classes => {
            print!("{}", render::class_table());
            Ok(ExitCode::SUCCESS)
        }
        Command::Relationships => {
            print!("{}", render::relationship_table());
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckName { name } => {
            let mut controller = FormController::new(connect()?);
            controller.edit(FormEdit::ChildName(name))?;
            match controller.check_name().await {
                None => {
                    println!("Informe o nome da criança");
                    Ok(ExitCode::FAILURE)
                }
                Some(check) => {
                    println!("{}", render::describe_name_check(&check));
                    Ok(match check {
                        NameCheck::Available { .. } => ExitCode::SUCCESS,
                        _ => ExitCode::FAILURE,
                    })
                }
            }
        }
        Command::Submit { draft } => {
            let draft = EnrollmentDraft::load(&draft)?;
            let mut controller = FormController::new(connect()?);
            draft.apply_to(&mut controller)?;

            let result = controller.submit().await;
            print!("{}", render::describe(controller.snapshot()));
            match result {
                Ok(receipt) => {
                    tracing::info!(status = receipt.status, "Enrollment accepted");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Enrollment not accepted");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn connect() -> anyhow::Result<RegistrationApi> {
    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    tracing::info!(api_url = %config.api_url, "Using registration service");
    RegistrationApi::from_config(&config).context("Failed to build HTTP client")
}
