// server/src/cli/cli.rs
//! CLI wiring: configuration, service construction, session state and
//! command dispatch. Every command is one request: it is gated on the
//! session identity, runs one workflow operation, and its outcome comes
//! back as a user-facing message.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use log::warn;
use tokio::sync::Mutex as TokioMutex;

use lib::access::AuthContext;
use lib::commands::Commands;
use lib::config::{load_hospital_config, HospitalConfig};
use lib::database::Database;
use lib::notifications::{LogMailer, MailSender};
use lib::reports::{DocumentRenderer, PlainTextRenderer};
use lib::services::{
    AccountService, BillingService, ConsultationService, DashboardService, LaboratoryService,
    PatientService, PharmacyService, SchedulingService,
};

use crate::cli::handlers_appointment;
use crate::cli::handlers_billing;
use crate::cli::handlers_laboratory;
use crate::cli::handlers_patient;
use crate::cli::handlers_pharmacy;
use crate::cli::handlers_report;
use crate::cli::handlers_user;
use crate::cli::interactive;

const ENV_ADMIN_PASSWORD: &str = "HOSPITAL_ADMIN_PASSWORD";
const FALLBACK_ADMIN_PASSWORD: &str = "change-me-please";

#[derive(Parser, Debug)]
#[command(
    name = "hospital-server",
    version,
    about = "Role-based hospital administration"
)]
pub struct CliArgs {
    /// Path to the YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Email used to authenticate a one-shot command
    #[arg(long)]
    pub email: Option<String>,
    /// Password used to authenticate a one-shot command
    #[arg(long)]
    pub password: Option<String>,
    /// Enter interactive mode after running the command
    #[arg(long)]
    pub cli: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Everything a request handler needs: the services and the session.
pub struct AppState {
    pub config: HospitalConfig,
    pub accounts: AccountService,
    pub patients: PatientService,
    pub scheduling: SchedulingService,
    pub consultations: ConsultationService,
    pub pharmacy: PharmacyService,
    pub laboratory: LaboratoryService,
    pub billing: BillingService,
    pub dashboard: DashboardService,
    pub session: TokioMutex<Option<AuthContext>>,
}

impl AppState {
    pub async fn new(config: HospitalConfig) -> Result<Self> {
        let db = Database::new(config.storage.clone()).await?;
        let mailer: Arc<dyn MailSender> = Arc::new(LogMailer);
        let renderer: Arc<dyn DocumentRenderer> =
            Arc::new(PlainTextRenderer::new(config.hospital_name.clone()));

        Ok(AppState {
            accounts: AccountService::new(db.clone()),
            patients: PatientService::new(db.clone()),
            scheduling: SchedulingService::new(db.clone(), mailer),
            consultations: ConsultationService::new(db.clone()),
            pharmacy: PharmacyService::new(db.clone()),
            laboratory: LaboratoryService::new(db.clone(), renderer.clone()),
            billing: BillingService::new(db.clone(), renderer),
            dashboard: DashboardService::new(db),
            session: TokioMutex::new(None),
            config,
        })
    }

    /// Seeds the initial admin on an empty store. The password comes from
    /// HOSPITAL_ADMIN_PASSWORD; the fallback is only for local trials.
    pub async fn bootstrap(&self) -> Result<()> {
        let password = env::var(ENV_ADMIN_PASSWORD).unwrap_or_else(|_| {
            warn!(
                "{} not set, using the default admin password",
                ENV_ADMIN_PASSWORD
            );
            FALLBACK_ADMIN_PASSWORD.to_string()
        });
        self.accounts
            .bootstrap_admin(&self.config.admin_email, &password)
            .await?;
        Ok(())
    }

    pub async fn current_session(&self) -> Option<AuthContext> {
        self.session.lock().await.clone()
    }
}

/// The "please log in" message shown when a command arrives with no session.
pub const NOT_LOGGED_IN: &str = "Please log in first.";

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    let config = load_hospital_config(args.config.as_deref())?;
    let state = AppState::new(config).await?;
    state.bootstrap().await?;

    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        match state.accounts.authenticate(email, password).await {
            Ok(ctx) => {
                *state.session.lock().await = Some(ctx);
            }
            Err(e) => bail!("authentication failed: {}", e),
        }
    }

    let explicit_interactive = matches!(args.command, Some(Commands::Interactive));
    let should_enter_interactive =
        args.cli || args.command.is_none() || explicit_interactive;

    if let Some(command) = args.command {
        if !explicit_interactive {
            let output = run_single_command(command, &state).await;
            if !output.is_empty() {
                println!("{}", output);
            }
            if !should_enter_interactive {
                return Ok(());
            }
        }
    }

    if should_enter_interactive {
        interactive::run_cli_interactive(&state).await?;
    }
    Ok(())
}

pub async fn run_single_command(command: Commands, state: &AppState) -> String {
    match command {
        Commands::Login { email, password } => {
            handlers_user::handle_login(&email, &password, state).await
        }
        Commands::Logout => handlers_user::handle_logout(state).await,
        Commands::Whoami => handlers_user::handle_whoami(state).await,
        Commands::Dashboard => handlers_user::handle_dashboard(state).await,
        Commands::User(action) => handlers_user::handle_user_command(action, state).await,
        Commands::Patient(action) => handlers_patient::handle_patient_command(action, state).await,
        Commands::Appointment(action) => {
            handlers_appointment::handle_appointment_command(action, state).await
        }
        Commands::Pharmacy(action) => {
            handlers_pharmacy::handle_pharmacy_command(action, state).await
        }
        Commands::Lab(action) => handlers_laboratory::handle_lab_command(action, state).await,
        Commands::Billing(action) => handlers_billing::handle_billing_command(action, state).await,
        Commands::Report(action) => handlers_report::handle_report_command(action, state).await,
        Commands::Interactive => "Already in interactive mode.".to_string(),
        Commands::Exit => "Goodbye.".to_string(),
    }
}
