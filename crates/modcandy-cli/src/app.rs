//! Command dispatch for the CLI.
//!
//! Every command is mapped to a dashboard location. The session controller
//! is initialized at that location first, so protected views are refused
//! without a session and the login command notices an existing one.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use modcandy_core::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore};
use modcandy_core::config::TokenBackend;
use modcandy_core::models::IncidentFilter;
use modcandy_core::{
    ApiClient, ApiError, AuthError, Config, Credentials, Navigation, Route, SessionController,
    TokenStore,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::cli::{ApiKeyCommand, Command};

/// Email addresses longer than this are rejected at the prompt
const MAX_EMAIL_LENGTH: usize = 254;

pub struct App {
    config: Config,
    api: ApiClient,
}

impl App {
    pub fn new(base_url_override: Option<&str>) -> Result<Self> {
        let config = Config::load().unwrap_or_default();
        let api = match base_url_override {
            Some(url) => ApiClient::with_timeout(
                url,
                Duration::from_secs(config.request_timeout_secs()),
            ),
            None => ApiClient::from_config(&config),
        }
        .context("Failed to create HTTP client")?;
        Ok(Self { config, api })
    }

    /// Directory for the rolling log file, created on demand
    pub fn log_dir(&self) -> Option<PathBuf> {
        let dir = self.config.data_dir().ok()?.join("logs");
        std::fs::create_dir_all(&dir).ok()?;
        Some(dir)
    }

    fn token_store(&self) -> Result<Box<dyn TokenStore>> {
        Ok(match self.config.token_backend {
            TokenBackend::File => Box::new(FileTokenStore::new(&self.config.data_dir()?)),
            TokenBackend::Keyring => Box::new(KeyringTokenStore::new()),
            TokenBackend::Memory => Box::new(MemoryTokenStore::new()),
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        let mut controller =
            SessionController::new(self.api.clone(), self.token_store()?, command.route());
        let startup = controller.initialize();

        match command {
            Command::Login { email } => self.login(&mut controller, email).await,
            Command::Register { email } => self.register(&mut controller, email).await,
            Command::Logout => {
                if controller.is_authenticated() {
                    controller.logout();
                    println!("Logged out.");
                } else {
                    println!("Not logged in.");
                }
                Ok(())
            }
            Command::Status => {
                if controller.is_authenticated() {
                    println!("Logged in. Home: {}", controller.location());
                } else {
                    println!("Not logged in.");
                }
                Ok(())
            }
            Command::Open { path } => {
                match startup {
                    Navigation::Stay => println!("{}", controller.location()),
                    Navigation::Redirect(target) => {
                        println!("{} -> {}", Route::parse(&path), target)
                    }
                }
                Ok(())
            }
            protected => {
                Self::require_session(&controller)?;
                let result = Self::show(controller.api(), protected).await;
                if let Err(ref e) = result {
                    if end_rejected_session(&mut controller, e) {
                        eprintln!("Your session has expired. Run `modcandy login` again.");
                    }
                }
                result
            }
        }
    }

    /// Protected views are only reachable if the guard left us there
    fn require_session(controller: &SessionController) -> Result<()> {
        if !controller.location().is_protected() {
            bail!("Not logged in. Run `modcandy login` first.");
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn login(&mut self, controller: &mut SessionController, email: Option<String>) -> Result<()> {
        if controller.is_authenticated() {
            println!("Already logged in. Run `modcandy logout` to switch accounts.");
            return Ok(());
        }

        let email = self.prompt_email(email)?;
        let password = rpassword::prompt_password("Password: ")?;
        let credentials = Credentials::new(email, password);
        if !credentials.is_complete() {
            bail!("Email and password required");
        }

        println!("Signing in...");
        match controller.login(&credentials).await {
            Ok(navigation) => {
                self.remember_email(&credentials.identifier);
                Self::report_landing(&navigation, controller);
                Ok(())
            }
            Err(e) => Self::auth_failure(e),
        }
    }

    async fn register(&mut self, controller: &mut SessionController, email: Option<String>) -> Result<()> {
        if controller.is_authenticated() {
            println!("Already logged in. Run `modcandy logout` before creating an account.");
            return Ok(());
        }

        let email = self.prompt_email(email)?;
        let password = rpassword::prompt_password("Password: ")?;
        let confirmation = rpassword::prompt_password("Confirm password: ")?;
        let credentials = Credentials::new(email, password);
        if !credentials.is_complete() {
            bail!("Email and password required");
        }

        println!("Creating account...");
        match controller.register_confirmed(&credentials, &confirmation).await {
            Ok(navigation) => {
                self.remember_email(&credentials.identifier);
                Self::report_landing(&navigation, controller);
                Ok(())
            }
            Err(e) => Self::auth_failure(e),
        }
    }

    fn auth_failure(e: AuthError) -> Result<()> {
        error!(error = %e, "Authentication failed");
        bail!(e.user_message())
    }

    fn report_landing(navigation: &Navigation, controller: &SessionController) {
        match navigation {
            Navigation::Redirect(target) => println!("Logged in. Opening {}", target),
            Navigation::Stay => println!("Logged in. Current view: {}", controller.location()),
        }
    }

    fn prompt_email(&self, email: Option<String>) -> Result<String> {
        if let Some(email) = email {
            return Ok(email);
        }

        match self.config.last_email {
            Some(ref last) => print!("Email [{}]: ", last),
            None => print!("Email: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        let email = if input.is_empty() {
            self.config.last_email.clone().unwrap_or_default()
        } else {
            input.to_string()
        };
        if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_control) {
            bail!("Invalid email address");
        }
        Ok(email)
    }

    fn remember_email(&mut self, email: &str) {
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    async fn show(api: &ApiClient, command: Command) -> Result<()> {
        let value = match command {
            Command::Dashboard => {
                let filter = IncidentFilter::default();
                let (incidents, messages, credit) = futures::join!(
                    api.fetch_incidents(&filter),
                    api.fetch_recent_messages(),
                    api.fetch_credit(),
                );
                json!({
                    "incidents": serde_json::to_value(incidents?)?,
                    "recent_messages": messages?,
                    "credit": credit?,
                })
            }
            Command::Incidents(args) | Command::Flagged(args) => {
                serde_json::to_value(api.fetch_incidents(&args.into()).await?)?
            }
            Command::Log => api.fetch_recent_messages().await?,
            Command::Players => api.fetch_player_stats().await?,
            Command::Player { id } => api.fetch_player_incidents(&id).await?,
            Command::Session { id } => api.fetch_session_messages(&id).await?,
            Command::Settings => {
                let (key, credit) = futures::join!(api.fetch_api_key(), api.fetch_credit());
                json!({
                    "api_key": key?,
                    "credit": credit?,
                })
            }
            Command::ApiKey(ApiKeyCommand::Create { name }) => {
                let created = api.create_api_key(&name).await?;
                eprintln!("Copy this key now; it will not be shown again.");
                json!({ "key": created.key })
            }
            Command::ApiKey(ApiKeyCommand::Delete) => {
                api.delete_api_key().await?;
                json!({ "deleted": true })
            }
            other => bail!("Command {:?} has no view", other),
        };

        print_json(&value)
    }
}

/// Log out when the server refused the stored token, so the next run starts
/// unauthenticated instead of replaying it. Returns whether it did.
fn end_rejected_session(controller: &mut SessionController, err: &anyhow::Error) -> bool {
    if !matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
        return false;
    }
    warn!("Session token rejected by server");
    controller.logout();
    true
}

fn print_json(value: &Value) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
