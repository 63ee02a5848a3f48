//! Command line definitions.

use clap::{Args, Parser, Subcommand};
use modcandy_core::models::IncidentFilter;
use modcandy_core::Route;

#[derive(Debug, Parser)]
#[command(name = "modcandy", version, about = "Modcandy moderation dashboard")]
pub struct Cli {
    /// API base URL (overrides MODCANDY_API_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: Option<String>,
    },
    /// End the session and forget the stored token
    Logout,
    /// Show whether a session is active
    Status,
    /// Navigate to a dashboard path and show where the session lands
    Open { path: String },
    /// Overview: latest incidents, recent messages and credit usage
    Dashboard,
    /// List incidents
    Incidents(IncidentArgs),
    /// List flagged incidents
    Flagged(IncidentArgs),
    /// Recent chat messages
    Log,
    /// Toxicity statistics for all players
    Players,
    /// Incident history for one player
    Player { id: String },
    /// Messages of one game session
    Session { id: String },
    /// API key and credit usage
    Settings,
    /// Manage the account API key
    #[command(subcommand)]
    ApiKey(ApiKeyCommand),
}

#[derive(Debug, Subcommand)]
pub enum ApiKeyCommand {
    /// Create a new API key (shown once)
    Create { name: String },
    /// Delete the current API key
    Delete,
}

#[derive(Debug, Clone, Default, Args)]
pub struct IncidentArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub session_id: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub player_name: Option<String>,
}

impl From<IncidentArgs> for IncidentFilter {
    fn from(args: IncidentArgs) -> Self {
        IncidentFilter {
            page: args.page,
            start_date: args.start_date,
            end_date: args.end_date,
            session_id: args.session_id,
            kind: args.kind,
            severity: args.severity,
            player_name: args.player_name,
        }
    }
}

impl Command {
    /// Dashboard location this command opens, for the route guard
    pub fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Register { .. } | Command::Status => Route::Landing,
            Command::Logout | Command::Dashboard => Route::Dashboard,
            Command::Open { path } => Route::parse(path),
            Command::Incidents(_) => Route::Incidents,
            Command::Flagged(_) => Route::Flagged,
            Command::Log => Route::Log,
            Command::Players => Route::Players,
            Command::Player { id } => Route::Player(id.clone()),
            Command::Session { id } => Route::Session(id.clone()),
            Command::Settings | Command::ApiKey(_) => Route::Settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_incident_filters() {
        let cli = Cli::parse_from([
            "modcandy",
            "incidents",
            "--page",
            "3",
            "--type",
            "toxicity",
            "--player-name",
            "griefer",
        ]);
        let Command::Incidents(args) = cli.command else {
            panic!("expected incidents command");
        };
        let filter = IncidentFilter::from(args);
        assert_eq!(filter.page, Some(3));
        assert_eq!(filter.kind.as_deref(), Some("toxicity"));
        assert_eq!(filter.player_name.as_deref(), Some("griefer"));
    }

    #[test]
    fn test_command_routes() {
        let cli = Cli::parse_from(["modcandy", "player", "p-1"]);
        assert_eq!(cli.command.route(), Route::Player("p-1".to_string()));

        let cli = Cli::parse_from(["modcandy", "--base-url", "http://x", "api-key", "delete"]);
        assert_eq!(cli.command.route(), Route::Settings);
        assert_eq!(cli.base_url.as_deref(), Some("http://x"));

        let cli = Cli::parse_from(["modcandy", "login"]);
        assert_eq!(cli.command.route(), Route::Landing);
    }
}
