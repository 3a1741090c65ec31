//! CLI argument definitions for the Hub Chantier binary.

use chantier_hub::client::ChantierStatut;
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Hub Chantier construction-site management client
#[derive(Parser, Debug)]
#[command(name = "chantier-hub")]
#[command(about = "Hub Chantier: construction-site management from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command
#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Base URL of the Hub Chantier API
    #[arg(
        long,
        default_value = "http://127.0.0.1:3000",
        env = "CHANTIER_HUB_URL"
    )]
    pub url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check health of a running Hub Chantier server
    Health,
    /// Verify credentials and print the authenticated user
    Login(CredentialArgs),
    /// Show the user the server associates with the session cookie
    Whoami(CredentialArgs),
    /// Inspect chantiers
    Chantiers(ChantiersArgs),
}

/// Credentials, usually provided through the environment
#[derive(clap::Args, Debug)]
pub struct CredentialArgs {
    /// Account email
    #[arg(long, env = "CHANTIER_HUB_EMAIL")]
    pub email: String,

    /// Account password
    #[arg(long, env = "CHANTIER_HUB_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the chantiers command
#[derive(clap::Args, Debug)]
pub struct ChantiersArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: ChantiersCommand,
}

#[derive(Subcommand, Debug)]
pub enum ChantiersCommand {
    /// List chantiers
    List(ListArgs),
    /// Show one chantier
    Show(ShowArgs),
}

/// Arguments for `chantiers list`
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only show chantiers with this status
    #[arg(long, value_parser = parse_statut)]
    pub statut: Option<ChantierStatut>,

    /// Page to fetch
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size
    #[arg(long)]
    pub per_page: Option<u32>,
}

/// Arguments for `chantiers show`
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Chantier id
    pub id: Uuid,
}

fn parse_statut(value: &str) -> Result<ChantierStatut, String> {
    match value {
        "en_preparation" => Ok(ChantierStatut::EnPreparation),
        "en_cours" => Ok(ChantierStatut::EnCours),
        "receptionne" => Ok(ChantierStatut::Receptionne),
        "archive" => Ok(ChantierStatut::Archive),
        other => Err(format!(
            "unknown statut '{other}' (expected en_preparation, en_cours, receptionne or archive)"
        )),
    }
}
