use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use clinic_client::state::stats::DoctorDashboardStats;
use clinic_client::{
    ApiClient, ClientConfig, ClientError, FileTokenStore, HttpRequest, LoginRequest, Method, SessionStore, User,
    UserRole, api,
};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("not signed in; run `clinic-cli login` first")]
    NotSignedIn,
    #[error("`stats` is available to doctor and admin accounts only")]
    StatsUnavailable,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "clinic-cli", about = "Clinic appointment service CLI")]
struct Cli {
    #[arg(long, env = "CLINIC_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CLINIC_TOKEN_FILE", default_value = ".clinic-session.json")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session tokens.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the signed-in user.
    Whoami,
    /// Forget the stored session.
    Logout,
    Specialties,
    Doctors {
        #[arg(long)]
        specialty: Option<String>,
    },
    Appointments,
    Records,
    /// Dashboard counters for the signed-in doctor or admin.
    Stats,
    /// Raw authenticated call, e.g. `api GET /medicines`.
    Api(RawCommand),
}

#[derive(Args, Debug)]
struct RawCommand {
    #[arg(value_parser = parse_method)]
    method: Method,
    path: String,
    #[arg(long)]
    data: Option<String>,
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session = connect(&cli)?;

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(&LoginRequest::new(email, password)).await?;
            print_json(&user)
        }
        Command::Whoami => {
            let user = require_user(&session).await?;
            print_json(&user)
        }
        Command::Logout => {
            session.logout();
            tracing::debug!(token_file = %cli.token_file.display(), "stored tokens cleared");
            eprintln!("signed out");
            Ok(())
        }
        Command::Specialties => print_json(&api::list_specialties(session.client()).await?),
        Command::Doctors { specialty } => print_json(&api::list_doctors(session.client(), specialty.as_deref()).await?),
        Command::Appointments => print_json(&api::my_appointments(session.client()).await?),
        Command::Records => print_json(&api::my_records(session.client()).await?),
        Command::Stats => run_stats(&session).await,
        Command::Api(raw) => run_raw(session.client(), raw).await,
    }
}

fn connect(cli: &Cli) -> Result<SessionStore, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    tracing::debug!(base_url = %config.base_url, token_file = %cli.token_file.display(), "connecting");
    let tokens = Arc::new(FileTokenStore::open(&cli.token_file)?);
    let client = ApiClient::from_config(config, tokens)?;
    Ok(SessionStore::new(Arc::new(client)))
}

async fn require_user(session: &SessionStore) -> Result<User, CliError> {
    session.check_auth().await;
    session.current_user().ok_or(CliError::NotSignedIn)
}

async fn run_stats(session: &SessionStore) -> Result<(), CliError> {
    let user = require_user(session).await?;
    match user.role {
        UserRole::Admin => print_json(&api::dashboard_stats(session.client()).await?),
        UserRole::Doctor => {
            let appointments = api::my_appointments(session.client()).await?;
            let today = time::OffsetDateTime::now_utc().date();
            print_json(&DoctorDashboardStats::from_appointments(&appointments, today))
        }
        UserRole::Patient => Err(CliError::StatsUnavailable),
    }
}

async fn run_raw(client: &ApiClient, raw: RawCommand) -> Result<(), CliError> {
    tracing::debug!(method = %raw.method, path = %raw.path, "raw request");
    let mut request = HttpRequest::new(raw.method, raw.path);
    if let Some(data) = raw.data {
        request = request.json(&serde_json::from_str::<Value>(&data)?)?;
    }
    let response = client.send(request).await?;
    tracing::debug!(status = response.status, bytes = response.body.len(), "raw response");
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => print_json(&value),
        Err(_) => {
            println!("{}", response.body);
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
