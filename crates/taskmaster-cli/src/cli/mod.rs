//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use taskmaster_core::config;
use taskmaster_core::http::HttpClient;
use taskmaster_core::session::FileSessionStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "TASKMASTER_LOG";

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(version)]
#[command(about = "TaskMaster project dashboard client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides TASKMASTER_API_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKMASTER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and store the session
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKMASTER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProjectCommands {
    /// Lists projects
    List,
    /// Shows a single project
    Show {
        #[arg(value_name = "PROJECT_ID")]
        id: i64,
    },
    /// Creates a project
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Updates a project's name and description
    Update {
        #[arg(value_name = "PROJECT_ID")]
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Deletes a project
    Delete {
        #[arg(value_name = "PROJECT_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    // Single-threaded: gateway calls are cooperative, nothing runs in parallel.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    rt.block_on(dispatch(cli))
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn build_client(api_url: Option<&str>) -> Result<HttpClient> {
    let config = config::Config::load().context("load config")?;
    let base_url = config.resolve_api_url(api_url)?;
    let store = Arc::new(FileSessionStore::default_location());
    Ok(HttpClient::new(base_url, store))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, api_url } = cli;

    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },

        Commands::Login { email, password } => {
            let client = build_client(api_url.as_deref())?;
            commands::auth::login(client, &email, &password).await
        }

        Commands::Register {
            email,
            password,
            name,
        } => {
            let client = build_client(api_url.as_deref())?;
            commands::auth::register(client, &email, &password, &name).await
        }

        Commands::Logout => commands::auth::logout(build_client(api_url.as_deref())?),

        Commands::Whoami => {
            commands::auth::whoami(&build_client(api_url.as_deref())?);
            Ok(())
        }

        Commands::Projects { command } => {
            let client = build_client(api_url.as_deref())?;
            match command {
                ProjectCommands::List => commands::projects::list(client).await,
                ProjectCommands::Show { id } => commands::projects::show(client, id).await,
                ProjectCommands::Create { name, description } => {
                    commands::projects::create(client, name, description).await
                }
                ProjectCommands::Update {
                    id,
                    name,
                    description,
                } => commands::projects::update(client, id, name, description).await,
                ProjectCommands::Delete { id } => commands::projects::delete(client, id).await,
            }
        }
    }
}
