//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use igen_core::{ClientConfig, Resource};
use igen_http::{ApiClient, ApiClientBuilder, FileCredentialStore, SessionTerminated};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(flatten)]
    Api(ApiCommands),
}

/// Commands that talk to the console backend
#[derive(Subcommand)]
pub enum ApiCommands {
    /// Sign in and store the issued credentials
    Login {
        /// User id (employee code)
        #[arg(long)]
        user_id: String,

        /// Password
        #[arg(long, env = "IGEN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored credentials
    Logout,

    /// Show the signed-in user, role and reachable collections
    Whoami,

    /// List every record of a collection
    List {
        /// Collection name, e.g. `transactions` or `cost-centres`
        resource: Resource,
    },

    /// Show one record
    Show { resource: Resource, id: String },

    /// Create a record from a JSON document
    Create {
        resource: Resource,

        /// JSON body, or `@path` to read it from a file
        #[arg(long)]
        data: String,
    },

    /// Replace a record, or update some of its fields with `--partial`
    Update {
        resource: Resource,
        id: String,

        /// JSON body, or `@path` to read it from a file
        #[arg(long)]
        data: String,

        /// Send a PATCH instead of a PUT
        #[arg(long)]
        partial: bool,
    },

    /// Delete a record
    Delete { resource: Resource, id: String },

    /// Show dashboard totals
    Dashboard,

    /// GET any path relative to the API base URL
    Get { path: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Output file path (defaults to ./igen.toml)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Commands {
    pub async fn execute(self, settings: ClientConfig, state_dir: PathBuf) -> Result<()> {
        match self {
            Self::Config { command } => command.execute(&settings),
            Self::Api(command) => {
                let client = build_client(&settings, state_dir)?;
                command.execute(&client).await
            }
        }
    }
}

impl ApiCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Login { user_id, password } => {
                client.login(&user_id, &password).await?;
                let claims = client.current_claims().await?;
                println!(
                    "Signed in as {} ({})",
                    claims.user_id.as_deref().unwrap_or(&user_id),
                    claims.role.map_or("no role", |role| role.as_str())
                );
                Ok(())
            }
            Self::Logout => {
                client.logout().await?;
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => whoami(client).await,
            Self::List { resource } => {
                client.authorize(resource).await?;
                let records: Vec<Value> = client.list(resource).await?;
                info!(%resource, count = records.len(), "Listed records");
                print_json(&Value::Array(records))
            }
            Self::Show { resource, id } => {
                client.authorize(resource).await?;
                let record: Value = client.fetch(resource, &id).await?;
                print_json(&record)
            }
            Self::Create { resource, data } => {
                client.authorize(resource).await?;
                let body = parse_body(&data)?;
                let created: Value = client.create(resource, &body).await?;
                print_json(&created)
            }
            Self::Update {
                resource,
                id,
                data,
                partial,
            } => {
                client.authorize(resource).await?;
                let body = parse_body(&data)?;
                let updated: Value = if partial {
                    client.patch(resource, &id, &body).await?
                } else {
                    client.update(resource, &id, &body).await?
                };
                print_json(&updated)
            }
            Self::Delete { resource, id } => {
                client.authorize(resource).await?;
                client.delete(resource, &id).await?;
                println!("Deleted {resource} {id}");
                Ok(())
            }
            Self::Dashboard => {
                client.authorize_dashboard().await?;
                let stats = client.dashboard_stats().await?;
                print_json(&serde_json::to_value(&stats)?)?;
                println!("Net balance: {:.2}", stats.net_balance());
                Ok(())
            }
            Self::Get { path } => {
                let body = client.get_json(&path).await?;
                print_json(&body)
            }
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, settings: &ClientConfig) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let config_path =
                    output.unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
                if config_path.exists() && !force {
                    bail!(
                        "{} already exists; pass --force to overwrite",
                        config_path.display()
                    );
                }

                if let Some(parent) = config_path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }

                config::generate_default_config(&config_path)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
            Self::Show => {
                print!("{}", config::render(settings)?);
                Ok(())
            }
        }
    }
}

fn build_client(settings: &ClientConfig, state_dir: PathBuf) -> Result<ApiClient> {
    let store = FileCredentialStore::in_dir(state_dir);
    info!(path = %store.path().display(), "Using credential store");

    let client = ApiClientBuilder::from_config(settings)
        .store(Arc::new(store))
        .listener(Arc::new(|event: &SessionTerminated| {
            warn!(reason = %event.reason, "Session expired; run `igen login` to sign in again");
        }))
        .build()?;
    Ok(client)
}

async fn whoami(client: &ApiClient) -> Result<()> {
    if !client.is_authenticated().await {
        bail!("Not signed in; run `igen login`");
    }

    let claims = client.current_claims().await?;
    println!("User:    {}", claims.user_id.as_deref().unwrap_or("<unknown>"));
    println!(
        "Role:    {}",
        claims.role.map_or("<none>", |role| role.as_str())
    );
    match claims.expires_at() {
        Some(expires_at) if claims.is_expired_at(chrono::Utc::now()) => {
            println!("Expires: {expires_at} (expired; renewed on next request)");
        }
        Some(expires_at) => println!("Expires: {expires_at}"),
        None => println!("Expires: <not set>"),
    }

    if let Some(role) = claims.role {
        let names: Vec<&str> = Resource::accessible_to(role).map(Resource::name).collect();
        println!("Access:  {}", names.join(", "));
    }
    Ok(())
}

/// Parse a `--data` argument: inline JSON or `@path`
fn parse_body(data: &str) -> Result<Value> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request body from {path}"))?,
        None => data.to_string(),
    };
    serde_json::from_str(&text).context("Request body is not valid JSON")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
