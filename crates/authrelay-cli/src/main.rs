//! authrelay - send authenticated API requests from the command line.
//!
//! Credentials come from `AUTHRELAY_*` environment variables (a `.env` file
//! is honored), the config file, the OS keychain, or an interactive prompt,
//! in that order. The session token is cached between runs as an alias in
//! the user's cache directory.

mod credentials;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use authrelay_core::{
    AliasStore, AuthenticatedClient, ClientConfig, FileAliasStore, Method, RequestOptions,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use credentials::CredentialStore;

#[derive(Parser, Debug)]
#[command(name = "authrelay", version, about = "Self-authenticating HTTP client")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Alias cache file (defaults to the user cache directory)
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,

    /// Treat cached aliases older than this many minutes as missing
    #[arg(long, global = true)]
    alias_ttl_minutes: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and cache the session token
    Login {
        /// Log in even if a session is cached
        #[arg(long)]
        force: bool,
        /// Save the password in the OS keychain
        #[arg(long)]
        save_password: bool,
    },
    /// Remove the password saved for the configured login
    Forget,
    /// Send a request, e.g. `authrelay request GET users/{userUuid}`
    Request {
        method: String,
        uri: String,
        /// Extra header as `Name: value`; may reference aliases
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Query parameter as `key=value`
        #[arg(short = 'q', long = "query")]
        query: Vec<String>,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        /// Skip authentication and alias resolution
        #[arg(long)]
        raw: bool,
    },
    /// Inspect or edit cached aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
}

#[derive(Subcommand, Debug)]
enum AliasAction {
    Get { name: String },
    Set { name: String, value: String },
    /// Print a template with every `{name}` replaced
    Resolve { template: String },
    /// Delete every cached alias
    Clear,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let ttl = cli.alias_ttl_minutes.map(alias_ttl).transpose()?;
    let store = match cli.aliases {
        Some(ref path) => FileAliasStore::open(path, ttl),
        None => FileAliasStore::open_default(ttl),
    }
    .context("Failed to open alias cache")?;
    let store = Arc::new(store);

    match cli.command {
        Command::Alias { action } => run_alias(&store, action),
        Command::Forget => {
            let config = load_config(cli.config.as_deref())?;
            CredentialStore::delete(&config.credentials.login)?;
            println!("Removed saved password for {}", config.credentials.login);
            Ok(())
        }
        Command::Login {
            force,
            save_password,
        } => {
            let config = complete_credentials(load_config(cli.config.as_deref())?)?;
            if save_password {
                CredentialStore::store(&config.credentials.login, &config.credentials.password)?;
            }
            let client = AuthenticatedClient::new(config, store.clone())?;
            client.login(force).await.context("Login failed")?;
            info!("Session cached at {}", store.path().display());
            println!(
                "Logged in as {}",
                client.user_uuid().unwrap_or_else(|| "<unknown>".to_string())
            );
            Ok(())
        }
        Command::Request {
            method,
            uri,
            headers,
            query,
            data,
            raw,
        } => {
            let method: Method = method
                .to_uppercase()
                .parse()
                .with_context(|| format!("Invalid HTTP method: {}", method))?;
            let options = build_options(&headers, &query, data.as_deref())?;

            let config = load_config(cli.config.as_deref())?;
            let config = if raw {
                placeholder_credentials(config)
            } else {
                complete_credentials(config)?
            };
            let client = AuthenticatedClient::new(config, store.clone())?;

            let response = if raw {
                client.raw_request(method, &uri, options).await?
            } else {
                client.request(method, &uri, options).await?
            };
            println!("{}", pretty_body(response.text()));
            Ok(())
        }
    }
}

/// Convert `--alias-ttl-minutes` into a positive, representable duration.
fn alias_ttl(minutes: i64) -> Result<chrono::Duration> {
    if minutes <= 0 {
        bail!("--alias-ttl-minutes must be positive, got {}", minutes);
    }
    chrono::Duration::try_minutes(minutes)
        .with_context(|| format!("--alias-ttl-minutes {} is too large", minutes))
}

fn run_alias(store: &FileAliasStore, action: AliasAction) -> Result<()> {
    match action {
        AliasAction::Get { name } => println!("{}", store.get_alias(&name)?),
        AliasAction::Set { name, value } => store.set_alias(&name, &value),
        AliasAction::Resolve { template } => println!("{}", store.resolve(&template)?),
        AliasAction::Clear => store.clear().context("Failed to clear alias cache")?,
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .context("Failed to load config")?;
    Ok(config.merge_env()?)
}

/// Fill in a missing password from the keychain, then by prompting.
fn complete_credentials(mut config: ClientConfig) -> Result<ClientConfig> {
    if config.credentials.login.is_empty() {
        bail!("No login configured; set AUTHRELAY_LOGIN or add \"login\" to the config file");
    }
    if config.credentials.password.is_empty() {
        config.credentials.password = match CredentialStore::get_password(&config.credentials.login) {
            Some(password) => password,
            None => rpassword::prompt_password(format!("Password for {}: ", config.credentials.login))
                .context("Failed to read password")?,
        };
    }
    Ok(config)
}

/// Raw requests never log in, so any non-empty credentials will do.
fn placeholder_credentials(mut config: ClientConfig) -> ClientConfig {
    if config.credentials.login.is_empty() {
        config.credentials.login = "anonymous".to_string();
    }
    if config.credentials.password.is_empty() {
        config.credentials.password = "-".to_string();
    }
    config
}

fn build_options(headers: &[String], query: &[String], data: Option<&str>) -> Result<RequestOptions> {
    let mut options = RequestOptions::new();
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .with_context(|| format!("Header must look like 'Name: value', got {:?}", raw))?;
        options = options.header(name.trim(), value.trim());
    }
    for raw in query {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("Query must look like 'key=value', got {:?}", raw))?;
        options = options.query(key, value);
    }
    if let Some(data) = data {
        let body = serde_json::from_str(data).context("--data must be valid JSON")?;
        options = options.json(body);
    }
    Ok(options)
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}
