/*
[INPUT]:  CLI arguments, YAML configuration file, HIKMALAYER_PRIVATE_KEY
[OUTPUT]: Authenticated session actions printed to stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hikmalayer_auth::{AuthConfig, AuthContext, LocalKeyProvider};

const PRIVATE_KEY_ENV: &str = "HIKMALAYER_PRIVATE_KEY";

#[derive(Parser, Debug)]
#[command(name = "hikmalayer-auth", version, about = "Hikmalayer wallet authentication client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Overrides `api_base_url` from the configuration
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and print the session
    Connect,
    /// Authenticate, then call a protected endpoint and print the body
    Call {
        #[arg(value_name = "METHOD")]
        method: String,
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(long, value_name = "JSON")]
        body: Option<String>,
    },
    /// Authenticate, then sign MESSAGE with the connected account
    Sign {
        #[arg(value_name = "MESSAGE")]
        message: String,
    },
    /// Revoke the session and forget the reconnect hint
    Logout,
    /// Print the reconnect hint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config_path.as_ref(), args.api_url)?;
    info!(api_base_url = %config.api_base_url, "configuration loaded");

    let output = match args.command {
        Command::Status => commands::status(&config)?,
        Command::Connect => commands::connect(&build_context(&config)?).await?,
        Command::Call { method, path, body } => {
            commands::call(&build_context(&config)?, &method, &path, body.as_deref()).await?
        }
        Command::Sign { message } => commands::sign(&build_context(&config)?, &message).await?,
        Command::Logout => commands::logout(&build_context(&config)?).await?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_context(config: &AuthConfig) -> Result<AuthContext> {
    let private_key = std::env::var(PRIVATE_KEY_ENV)
        .with_context(|| format!("{PRIVATE_KEY_ENV} must be set"))?;
    let provider = LocalKeyProvider::new(&private_key).context("load private key")?;
    info!(address = %provider.address(), "wallet loaded");
    AuthContext::from_config(config, Arc::new(provider)).context("build auth context")
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>, api_url: Option<String>) -> Result<AuthConfig> {
    let mut config = match path {
        Some(path) => AuthConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => AuthConfig::default(),
    };
    if let Some(api_url) = api_url {
        config.api_base_url = api_url;
        config.validate().context("invalid --api-url")?;
    }
    Ok(config)
}
