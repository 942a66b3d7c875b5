use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console_client::api::auth::{AuthApi, Credentials, LoginRequest};
use console_client::config::{load_config, ClientConfig};
use console_client::observability::logging;
use console_client::session::{MemorySession, SessionState};
use console_client::{HttpClient, RequestOptions};
use serde_json::Value;

const DEFAULT_DOWNLOAD_NAME: &str = "download.bin";

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Command-line access to the admin console API", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured base URL
    #[arg(short, long)]
    url: Option<String>,

    /// Access token
    #[arg(short, long, env = "CONSOLE_TOKEN")]
    token: Option<String>,

    /// Tenant id (enables tenant isolation)
    #[arg(long, env = "CONSOLE_TENANT")]
    tenant: Option<String>,

    /// Retries for transient failures
    #[arg(long)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path; params as key=value
    Get {
        path: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// DELETE, with an optional JSON body
    Delete {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Download a file
    Download {
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Log in with username and password and print the token
    Login {
        username: String,
        password: String,
        #[arg(long, default_value = "console-cli")]
        client_id: String,
        #[arg(long)]
        tenant_code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.endpoint.base_url = url.clone();
    }
    if let Some(retries) = cli.retries {
        config.retries.max_retries = retries;
    }
    config.unauthorized.logout_delay_ms = 0;

    logging::init(&config.observability)?;

    let session = Arc::new(MemorySession::new(SessionState {
        access_token: cli.token.clone(),
        tenant_enabled: cli.tenant.is_some(),
        tenant_id: cli.tenant.clone(),
    }));
    let client = HttpClient::builder(config).session(session.clone()).build()?;

    match cli.command {
        Commands::Get { path, params } => {
            let params = parse_params(&params)?;
            let data: Value = client.get(&path, &params, RequestOptions::default()).await?;
            print_json(&data)?;
        }
        Commands::Post { path, data } => {
            let body: Value = serde_json::from_str(&data)?;
            let data: Value = client
                .post(&path, &body, RequestOptions::default().with_success_message())
                .await?;
            print_json(&data)?;
        }
        Commands::Put { path, data } => {
            let body: Value = serde_json::from_str(&data)?;
            let data: Value = client
                .put(&path, &body, RequestOptions::default().with_success_message())
                .await?;
            print_json(&data)?;
        }
        Commands::Delete { path, data } => {
            let body: Value = match data {
                Some(d) => serde_json::from_str(&d)?,
                None => Value::Null,
            };
            let data: Value = client
                .delete(&path, &body, RequestOptions::default().with_success_message())
                .await?;
            print_json(&data)?;
        }
        Commands::Download { path, output, params } => {
            let params = parse_params(&params)?;
            let file = client.download(&path, &params, RequestOptions::default()).await?;
            let target = output
                .or_else(|| file.file_name.as_deref().and_then(safe_file_name))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_NAME));
            tokio::fs::write(&target, &file.body).await?;
            eprintln!("Saved {} bytes to {}", file.body.len(), target.display());
        }
        Commands::Login {
            username,
            password,
            client_id,
            tenant_code,
        } => {
            let api = AuthApi::new(client.clone());
            let req = LoginRequest::new(
                client_id,
                Credentials::Account {
                    username,
                    password,
                    captcha: None,
                    uuid: None,
                },
            );
            let info = api.sign_in(&session, &req, tenant_code.as_deref()).await?;
            eprintln!("Logged in as {}", info.username);
            if let Some(token) = session.snapshot().access_token.as_deref() {
                println!("{token}");
            }
        }
    }

    Ok(())
}

fn parse_params(pairs: &[String]) -> Result<Value, Box<dyn std::error::Error>> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("parameter '{pair}' is not key=value"))?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Value::Object(map))
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reduce a server-suggested file name to a bare name in the working
/// directory. Directory parts are dropped; `.`, `..` and empty names are
/// rejected.
fn safe_file_name(name: &str) -> Option<PathBuf> {
    let name = name.replace('\\', "/");
    let base = Path::new(&name).file_name()?;
    let path = PathBuf::from(base);
    match path.components().collect::<Vec<_>>().as_slice() {
        [Component::Normal(_)] => Some(path),
        _ => None,
    }
}
