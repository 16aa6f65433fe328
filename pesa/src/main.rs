use anyhow::{Context, bail};
use clap::Parser;
use data::response::{is_success, response_code, response_desc};
use data::transaction::fields::THIRD_PARTY_CONVERSATION_ID;
use pesa_core::{
    Client, ClientConfig, Credentials, Environment, TransactionKind, TransactionQuery,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

mod logging;

/// Send one M-Pesa transaction and print the API's answer.
#[derive(Debug, Parser)]
#[command(name = "pesa", version)]
struct Args {
    /// Client config (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Key store, overrides `keys_path` from the config.
    #[arg(short, long, conflicts_with = "keys_from_env")]
    keys: Option<PathBuf>,

    /// Read keys from MPESA_PUBLIC_KEY and MPESA_API_KEY instead of a key store.
    #[arg(long)]
    keys_from_env: bool,

    /// `production`, anything else means sandbox. Overrides the config.
    #[arg(short, long)]
    environment: Option<String>,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// c2b, b2c, b2b, reversal or status
    kind: TransactionKind,

    /// JSON file holding the `input_*` fields.
    query: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init(args.log_dir.as_deref());

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(keys) = args.keys {
        config = config.with_keys_path(keys);
    }
    if let Some(selector) = &args.environment {
        config = config.with_environment(Environment::from_selector(selector));
    }

    let client = if args.keys_from_env {
        let credentials = Credentials::from_env().context("failed to read keys from environment")?;
        Client::from_config_with_credentials(&config, credentials)
    } else {
        Client::from_config(&config)
    }
    .context("failed to build client")?;

    let raw = std::fs::read_to_string(&args.query)
        .with_context(|| format!("failed to read query {}", args.query.display()))?;
    let mut query = match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => map,
        _ => bail!("query file must contain a JSON object"),
    };
    fill_conversation_id(&mut query);

    let response = client.dispatch(args.kind, &query).await?;
    let code = response_code(&response).unwrap_or("<none>");
    let description = response_desc(&response).unwrap_or("");
    if is_success(&response) {
        info!(kind = %args.kind, code, description, "transaction accepted");
    } else {
        warn!(kind = %args.kind, code, description, "transaction not accepted");
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// The API wants a unique conversation id per call; generate one if the query has none.
fn fill_conversation_id(query: &mut TransactionQuery) {
    query
        .entry(THIRD_PARTY_CONVERSATION_ID)
        .or_insert_with(|| Value::String(Uuid::new_v4().simple().to_string()));
}
