//! sigwait: block until a submitted ledger transaction is confirmed.
//!
//! ```text
//! signature ──▶ LedgerClient ──┬─ signatureSubscribe (WebSocket push)
//!                              └─ getSignatureStatuses (HTTP poll)
//!                                        │
//!                  first decisive vote ◀─┘ or deadline
//! ```
//!
//! Exit codes: 0 confirmed, 1 rejected or failed to start, 2 timed out.

use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

use sigwait::blockchain::{Commitment, LedgerClient, Signature};
use sigwait::config::validation::validate_config;
use sigwait::config::{load_config, ConfigError, SigwaitConfig};
use sigwait::confirmation::{Confirmation, ConfirmationError, ConfirmationWaiter};
use sigwait::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "sigwait")]
#[command(about = "Wait for a ledger transaction signature to be confirmed", long_about = None)]
struct Cli {
    /// Transaction signature (base58)
    signature: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overall deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Commitment level for the subscription (e.g. processed, confirmed, finalized)
    #[arg(long)]
    commitment: Option<String>,

    /// Pause between status polls in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Rely on the subscription only
    #[arg(long)]
    no_poll: bool,

    /// JSON-RPC HTTP endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// WebSocket pubsub endpoint
    #[arg(long)]
    ws_url: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut SigwaitConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.confirmation.timeout_ms = timeout_ms;
        }
        if let Some(commitment) = &self.commitment {
            config.confirmation.commitment = Commitment::new(commitment.as_str());
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.confirmation.poll_interval_ms = poll_interval_ms;
        }
        if self.no_poll {
            config.confirmation.polling_enabled = false;
        }
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc.http_url = rpc_url.clone();
        }
        if let Some(ws_url) = &self.ws_url {
            config.rpc.ws_url = ws_url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SigwaitConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("sigwait v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let signature: Signature = cli.signature.parse()?;

    tracing::info!(
        signature = %signature,
        rpc_url = %config.rpc.http_url,
        ws_url = %config.rpc.ws_url,
        timeout_ms = config.confirmation.timeout_ms,
        commitment = %config.confirmation.commitment,
        polling = config.confirmation.polling_enabled,
        "Configuration loaded"
    );

    let client = LedgerClient::connect(config.rpc.clone()).await?;
    let waiter = ConfirmationWaiter::new(client, &config.confirmation);

    let (summary, code) = summarize(&signature, waiter.wait(&signature).await)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(code)
}

/// JSON summary and exit code for the outcome of a wait.
fn summarize(
    signature: &Signature,
    result: Result<Confirmation, ConfirmationError>,
) -> Result<(Value, ExitCode), Box<dyn std::error::Error>> {
    let (mut summary, code) = match result {
        Ok(confirmation) => {
            let code = match confirmation {
                Confirmation::Confirmed(_) => ExitCode::SUCCESS,
                Confirmation::TimedOut => ExitCode::from(2),
            };
            (serde_json::to_value(&confirmation)?, code)
        }
        Err(ConfirmationError::Rejected { error, .. }) => (
            json!({ "outcome": "rejected", "error": error }),
            ExitCode::from(1),
        ),
        Err(e) => return Err(e.into()),
    };
    summary["signature"] = json!(signature);
    Ok((summary, code))
}
