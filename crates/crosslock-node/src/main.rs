//! crosslock-node — the Crosslock escrow-core node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the main loop: apply inbound transactions against the engine

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crosslock_core::types::{AccountId, Timestamp};
use crosslock_rpc::server::RpcServerState;
use crosslock_rpc::RpcServer;
use crosslock_state::{apply_genesis, GenesisParams, StateDb, SwapEngine};

#[derive(Parser, Debug)]
#[command(
    name = "crosslock-node",
    version,
    about = "Crosslock node — the escrow core for cross-chain atomic swaps"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.crosslock/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only required on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crosslock=debug".parse().expect("static filter")),
        )
        .init();

    let args = Args::parse();
    info!("Crosslock node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    if db.get_config().map(|c| c.is_none()).unwrap_or(true) {
        info!("fresh database — applying genesis");
        let params = load_or_generate_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&db, &params).context("applying genesis")?;
    } else {
        info!("existing database found — skipping genesis");
    }

    // ── State engine ──────────────────────────────────────────────────────────
    // Share the same DB handle — sled uses an Arc internally so this is safe.
    let engine = SwapEngine::new(Arc::clone(&db));

    // ── Inbound transaction queue ─────────────────────────────────────────────
    let (tx_sender, mut tx_receiver) =
        tokio::sync::mpsc::channel::<crosslock_core::transaction::Transaction>(512);

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        tx_sender: Some(tx_sender),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Main loop: apply transactions at ledger time ──────────────────────────
    info!("node ready");
    while let Some(tx) = tx_receiver.recv().await {
        match engine.apply(&tx, now_ms()) {
            Ok(events) => {
                for event in &events {
                    info!(tx_id = %tx.tx_id, kind = event.kind(), "event emitted");
                }
            }
            Err(e) => warn!(tx_id = %tx.tx_id, code = e.code(), error = %e, "transaction rejected"),
        }
    }

    Ok(())
}

/// Milliseconds since the Unix epoch, the node's ledger clock.
fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as u64
}

/// Load genesis parameters from a JSON file, or generate an ephemeral setup
/// if no path is given.
///
/// # Warning
/// Ephemeral genesis seeds a random admin and no balances — usable only to
/// poke at a local node. Real deployments must supply `--genesis-params`.
fn load_or_generate_genesis_params(
    path: Option<&Path>,
) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading genesis params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing genesis params JSON");
    }
    warn!("No --genesis-params provided. Generating an ephemeral admin — DO NOT USE IN PRODUCTION.");
    Ok(GenesisParams {
        admin: AccountId::from_bytes(rand::random::<[u8; 32]>()),
        rescue_delay_ms: None,
        min_safety_deposit: None,
        allocations: vec![],
    })
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
