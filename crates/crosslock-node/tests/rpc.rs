//! RPC surface tests for crosslock-node.
//!
//! Boots one node and exercises the query methods and the submission
//! validation paths that the smoke test does not cover.
//!
//! Run with:
//!   cargo test -p crosslock-node --test rpc

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crosslock_core::object::Timelocks;
use crosslock_core::transaction::{Action, Transaction};
use crosslock_core::types::{AccountId, OrderHash, TxId};
use crosslock_crypto::{hashlock_of, tx_id_from_body};
use crosslock_state::{GenesisAllocation, GenesisParams};

const GIGA: u128 = 1_000_000_000;

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Raw call that returns the full JSON-RPC envelope, errors included.
async fn rpc_raw(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    resp.json().await.expect("parse RPC JSON")
}

async fn rpc_ok(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let json = rpc_raw(client, url, method, params).await;
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let body = serde_json::json!({
            "jsonrpc": "2.0", "method": "crosslock_getProtocolInfo", "params": [], "id": 1
        });
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

fn build_tx(caller: &AccountId, action: Action) -> Transaction {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let mut tx = Transaction {
        tx_id: TxId::from_bytes([0u8; 32]),
        caller: caller.clone(),
        submitted_at: ts,
        action,
    };
    tx.tx_id = tx_id_from_body(&tx.body_bytes());
    tx
}

fn slow_timelocks() -> Timelocks {
    Timelocks {
        src_withdrawal: 5 * 60_000,
        src_public_withdrawal: 10 * 60_000,
        src_cancellation: 15 * 60_000,
        src_public_cancellation: 20 * 60_000,
        dst_withdrawal: 4 * 60_000,
        dst_public_withdrawal: 9 * 60_000,
        dst_cancellation: 14 * 60_000,
    }
}

#[tokio::test]
async fn query_surface_and_submission_validation() {
    let data_dir = std::env::temp_dir().join(format!("crosslock_rpc_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let maker = AccountId::from_bytes([0x11; 32]);
    let admin = AccountId::from_bytes([0xAD; 32]);

    let params = GenesisParams {
        admin: admin.clone(),
        rescue_delay_ms: Some(3_600_000),
        min_safety_deposit: None,
        allocations: vec![GenesisAllocation {
            account: maker.clone(),
            token: 5 * GIGA,
            native: GIGA,
        }],
    };
    let params_path = data_dir.join("genesis-params.json");
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);
    let node_bin = env!("CARGO_BIN_EXE_crosslock-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",       data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",       &format!("127.0.0.1:{}", rpc_port),
            "--genesis-params", params_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn crosslock-node");
    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await);

    // ── Protocol info and config reflect genesis ──────────────────────────────
    let info = rpc_ok(&http, &rpc_url, "crosslock_getProtocolInfo", serde_json::json!([])).await;
    assert_eq!(info["protocol"], "Crosslock");
    assert_eq!(info["native_decimals"], 9);

    let config = rpc_ok(&http, &rpc_url, "crosslock_getConfig", serde_json::json!([])).await;
    assert_eq!(config["admin"], admin.to_b58());
    assert_eq!(config["rescue_delay_ms"], 3_600_000);

    // ── Unknown lookups return null, malformed ids an error ───────────────────
    let missing = rpc_ok(
        &http,
        &rpc_url,
        "crosslock_getWallet",
        serde_json::json!([hex::encode([9u8; 32])]),
    )
    .await;
    assert!(missing.is_null());

    let bad_id = rpc_raw(&http, &rpc_url, "crosslock_getEscrow", serde_json::json!(["zz"])).await;
    assert!(bad_id.get("error").is_some());

    // ── Submission validation ─────────────────────────────────────────────────
    let garbage = rpc_raw(
        &http,
        &rpc_url,
        "crosslock_sendTransaction",
        serde_json::json!(["nothex!"]),
    )
    .await;
    assert!(garbage.get("error").is_some());

    // A transaction whose id does not commit to its body is refused.
    let order_hash = OrderHash::from_bytes([0x07; 32]);
    let mut forged = build_tx(
        &maker,
        Action::CreateWallet {
            order_hash: order_hash.clone(),
            making_amount: GIGA,
            taking_amount_start: GIGA,
            taking_amount_end: GIGA,
            auction_duration_ms: 600_000,
            hashlock: hashlock_of(&[0x42u8; 32]),
            allow_partial_fills: false,
            parts_amount: 0,
            safety_deposit: 100_000_000,
            timelocks: slow_timelocks(),
        },
    );
    forged.tx_id = TxId::from_bytes([0xFF; 32]);
    let forged_hex = hex::encode(bincode::serialize(&forged).unwrap());
    let refused = rpc_raw(
        &http,
        &rpc_url,
        "crosslock_sendTransaction",
        serde_json::json!([forged_hex]),
    )
    .await;
    assert!(refused.get("error").is_some());
    assert!(
        refused["error"]["message"]
            .as_str()
            .unwrap()
            .contains("tx_id"),
        "rejection names the id mismatch"
    );

    // ── A valid wallet shows up in the by-maker and by-order listings ─────────
    let wallet_tx = build_tx(
        &maker,
        Action::CreateWallet {
            order_hash,
            making_amount: GIGA,
            taking_amount_start: GIGA,
            taking_amount_end: GIGA,
            auction_duration_ms: 600_000,
            hashlock: hashlock_of(&[0x42u8; 32]),
            allow_partial_fills: false,
            parts_amount: 0,
            safety_deposit: 100_000_000,
            timelocks: slow_timelocks(),
        },
    );
    let tx_hex = hex::encode(bincode::serialize(&wallet_tx).unwrap());
    let accepted = rpc_ok(
        &http,
        &rpc_url,
        "crosslock_sendTransaction",
        serde_json::json!([tx_hex]),
    )
    .await;
    assert_eq!(accepted.as_str().unwrap(), wallet_tx.tx_id.to_hex());
    tokio::time::sleep(Duration::from_millis(600)).await;

    let wallets = rpc_ok(
        &http,
        &rpc_url,
        "crosslock_getWalletsByMaker",
        serde_json::json!([maker.to_b58()]),
    )
    .await;
    let wallets = wallets.as_array().unwrap();
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0]["wallet_id"], wallet_tx.tx_id.to_hex());
    assert_eq!(wallets[0]["making_amount"], GIGA.to_string());

    // No escrows yet for this order.
    let escrows = rpc_ok(
        &http,
        &rpc_url,
        "crosslock_getEscrowsByOrder",
        serde_json::json!([hex::encode([0x07u8; 32])]),
    )
    .await;
    assert_eq!(escrows.as_array().unwrap().len(), 0);

    // ── Event log paging ──────────────────────────────────────────────────────
    let events = rpc_ok(&http, &rpc_url, "crosslock_getEvents", serde_json::json!([0, 10])).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["kind"], "WalletCreated");
    assert_eq!(events[0]["seq"], 0);

    let empty = rpc_ok(&http, &rpc_url, "crosslock_getEvents", serde_json::json!([1, 10])).await;
    assert_eq!(empty.as_array().unwrap().len(), 0);
}
