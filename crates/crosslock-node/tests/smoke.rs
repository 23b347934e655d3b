//! End-to-end smoke test for crosslock-node.
//!
//! Starts a real node process with a fresh genesis, submits transactions via
//! JSON-RPC, and drives a full source-side swap: fund a wallet, draw it into
//! an escrow, reveal the secret, and verify balances and the event log.
//!
//! Run with:
//!   cargo test -p crosslock-node --test smoke

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

// ── Node lifecycle ────────────────────────────────────────────────────────────

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

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_call(
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
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "crosslock_getProtocolInfo",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

async fn get_token_balance(client: &reqwest::Client, url: &str, account_id: &str) -> u128 {
    let result =
        rpc_call(client, url, "crosslock_getAccount", serde_json::json!([account_id])).await;
    if result.is_null() {
        return 0;
    }
    result["token_balance"]
        .as_str()
        .unwrap()
        .parse()
        .expect("parse balance")
}

async fn send_tx(client: &reqwest::Client, url: &str, tx: &Transaction) -> String {
    let bytes = bincode::serialize(tx).expect("serialize tx");
    let tx_hex = hex::encode(bytes);
    let result =
        rpc_call(client, url, "crosslock_sendTransaction", serde_json::json!([tx_hex])).await;
    result.as_str().expect("tx_id string").to_string()
}

// ── Transaction builder ───────────────────────────────────────────────────────

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

/// A schedule with sub-second withdrawal offsets so the test reaches the
/// public window after a short sleep, and far-off cancellation offsets so
/// nothing expires mid-test.
fn fast_timelocks() -> Timelocks {
    Timelocks {
        src_withdrawal: 300,
        src_public_withdrawal: 500,
        src_cancellation: 40 * 60_000,
        src_public_cancellation: 50 * 60_000,
        dst_withdrawal: 200,
        dst_public_withdrawal: 400,
        dst_cancellation: 30 * 60_000,
    }
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_wallet_escrow_withdraw() {
    // ── 1. Prepare temp dir and genesis params ────────────────────────────────
    let data_dir =
        std::env::temp_dir().join(format!("crosslock_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let maker = AccountId::from_bytes([0x11; 32]);
    let resolver = AccountId::from_bytes([0x22; 32]);
    let admin = AccountId::from_bytes([0xAD; 32]);

    let params = GenesisParams {
        admin,
        rescue_delay_ms: None,
        min_safety_deposit: None,
        allocations: vec![
            GenesisAllocation { account: maker.clone(), token: 2 * GIGA, native: GIGA },
            GenesisAllocation { account: resolver.clone(), token: 0, native: GIGA },
        ],
    };
    let params_path = data_dir.join("genesis-params.json");
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
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

    // ── 3. Wait for RPC ready ─────────────────────────────────────────────────
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "crosslock-node did not become ready within 20 seconds"
    );

    // ── 4. Verify genesis balances ────────────────────────────────────────────
    let maker_b58 = maker.to_b58();
    let resolver_b58 = resolver.to_b58();
    assert_eq!(get_token_balance(&http, &rpc_url, &maker_b58).await, 2 * GIGA);
    assert_eq!(get_token_balance(&http, &rpc_url, &resolver_b58).await, 0);

    // ── 5. Maker funds a wallet ───────────────────────────────────────────────
    let secret = [0x42u8; 32];
    let hashlock = hashlock_of(&secret);

    let wallet_tx = build_tx(
        &maker,
        Action::CreateWallet {
            order_hash: OrderHash::from_bytes([0x01; 32]),
            making_amount: GIGA,
            taking_amount_start: GIGA,
            taking_amount_end: GIGA,
            auction_duration_ms: 600_000,
            hashlock: hashlock.clone(),
            allow_partial_fills: false,
            parts_amount: 0,
            safety_deposit: 100_000_000,
            timelocks: fast_timelocks(),
        },
    );
    let wallet_id_hex = send_tx(&http, &rpc_url, &wallet_tx).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(get_token_balance(&http, &rpc_url, &maker_b58).await, GIGA);
    let wallet = rpc_call(&http, &rpc_url, "crosslock_getWallet", serde_json::json!([wallet_id_hex])).await;
    assert_eq!(wallet["is_active"], true);
    assert_eq!(wallet["balance"], GIGA.to_string());

    // ── 6. Resolver drains the wallet into a source escrow ────────────────────
    let escrow_tx = build_tx(
        &resolver,
        Action::CreateEscrowSrc {
            wallet_id: crosslock_core::types::ObjectId::from_hex(&wallet_id_hex).unwrap(),
            secret_hashlock: hashlock,
            secret_index: 0,
            merkle_proof: vec![],
            taker: resolver.clone(),
            amount: GIGA,
            taking_amount: GIGA,
            safety_deposit: 100_000_000,
            timelocks: fast_timelocks(),
        },
    );
    let escrow_id_hex = send_tx(&http, &rpc_url, &escrow_tx).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    let escrow = rpc_call(&http, &rpc_url, "crosslock_getEscrow", serde_json::json!([escrow_id_hex])).await;
    assert_eq!(escrow["status"], "Active");
    assert_eq!(escrow["side"], "Src");
    assert_eq!(escrow["token_balance"], GIGA.to_string());

    let wallet = rpc_call(&http, &rpc_url, "crosslock_getWallet", serde_json::json!([wallet_id_hex])).await;
    assert_eq!(wallet["is_active"], false, "drained wallet deactivates");

    // ── 7. Resolver reveals the secret and settles ────────────────────────────
    // The sleeps above already put us past src_public_withdrawal (500 ms).
    let withdraw_tx = build_tx(
        &resolver,
        Action::Withdraw {
            escrow_id: crosslock_core::types::ObjectId::from_hex(&escrow_id_hex).unwrap(),
            secret: secret.to_vec(),
            secret_index: None,
            merkle_proof: vec![],
        },
    );
    send_tx(&http, &rpc_url, &withdraw_tx).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    let escrow = rpc_call(&http, &rpc_url, "crosslock_getEscrow", serde_json::json!([escrow_id_hex])).await;
    assert_eq!(escrow["status"], "Withdrawn");
    assert_eq!(escrow["token_balance"], "0");
    assert_eq!(escrow["native_balance"], "0");

    // Principal reached the taker (the resolver).
    assert_eq!(get_token_balance(&http, &rpc_url, &resolver_b58).await, GIGA);

    // ── 8. The event log tells the whole story ────────────────────────────────
    let events = rpc_call(&http, &rpc_url, "crosslock_getEvents", serde_json::json!([0, 100])).await;
    let kinds: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["WalletCreated", "EscrowCreated", "EscrowWithdrawn"]);
}
