use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crosslock_core::object::{Escrow, EscrowSide, EscrowStatus, Wallet};
use crosslock_core::transaction::Transaction;
use crosslock_core::types::{AccountId, ObjectId, OrderHash, Timestamp};
use crosslock_crypto::tx_id_from_body;
use crosslock_state::{stage_of, EscrowQuery, StateDb, WalletQuery};

use crate::api::CrosslockApiServer;
use crate::types::{RpcAccount, RpcConfig, RpcEscrow, RpcEvent, RpcProtocolInfo, RpcWallet};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    /// Optional sender to forward incoming transactions to the node pipeline.
    pub tx_sender: Option<tokio::sync::mpsc::Sender<Transaction>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers.
    /// Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

// ── DTO conversion ────────────────────────────────────────────────────────────

fn wallet_to_rpc(w: Wallet) -> RpcWallet {
    RpcWallet {
        wallet_id: w.id.to_hex(),
        order_hash: w.order_hash.to_hex(),
        maker: w.maker.to_b58(),
        balance: w.balance.units().to_string(),
        making_amount: w.making_amount.to_string(),
        taking_amount_start: w.taking_amount_start.to_string(),
        taking_amount_end: w.taking_amount_end.to_string(),
        auction_duration_ms: w.auction_duration_ms,
        hashlock: w.hashlock.to_hex(),
        allow_partial_fills: w.allow_partial_fills,
        parts_amount: w.parts_amount,
        last_used_index: w.last_used_index,
        safety_deposit: w.safety_deposit.to_string(),
        deployed_at: w.deployed_at,
        is_active: w.is_active,
        rescue_delay_ms: w.rescue_delay_ms,
    }
}

fn escrow_to_rpc(e: Escrow, now: Timestamp) -> RpcEscrow {
    let status = match e.status {
        EscrowStatus::Active => "Active".to_string(),
        EscrowStatus::Withdrawn { .. } => "Withdrawn".to_string(),
        EscrowStatus::Cancelled { .. } => "Cancelled".to_string(),
    };
    let stage = stage_of(&e, now);
    RpcEscrow {
        escrow_id: e.id.to_hex(),
        side: match e.side {
            EscrowSide::Src => "Src".into(),
            EscrowSide::Dst => "Dst".into(),
        },
        order_hash: e.order_hash.to_hex(),
        hashlock: e.hashlock.to_hex(),
        maker: e.maker.to_b58(),
        taker: e.taker.to_b58(),
        resolver: e.resolver.to_b58(),
        token_balance: e.token_balance.units().to_string(),
        native_balance: e.native_balance.units().to_string(),
        amount: e.amount.to_string(),
        safety_deposit: e.safety_deposit.to_string(),
        deployed_at: e.deployed_at,
        status,
        stage: stage.to_string(),
        parts_amount: e.merkle.as_ref().map(|m| m.parts_amount),
        used_indices: e.merkle.as_ref().map(|m| m.used_indices.clone()),
        secret_index: e.secret_index,
        rescue_delay_ms: e.rescue_delay_ms,
    }
}

// ── RPC implementation ────────────────────────────────────────────────────────

#[async_trait]
impl CrosslockApiServer for RpcServer {
    async fn get_account(&self, account_id: String) -> RpcResult<Option<RpcAccount>> {
        let id = AccountId::from_b58(&account_id)
            .map_err(|e| rpc_err(-32602, format!("invalid account id: {e}")))?;

        let account = self
            .state
            .db
            .get_account(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        Ok(account.map(|a| RpcAccount {
            account_id: a.account_id.to_b58(),
            token_balance: a.token_balance.to_string(),
            native_balance: a.native_balance.to_string(),
        }))
    }

    async fn get_wallet(&self, wallet_id: String) -> RpcResult<Option<RpcWallet>> {
        let id = ObjectId::from_hex(&wallet_id)
            .map_err(|e| rpc_err(-32602, format!("invalid object id: {e}")))?;

        let wallet = WalletQuery::new(&self.state.db)
            .get(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(wallet.map(wallet_to_rpc))
    }

    async fn get_escrow(&self, escrow_id: String) -> RpcResult<Option<RpcEscrow>> {
        let id = ObjectId::from_hex(&escrow_id)
            .map_err(|e| rpc_err(-32602, format!("invalid object id: {e}")))?;

        let escrow = EscrowQuery::new(&self.state.db)
            .get(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(escrow.map(|e| escrow_to_rpc(e, now_ms())))
    }

    async fn get_escrows_by_order(&self, order_hash: String) -> RpcResult<Vec<RpcEscrow>> {
        let bytes = hex::decode(&order_hash)
            .map_err(|e| rpc_err(-32602, format!("invalid order hash: {e}")))?;
        if bytes.len() != 32 {
            return Err(rpc_err(-32602, "order hash must be 32 bytes"));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);

        let escrows = self
            .state
            .db
            .iter_escrows_for_order(&OrderHash::from_bytes(arr))
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        let now = now_ms();
        Ok(escrows.into_iter().map(|e| escrow_to_rpc(e, now)).collect())
    }

    async fn get_wallets_by_maker(&self, maker: String) -> RpcResult<Vec<RpcWallet>> {
        let id = AccountId::from_b58(&maker)
            .map_err(|e| rpc_err(-32602, format!("invalid account id: {e}")))?;

        let wallets = self
            .state
            .db
            .iter_wallets_for_maker(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(wallets.into_iter().map(wallet_to_rpc).collect())
    }

    async fn get_events(&self, from_seq: u64, limit: u64) -> RpcResult<Vec<RpcEvent>> {
        let limit = (limit as usize).min(1_000);
        let records = self
            .state
            .db
            .events_since(from_seq, limit)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        records
            .into_iter()
            .map(|r| {
                let payload = serde_json::to_value(&r.event)
                    .map_err(|e| rpc_err(-32603, e.to_string()))?;
                Ok(RpcEvent {
                    seq: r.seq,
                    kind: r.event.kind().to_string(),
                    payload,
                })
            })
            .collect()
    }

    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let bytes =
            hex::decode(&tx_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;
        let tx: Transaction = bincode::deserialize(&bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        // The id must commit to the body; otherwise object ids would be
        // attacker-chosen.
        let expected = tx_id_from_body(&tx.body_bytes());
        if expected != tx.tx_id {
            return Err(rpc_err(-32602, "tx_id does not match transaction body"));
        }

        let sender = self
            .state
            .tx_sender
            .as_ref()
            .ok_or_else(|| rpc_err(-32603, "node does not accept transactions"))?;
        sender
            .send(tx.clone())
            .await
            .map_err(|e| rpc_err(-32603, format!("transaction queue closed: {e}")))?;

        Ok(tx.tx_id.to_hex())
    }

    async fn get_config(&self) -> RpcResult<RpcConfig> {
        let config = self
            .state
            .db
            .get_config()
            .map_err(|e| rpc_err(-32603, e.to_string()))?
            .ok_or_else(|| rpc_err(-32603, "protocol config missing"))?;

        Ok(RpcConfig {
            admin: config.admin.to_b58(),
            rescue_delay_ms: config.rescue_delay_ms,
            min_safety_deposit: config.min_safety_deposit.to_string(),
        })
    }

    async fn get_protocol_info(&self) -> RpcResult<RpcProtocolInfo> {
        Ok(RpcProtocolInfo::current())
    }
}
