use serde::{Deserialize, Serialize};

/// JSON-serializable account summary. Amounts are u128 rendered as strings
/// to avoid JSON precision loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAccount {
    pub account_id: String,
    pub token_balance: String,
    pub native_balance: String,
}

/// Wallet summary returned by `crosslock_getWallet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcWallet {
    pub wallet_id: String,
    pub order_hash: String,
    pub maker: String,
    pub balance: String,
    pub making_amount: String,
    pub taking_amount_start: String,
    pub taking_amount_end: String,
    pub auction_duration_ms: u64,
    pub hashlock: String,
    pub allow_partial_fills: bool,
    pub parts_amount: u64,
    pub last_used_index: Option<u64>,
    pub safety_deposit: String,
    pub deployed_at: u64,
    pub is_active: bool,
    pub rescue_delay_ms: u64,
}

/// Escrow summary returned by `crosslock_getEscrow`. `stage` is evaluated
/// against the node's clock at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEscrow {
    pub escrow_id: String,
    pub side: String,
    pub order_hash: String,
    pub hashlock: String,
    pub maker: String,
    pub taker: String,
    pub resolver: String,
    pub token_balance: String,
    pub native_balance: String,
    pub amount: String,
    pub safety_deposit: String,
    pub deployed_at: u64,
    pub status: String,
    pub stage: String,
    pub parts_amount: Option<u64>,
    pub used_indices: Option<Vec<u64>>,
    pub secret_index: Option<u64>,
    pub rescue_delay_ms: u64,
}

/// One event-log entry. `payload` is the typed event rendered as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEvent {
    pub seq: u64,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Live protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub admin: String,
    pub rescue_delay_ms: u64,
    pub min_safety_deposit: String,
}

/// Static protocol constants returned by `crosslock_getProtocolInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcProtocolInfo {
    pub protocol: String,
    pub version: String,
    pub native_decimals: u32,
    pub default_rescue_delay_ms: u64,
    pub default_min_safety_deposit: String,
    pub max_parts_amount: u64,
}

impl RpcProtocolInfo {
    pub fn current() -> Self {
        use crosslock_core::constants::*;
        Self {
            protocol: "Crosslock".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            native_decimals: NATIVE_DECIMALS,
            default_rescue_delay_ms: DEFAULT_RESCUE_DELAY_MS,
            default_min_safety_deposit: DEFAULT_MIN_SAFETY_DEPOSIT.to_string(),
            max_parts_amount: MAX_PARTS_AMOUNT,
        }
    }
}
