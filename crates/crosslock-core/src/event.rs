use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount, Hashlock, ObjectId, OrderHash, SecretIndex, Timestamp};

/// Structured record emitted at every state transition. The persisted event
/// log is the only source of cross-chain synchronization for watchers, so the
/// schema is part of the wire contract. Timestamps are ledger-clock
/// milliseconds; 32-byte values are raw bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    WalletCreated {
        wallet_id: ObjectId,
        order_hash: OrderHash,
        maker: AccountId,
        initial_amount: Amount,
        created_at: Timestamp,
    },

    EscrowCreated {
        escrow_id: ObjectId,
        order_hash: OrderHash,
        hashlock: Hashlock,
        maker: AccountId,
        taker: AccountId,
        amount: Amount,
        safety_deposit: Amount,
        resolver: AccountId,
        created_at: Timestamp,
        is_merkle: bool,
        parts_amount: u64,
    },

    EscrowWithdrawn {
        escrow_id: ObjectId,
        order_hash: OrderHash,
        /// The revealed preimage. Public from this point on; watchers relay
        /// it to the counterparty chain.
        secret: Vec<u8>,
        withdrawn_by: AccountId,
        maker: AccountId,
        taker: AccountId,
        amount: Amount,
        withdrawn_at: Timestamp,
        merkle_index: Option<SecretIndex>,
    },

    EscrowCancelled {
        escrow_id: ObjectId,
        order_hash: OrderHash,
        maker: AccountId,
        taker: AccountId,
        cancelled_by: AccountId,
        amount: Amount,
        cancelled_at: Timestamp,
    },

    FundsRescued {
        escrow_id: ObjectId,
        rescuer: AccountId,
        principal_amount: Amount,
        deposit_amount: Amount,
    },

    WalletClosed {
        wallet_id: ObjectId,
        order_hash: OrderHash,
        maker: AccountId,
        refunded_amount: Amount,
        closed_at: Timestamp,
    },

    ConfigUpdated {
        admin: AccountId,
        rescue_delay_ms: u64,
        min_safety_deposit: Amount,
        updated_at: Timestamp,
    },
}

impl Event {
    /// Short kind tag, used in logs and RPC listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::WalletCreated { .. } => "WalletCreated",
            Event::EscrowCreated { .. } => "EscrowCreated",
            Event::EscrowWithdrawn { .. } => "EscrowWithdrawn",
            Event::EscrowCancelled { .. } => "EscrowCancelled",
            Event::FundsRescued { .. } => "FundsRescued",
            Event::WalletClosed { .. } => "WalletClosed",
            Event::ConfigUpdated { .. } => "ConfigUpdated",
        }
    }
}

/// One entry of the persistent event log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic log position, assigned at commit.
    pub seq: u64,
    pub event: Event,
}
