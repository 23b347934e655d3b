use serde::{Deserialize, Serialize};

use crate::object::Timelocks;
use crate::types::{AccountId, Amount, Hashlock, ObjectId, OrderHash, SecretIndex, Timestamp, TxId};

// ── Action ───────────────────────────────────────────────────────────────────

/// Every state-changing operation of the escrow core is one of these
/// variants. One action per transaction; each handler is atomic.
///
/// Off-chain intent signatures are not verified here — the hosting ledger has
/// already authenticated `Transaction::caller` by the time a transaction
/// reaches the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Action {
    /// Maker funds a shared Wallet that resolvers can drain.
    CreateWallet {
        order_hash: OrderHash,
        /// Principal locked into the wallet, debited from the maker.
        making_amount: Amount,
        /// Dutch-auction reserve at creation time.
        taking_amount_start: Amount,
        /// Dutch-auction reserve once `auction_duration_ms` has elapsed.
        taking_amount_end: Amount,
        auction_duration_ms: u64,
        /// Single hashlock, or the Merkle root in partial-fill mode.
        hashlock: Hashlock,
        allow_partial_fills: bool,
        /// N; zero iff partial fills are disabled.
        parts_amount: u64,
        /// Full-order source-side safety deposit requirement.
        safety_deposit: Amount,
        timelocks: Timelocks,
    },

    /// Resolver drains a wallet slice into a source escrow.
    CreateEscrowSrc {
        wallet_id: ObjectId,
        /// In partial-fill mode the hash of the leaf's secret; otherwise the
        /// wallet's single hashlock.
        secret_hashlock: Hashlock,
        secret_index: SecretIndex,
        /// Sorted-pair Merkle proof for the leaf; empty in single-fill mode.
        merkle_proof: Vec<[u8; 32]>,
        taker: AccountId,
        /// Principal drained from the wallet into the escrow.
        amount: Amount,
        /// The resolver's destination-side offer, checked against the
        /// auction curve.
        taking_amount: Amount,
        /// Native-asset deposit bound to the escrow, debited from the caller.
        safety_deposit: Amount,
        timelocks: Timelocks,
    },

    /// Taker locks destination-side inventory against an order observed on
    /// the counterparty chain.
    CreateEscrowDst {
        order_hash: OrderHash,
        hashlock: Hashlock,
        maker: AccountId,
        amount: Amount,
        safety_deposit: Amount,
        timelocks: Timelocks,
        allow_partial_fills: bool,
        parts_amount: u64,
        /// Absolute cancellation time observed on the source chain. The
        /// destination escrow's own cancellation must not outlive it.
        src_cancellation_timestamp: Timestamp,
    },

    /// Reveal a secret and settle an escrow (fully, or one share in
    /// partial-fill mode).
    Withdraw {
        escrow_id: ObjectId,
        secret: Vec<u8>,
        /// Required for partial-fill destination escrows.
        secret_index: Option<SecretIndex>,
        merkle_proof: Vec<[u8; 32]>,
    },

    /// Return escrowed principal to its original contributor once the
    /// cancellation stages open.
    Cancel { escrow_id: ObjectId },

    /// Maker reclaims an undrained wallet remainder after the source
    /// cancellation offset.
    CancelWallet { wallet_id: ObjectId },

    /// After the object's rescue delay, anyone may drain and delete a
    /// still-active wallet or escrow.
    Rescue { object_id: ObjectId },

    /// Admin: change the rescue delay for objects created from now on.
    SetRescueDelay { rescue_delay_ms: u64 },

    /// Admin: change the safety-deposit floor for escrows created from now on.
    SetMinSafetyDeposit { min_safety_deposit: Amount },
}

// ── Transaction ──────────────────────────────────────────────────────────────

/// A fully-formed transaction as submitted to the engine.
///
/// `tx_id` is BLAKE3 of the canonical bincode serialization of the body
/// fields (everything except `tx_id` itself) and seeds the ids of any objects
/// the transaction publishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: TxId,
    /// The ledger-authenticated principal submitting this transaction.
    pub caller: AccountId,
    /// Client-side submission timestamp; engine decisions use the ledger
    /// clock, never this field.
    pub submitted_at: Timestamp,
    pub action: Action,
}

/// The body bytes hashed to produce `tx_id`.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub caller: &'a AccountId,
    pub submitted_at: Timestamp,
    pub action: &'a Action,
}

impl Transaction {
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            caller: &self.caller,
            submitted_at: self.submitted_at,
            action: &self.action,
        }
    }

    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("body serialization is infallible")
    }
}
