use serde::{Deserialize, Serialize};

use crate::balance::{Balance, Native, Token};
use crate::error::CrosslockError;
use crate::types::{AccountId, Amount, Hashlock, ObjectId, OrderHash, SecretIndex, Timestamp};

// ── Timelocks ────────────────────────────────────────────────────────────────

/// The seven stage offsets of an order, in milliseconds relative to the
/// holding object's `deployed_at`. Stage computation and schedule validation
/// live in `crosslock-timelock`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelocks {
    pub src_withdrawal: u64,
    pub src_public_withdrawal: u64,
    pub src_cancellation: u64,
    pub src_public_cancellation: u64,
    pub dst_withdrawal: u64,
    pub dst_public_withdrawal: u64,
    pub dst_cancellation: u64,
}

// ── Wallet ───────────────────────────────────────────────────────────────────

/// Source-side funding vessel. Published as a shared object by the maker and
/// drained by resolvers, possibly in several partial fills. Holds its locked
/// principal as a linear balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Wallet {
    pub id: ObjectId,
    pub order_hash: OrderHash,
    pub maker: AccountId,
    /// Remaining undrained principal.
    pub balance: Balance<Token>,
    /// Principal registered at creation. `balance` never exceeds this.
    pub making_amount: Amount,
    /// Dutch-auction reserve at `deployed_at`.
    pub taking_amount_start: Amount,
    /// Dutch-auction reserve once the auction window has elapsed.
    pub taking_amount_end: Amount,
    pub auction_duration_ms: u64,
    /// `keccak256(secret)` in single-fill mode; Merkle root of the secret
    /// tree in partial-fill mode.
    pub hashlock: Hashlock,
    pub allow_partial_fills: bool,
    /// N. Zero iff partial fills are disabled (the tree has N+1 leaves).
    pub parts_amount: u64,
    /// Highest secret index drained so far. Consumption is strictly
    /// increasing.
    pub last_used_index: Option<SecretIndex>,
    /// Full-order source-side safety deposit requirement; escrows bind a
    /// pro-rata share.
    pub safety_deposit: Amount,
    pub timelocks: Timelocks,
    pub deployed_at: Timestamp,
    pub is_active: bool,
    /// Rescue delay snapshotted at creation; admin updates are not
    /// retroactive.
    pub rescue_delay_ms: u64,
}

impl Wallet {
    /// Principal already drained into escrows.
    pub fn filled_amount(&self) -> Amount {
        self.making_amount - self.balance.units()
    }
}

// ── Escrow ───────────────────────────────────────────────────────────────────

/// Which half of the swap an escrow secures. The source side pays the taker
/// on withdrawal; the destination side pays the maker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowSide {
    Src,
    Dst,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Active,
    Withdrawn { withdrawn_at: Timestamp },
    Cancelled { cancelled_at: Timestamp },
}

/// Consumed-secret bookkeeping for a destination escrow settled in parts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleState {
    pub root: Hashlock,
    pub parts_amount: u64,
    /// Strictly additive; an index never appears twice.
    pub used_indices: Vec<SecretIndex>,
}

impl MerkleState {
    pub fn is_used(&self, index: SecretIndex) -> bool {
        self.used_indices.contains(&index)
    }

    pub fn mark_used(&mut self, index: SecretIndex) -> Result<(), CrosslockError> {
        if self.is_used(index) {
            return Err(CrosslockError::SecretAlreadyUsed { index });
        }
        self.used_indices.push(index);
        Ok(())
    }
}

/// A hashlock- and timelock-gated value lock, published as a shared object.
/// Mutation happens only through the engine's stage-gated transitions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Escrow {
    pub id: ObjectId,
    pub side: EscrowSide,
    pub order_hash: OrderHash,
    /// Single-fill: `keccak256(secret)`. Partial-fill source: the bound
    /// leaf's secret hash. Partial-fill destination: the Merkle root.
    pub hashlock: Hashlock,
    pub maker: AccountId,
    pub taker: AccountId,
    /// The resolver with exclusive rights during the private stages.
    pub resolver: AccountId,
    /// Remaining locked principal.
    pub token_balance: Balance<Token>,
    /// Remaining safety deposit in the native gas asset.
    pub native_balance: Balance<Native>,
    /// Principal registered at creation.
    pub amount: Amount,
    /// Safety deposit registered at creation.
    pub safety_deposit: Amount,
    pub timelocks: Timelocks,
    pub deployed_at: Timestamp,
    pub status: EscrowStatus,
    /// Present on destination escrows in partial-fill mode.
    pub merkle: Option<MerkleState>,
    /// Present on source escrows in partial-fill mode: the leaf index this
    /// escrow was drawn for.
    pub secret_index: Option<SecretIndex>,
    pub rescue_delay_ms: u64,
}

impl Escrow {
    pub fn is_active(&self) -> bool {
        self.status == EscrowStatus::Active
    }

    /// The party whose principal is returned on cancellation or rescue.
    pub fn refund_recipient(&self) -> &AccountId {
        match self.side {
            EscrowSide::Src => &self.maker,
            EscrowSide::Dst => &self.taker,
        }
    }

    /// The party paid on a successful withdrawal.
    pub fn withdraw_recipient(&self) -> &AccountId {
        match self.side {
            EscrowSide::Src => &self.taker,
            EscrowSide::Dst => &self.maker,
        }
    }
}

// ── Account ──────────────────────────────────────────────────────────────────

/// The ledger's account book entry for one principal. Plain totals; value in
/// flight between accounts and objects moves as linear [`Balance`] values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub token_balance: Amount,
    pub native_balance: Amount,
}

impl Account {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            token_balance: 0,
            native_balance: 0,
        }
    }

    /// Withdraw `units` of the traded asset from the account book as a linear
    /// balance. Pairs the book debit with `Balance::issue`, the only mint
    /// point.
    pub fn debit_token(&mut self, units: Amount) -> Result<Balance<Token>, CrosslockError> {
        if self.token_balance < units {
            return Err(CrosslockError::InsufficientBalance {
                need: units,
                have: self.token_balance,
            });
        }
        self.token_balance -= units;
        Ok(Balance::issue(units))
    }

    pub fn debit_native(&mut self, units: Amount) -> Result<Balance<Native>, CrosslockError> {
        if self.native_balance < units {
            return Err(CrosslockError::InsufficientBalance {
                need: units,
                have: self.native_balance,
            });
        }
        self.native_balance -= units;
        Ok(Balance::issue(units))
    }

    /// Absorb a linear balance back into the account book. The balance is
    /// drained into the book total and the emptied shell destroyed, so
    /// retirement runs through the linear type rather than an ordinary drop.
    pub fn credit_token(&mut self, mut balance: Balance<Token>) -> Result<(), CrosslockError> {
        self.token_balance += balance.take_all().into_units();
        balance.destroy_zero()
    }

    pub fn credit_native(&mut self, mut balance: Balance<Native>) -> Result<(), CrosslockError> {
        self.native_balance += balance.take_all().into_units();
        balance.destroy_zero()
    }
}

// ── ProtocolConfig ───────────────────────────────────────────────────────────

/// The administrative singleton. Updates apply to objects created afterwards
/// only — every wallet and escrow snapshots `rescue_delay_ms` at creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub admin: AccountId,
    pub rescue_delay_ms: u64,
    pub min_safety_deposit: Amount,
}
