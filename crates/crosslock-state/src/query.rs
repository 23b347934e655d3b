use crosslock_core::error::CrosslockError;
use crosslock_core::object::{Escrow, EscrowSide, EscrowStatus, Wallet};
use crosslock_core::types::{ObjectId, Timestamp};
use crosslock_timelock::stage::{dst_stage, rescue_start, src_stage};

use crate::db::StateDb;

/// Query helpers for escrow objects.
pub struct EscrowQuery<'a> {
    db: &'a StateDb,
}

impl<'a> EscrowQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// Fetch a single escrow by its id.
    pub fn get(&self, id: &ObjectId) -> Result<Option<Escrow>, CrosslockError> {
        self.db.get_escrow(id)
    }

    /// The stage name the escrow is in at `now`.
    pub fn stage_name(&self, id: &ObjectId, now: Timestamp) -> Result<&'static str, CrosslockError> {
        let escrow = self
            .db
            .get_escrow(id)?
            .ok_or_else(|| CrosslockError::ObjectNotFound(id.to_hex()))?;
        Ok(stage_of(&escrow, now))
    }

    /// True once the rescue window is open.
    pub fn is_rescuable(&self, id: &ObjectId, now: Timestamp) -> Result<bool, CrosslockError> {
        match self.db.get_escrow(id)? {
            Some(e) => Ok(now >= rescue_start(e.deployed_at, e.rescue_delay_ms)),
            None => Err(CrosslockError::ObjectNotFound(id.to_hex())),
        }
    }

    /// Human-readable summary of an escrow's state.
    pub fn describe(&self, id: &ObjectId, now: Timestamp) -> Result<String, CrosslockError> {
        let e = self
            .db
            .get_escrow(id)?
            .ok_or_else(|| CrosslockError::ObjectNotFound(id.to_hex()))?;

        let status_str = match &e.status {
            EscrowStatus::Active => match &e.merkle {
                Some(m) => format!(
                    "Active — {} of {} shares settled, stage {}",
                    m.used_indices.len(),
                    m.parts_amount,
                    stage_of(&e, now)
                ),
                None => format!("Active — stage {}", stage_of(&e, now)),
            },
            EscrowStatus::Withdrawn { withdrawn_at } => {
                format!("Withdrawn at {}", withdrawn_at)
            }
            EscrowStatus::Cancelled { cancelled_at } => {
                format!("Cancelled at {}", cancelled_at)
            }
        };

        let side = match e.side {
            EscrowSide::Src => "src",
            EscrowSide::Dst => "dst",
        };
        Ok(format!(
            "Escrow {} | {} | {} units | resolver: {} | {}",
            &id.to_hex()[..16],
            side,
            e.amount,
            e.resolver,
            status_str
        ))
    }
}

/// The stage name an already-loaded escrow is in at `now`, selecting the
/// schedule for its side. Shared by the query helpers and the RPC DTO layer.
pub fn stage_of(e: &Escrow, now: Timestamp) -> &'static str {
    match e.side {
        EscrowSide::Src => src_stage(&e.timelocks, e.deployed_at, now).name(),
        EscrowSide::Dst => dst_stage(&e.timelocks, e.deployed_at, now).name(),
    }
}

/// Query helpers for wallets.
pub struct WalletQuery<'a> {
    db: &'a StateDb,
}

impl<'a> WalletQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get(&self, id: &ObjectId) -> Result<Option<Wallet>, CrosslockError> {
        self.db.get_wallet(id)
    }

    /// Human-readable summary of a wallet's fill progress.
    pub fn describe(&self, id: &ObjectId) -> Result<String, CrosslockError> {
        let w = self
            .db
            .get_wallet(id)?
            .ok_or_else(|| CrosslockError::ObjectNotFound(id.to_hex()))?;

        let mode = if w.allow_partial_fills {
            format!("{} parts", w.parts_amount)
        } else {
            "single fill".to_string()
        };
        let status = if w.is_active { "active" } else { "closed" };
        Ok(format!(
            "Wallet {} | {} | {} of {} units remaining | maker: {} | {}",
            &id.to_hex()[..16],
            mode,
            w.balance.units(),
            w.making_amount,
            w.maker,
            status
        ))
    }
}
