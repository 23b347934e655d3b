use thiserror::Error;

/// Every way a Crosslock transaction can abort.
///
/// The taxonomy is closed: clients match on the stable numeric code returned
/// by [`CrosslockError::code`], so variants are appended, never renumbered.
/// Aborts never leave partial effects — the engine stages all mutations and
/// commits only on success.
#[derive(Debug, Error)]
pub enum CrosslockError {
    // ── Parameter validation ─────────────────────────────────────────────────
    #[error("order hash must be 32 non-zero bytes")]
    InvalidOrderHash,

    #[error("hashlock must be 32 non-zero bytes")]
    InvalidHashlock,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("safety deposit below floor: need at least {min}, got {got}")]
    InvalidSafetyDeposit { min: u128, got: u128 },

    #[error("invalid timelock schedule: {0}")]
    InvalidTimelock(String),

    // ── Secrets & proofs ─────────────────────────────────────────────────────
    #[error("secret shorter than 32 bytes or hashlock mismatch")]
    InvalidSecret,

    #[error("merkle proof does not resolve to the committed root")]
    InvalidMerkleProof,

    #[error("secret index {index} already consumed")]
    SecretAlreadyUsed { index: u64 },

    #[error("invalid partial fill: {0}")]
    InvalidPartialFill(String),

    // ── Authorization & staging ──────────────────────────────────────────────
    #[error("caller is not permitted to act in the current stage")]
    Unauthorised,

    #[error("withdrawal not permitted in stage {stage}")]
    NotWithdrawable { stage: &'static str },

    #[error("cancellation not permitted in stage {stage}")]
    NotCancellable { stage: &'static str },

    #[error("escrow already withdrawn")]
    AlreadyWithdrawn,

    #[error("escrow already cancelled")]
    AlreadyCancelled,

    // ── Rescue ───────────────────────────────────────────────────────────────
    #[error("invalid time parameter")]
    InvalidTime,

    #[error("rescue delay not expired (rescue opens at {rescue_at})")]
    TimelockNotExpired { rescue_at: u64 },

    // ── Wallet funding ───────────────────────────────────────────────────────
    #[error("wallet is no longer active")]
    WalletInactive,

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    // ── Object lifecycle ─────────────────────────────────────────────────────
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("object already exists: {0}")]
    ObjectExists(String),

    #[error("cannot destroy a balance holding {units} units")]
    ResidualBalance { units: u128 },

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CrosslockError {
    /// Stable numeric abort code. Watchers and clients key on this, so the
    /// mapping never changes for an existing variant.
    pub fn code(&self) -> u32 {
        match self {
            CrosslockError::InvalidOrderHash => 1,
            CrosslockError::InvalidHashlock => 2,
            CrosslockError::InvalidAmount(_) => 3,
            CrosslockError::InvalidSafetyDeposit { .. } => 4,
            CrosslockError::InvalidTimelock(_) => 5,
            CrosslockError::InvalidSecret => 6,
            CrosslockError::InvalidMerkleProof => 7,
            CrosslockError::SecretAlreadyUsed { .. } => 8,
            CrosslockError::InvalidPartialFill(_) => 9,
            CrosslockError::Unauthorised => 10,
            CrosslockError::NotWithdrawable { .. } => 11,
            CrosslockError::NotCancellable { .. } => 12,
            CrosslockError::AlreadyWithdrawn => 13,
            CrosslockError::AlreadyCancelled => 14,
            CrosslockError::InvalidTime => 15,
            CrosslockError::TimelockNotExpired { .. } => 16,
            CrosslockError::WalletInactive => 17,
            CrosslockError::InsufficientBalance { .. } => 18,
            CrosslockError::ObjectNotFound(_) => 19,
            CrosslockError::ObjectExists(_) => 20,
            CrosslockError::ResidualBalance { .. } => 21,
            CrosslockError::Serialization(_) => 22,
            CrosslockError::Storage(_) => 23,
        }
    }
}
