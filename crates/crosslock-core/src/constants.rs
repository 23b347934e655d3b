/// ─── Crosslock Protocol Constants ────────────────────────────────────────────
///
/// The escrow core for cross-chain atomic swaps.
///
/// All durations are milliseconds (the ledger clock reports ms since epoch);
/// all amounts are base units of the respective asset.

// ── Native gas asset ─────────────────────────────────────────────────────────

/// Decimal places of the ledger's native gas asset.
pub const NATIVE_DECIMALS: u32 = 9;

/// One whole unit of the native gas asset in base units.
pub const NATIVE_UNIT: u128 = 1_000_000_000;

// ── Safety deposits ──────────────────────────────────────────────────────────

/// Default floor for the safety deposit bound to an escrow: 0.1 native unit.
/// The admin can raise or lower this, but never to zero.
pub const DEFAULT_MIN_SAFETY_DEPOSIT: u128 = NATIVE_UNIT / 10;

// ── Rescue ───────────────────────────────────────────────────────────────────

/// Default rescue delay: 7 days after `deployed_at`, any caller may drain and
/// delete a still-active object. Snapshotted per object at creation; admin
/// updates never apply retroactively.
pub const DEFAULT_RESCUE_DELAY_MS: u64 = 7 * 24 * 3_600 * 1_000;

// ── Secrets & Merkle trees ───────────────────────────────────────────────────

/// Minimum accepted secret preimage length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound on `parts_amount` (N) for partial-fill orders. A tree for N
/// parts carries N+1 leaves.
pub const MAX_PARTS_AMOUNT: u64 = 256;

/// Upper bound on Merkle proof length. log2(MAX_PARTS_AMOUNT + 1) rounded up,
/// with slack for non-power-of-two trees.
pub const MAX_MERKLE_PROOF_LEN: usize = 16;
