//! Stage schedule.
//!
//! Each escrow carries seven offsets relative to its `deployed_at`; the
//! current wall-clock time selects exactly one stage per side, and the stage
//! plus the caller identity gates every transition. The cross-chain ordering
//! constraints guarantee that a resolver who reveals a secret on the
//! destination side still has time to claim on the source side.

use crosslock_core::error::CrosslockError;
use crosslock_core::object::Timelocks;
use crosslock_core::types::Timestamp;

/// Source-side stage at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrcStage {
    /// Before `src_withdrawal`: nothing may happen yet.
    FinalityLock,
    /// Only the recorded resolver may withdraw.
    ResolverExclusiveWithdraw,
    /// Anyone with a valid secret may withdraw.
    PublicWithdraw,
    /// Only the recorded resolver may cancel.
    ResolverExclusiveCancel,
    /// Anyone may cancel.
    PublicCancel,
}

impl SrcStage {
    pub fn name(&self) -> &'static str {
        match self {
            SrcStage::FinalityLock => "FinalityLock",
            SrcStage::ResolverExclusiveWithdraw => "ResolverExclusiveWithdraw",
            SrcStage::PublicWithdraw => "PublicWithdraw",
            SrcStage::ResolverExclusiveCancel => "ResolverExclusiveCancel",
            SrcStage::PublicCancel => "PublicCancel",
        }
    }
}

/// Destination-side stage. The destination has no public cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DstStage {
    FinalityLock,
    ResolverExclusiveWithdraw,
    PublicWithdraw,
    ResolverExclusiveCancel,
}

impl DstStage {
    pub fn name(&self) -> &'static str {
        match self {
            DstStage::FinalityLock => "FinalityLock",
            DstStage::ResolverExclusiveWithdraw => "ResolverExclusiveWithdraw",
            DstStage::PublicWithdraw => "PublicWithdraw",
            DstStage::ResolverExclusiveCancel => "ResolverExclusiveCancel",
        }
    }
}

/// Validate a schedule: every offset strictly positive and increasing within
/// its side, and each destination window strictly inside its source
/// counterpart.
pub fn validate(t: &Timelocks) -> Result<(), CrosslockError> {
    let src_ordered = 0 < t.src_withdrawal
        && t.src_withdrawal < t.src_public_withdrawal
        && t.src_public_withdrawal < t.src_cancellation
        && t.src_cancellation < t.src_public_cancellation;
    if !src_ordered {
        return Err(CrosslockError::InvalidTimelock(
            "source offsets must be strictly increasing".into(),
        ));
    }

    let dst_ordered = 0 < t.dst_withdrawal
        && t.dst_withdrawal < t.dst_public_withdrawal
        && t.dst_public_withdrawal < t.dst_cancellation;
    if !dst_ordered {
        return Err(CrosslockError::InvalidTimelock(
            "destination offsets must be strictly increasing".into(),
        ));
    }

    let cross_ordered = t.dst_withdrawal < t.src_withdrawal
        && t.dst_public_withdrawal < t.src_public_withdrawal
        && t.dst_cancellation < t.src_cancellation;
    if !cross_ordered {
        return Err(CrosslockError::InvalidTimelock(
            "each destination window must precede its source counterpart".into(),
        ));
    }
    Ok(())
}

/// The source-side stage at `now` for a schedule anchored at `deployed_at`.
pub fn src_stage(t: &Timelocks, deployed_at: Timestamp, now: Timestamp) -> SrcStage {
    if now < deployed_at + t.src_withdrawal {
        SrcStage::FinalityLock
    } else if now < deployed_at + t.src_public_withdrawal {
        SrcStage::ResolverExclusiveWithdraw
    } else if now < deployed_at + t.src_cancellation {
        SrcStage::PublicWithdraw
    } else if now < deployed_at + t.src_public_cancellation {
        SrcStage::ResolverExclusiveCancel
    } else {
        SrcStage::PublicCancel
    }
}

/// The destination-side stage at `now`.
pub fn dst_stage(t: &Timelocks, deployed_at: Timestamp, now: Timestamp) -> DstStage {
    if now < deployed_at + t.dst_withdrawal {
        DstStage::FinalityLock
    } else if now < deployed_at + t.dst_public_withdrawal {
        DstStage::ResolverExclusiveWithdraw
    } else if now < deployed_at + t.dst_cancellation {
        DstStage::PublicWithdraw
    } else {
        DstStage::ResolverExclusiveCancel
    }
}

/// The instant rescue opens for an object deployed at `deployed_at`.
pub fn rescue_start(deployed_at: Timestamp, rescue_delay_ms: u64) -> Timestamp {
    deployed_at + rescue_delay_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u64 = 60_000;

    fn schedule() -> Timelocks {
        // The canonical test schedule: src 5/10/15/20 min, dst 4m10s/9m10s/14m10s.
        Timelocks {
            src_withdrawal: 5 * MIN,
            src_public_withdrawal: 10 * MIN,
            src_cancellation: 15 * MIN,
            src_public_cancellation: 20 * MIN,
            dst_withdrawal: 4 * MIN + 10_000,
            dst_public_withdrawal: 9 * MIN + 10_000,
            dst_cancellation: 14 * MIN + 10_000,
        }
    }

    #[test]
    fn canonical_schedule_validates() {
        validate(&schedule()).unwrap();
    }

    #[test]
    fn rejects_unordered_source_offsets() {
        let mut t = schedule();
        t.src_public_withdrawal = t.src_withdrawal;
        assert!(validate(&t).is_err());

        let mut t = schedule();
        t.src_withdrawal = 0;
        assert!(validate(&t).is_err());
    }

    #[test]
    fn rejects_cross_chain_inversion() {
        let mut t = schedule();
        // Destination cancellation at or after source cancellation gives the
        // resolver no safe reveal window.
        t.dst_cancellation = t.src_cancellation;
        assert!(validate(&t).is_err());
    }

    #[test]
    fn src_stage_boundaries() {
        let t = schedule();
        let d = 1_000_000;

        assert_eq!(src_stage(&t, d, d), SrcStage::FinalityLock);
        assert_eq!(src_stage(&t, d, d + 5 * MIN - 1), SrcStage::FinalityLock);
        assert_eq!(
            src_stage(&t, d, d + 5 * MIN),
            SrcStage::ResolverExclusiveWithdraw
        );
        assert_eq!(src_stage(&t, d, d + 10 * MIN), SrcStage::PublicWithdraw);
        assert_eq!(
            src_stage(&t, d, d + 15 * MIN),
            SrcStage::ResolverExclusiveCancel
        );
        assert_eq!(src_stage(&t, d, d + 20 * MIN), SrcStage::PublicCancel);
        assert_eq!(src_stage(&t, d, d + 400 * MIN), SrcStage::PublicCancel);
    }

    #[test]
    fn dst_stage_boundaries() {
        let t = schedule();
        let d = 500;

        assert_eq!(dst_stage(&t, d, d), DstStage::FinalityLock);
        assert_eq!(
            dst_stage(&t, d, d + 4 * MIN + 10_000),
            DstStage::ResolverExclusiveWithdraw
        );
        assert_eq!(
            dst_stage(&t, d, d + 9 * MIN + 10_000),
            DstStage::PublicWithdraw
        );
        assert_eq!(
            dst_stage(&t, d, d + 14 * MIN + 10_000),
            DstStage::ResolverExclusiveCancel
        );
    }

    #[test]
    fn stages_never_regress() {
        // Walk the clock forward in 1s steps; the stage index must be
        // monotone and each stage's acceptance window contiguous.
        let t = schedule();
        let d = 42;
        let rank = |s: SrcStage| match s {
            SrcStage::FinalityLock => 0,
            SrcStage::ResolverExclusiveWithdraw => 1,
            SrcStage::PublicWithdraw => 2,
            SrcStage::ResolverExclusiveCancel => 3,
            SrcStage::PublicCancel => 4,
        };

        let mut prev = 0;
        for step in 0..(25 * 60) {
            let now = d + step * 1_000;
            let r = rank(src_stage(&t, d, now));
            assert!(r >= prev, "stage regressed at {now}");
            prev = r;
        }
        assert_eq!(prev, 4);
    }
}
