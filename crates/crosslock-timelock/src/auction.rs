//! Dutch-auction reserve curve.
//!
//! A wallet publishes a taking amount that decays linearly from
//! `taking_amount_start` to `taking_amount_end` over the auction window. The
//! engine refuses any resolver offer strictly below the curve; price
//! *negotiation* happens off-chain and is out of scope here.

use crosslock_core::error::CrosslockError;
use crosslock_core::types::{Amount, Timestamp};

/// The reserve curve of one order. `start` and `end` amounts may be equal, in
/// which case the curve degenerates to a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DutchAuction {
    pub start_time: Timestamp,
    pub duration_ms: u64,
    pub taking_amount_start: Amount,
    pub taking_amount_end: Amount,
}

impl DutchAuction {
    /// The reserve taking amount for the full making amount at `now`,
    /// clamped to the auction window.
    pub fn price_at(&self, now: Timestamp) -> Amount {
        let end_time = self.start_time + self.duration_ms;
        let t = now.clamp(self.start_time, end_time);

        let elapsed = (t - self.start_time) as u128;
        let remaining = (end_time - t) as u128;
        let span = self.duration_ms as u128;
        if span == 0 {
            return self.taking_amount_end;
        }

        (self.taking_amount_start * remaining + self.taking_amount_end * elapsed) / span
    }

    /// The reserve for a partial fill of `amount` out of `making_amount`,
    /// rounded down.
    pub fn required_taking_amount(
        &self,
        amount: Amount,
        making_amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, CrosslockError> {
        if making_amount == 0 {
            return Err(CrosslockError::InvalidAmount("zero making amount".into()));
        }
        let full = self.price_at(now);
        full.checked_mul(amount)
            .map(|scaled| scaled / making_amount)
            .ok_or_else(|| CrosslockError::InvalidAmount("taking amount overflow".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auction() -> DutchAuction {
        DutchAuction {
            start_time: 1_000_000,
            duration_ms: 600_000,
            taking_amount_start: 2_000_000,
            taking_amount_end: 1_000_000,
        }
    }

    #[test]
    fn endpoints() {
        let a = auction();
        assert_eq!(a.price_at(a.start_time), 2_000_000);
        assert_eq!(a.price_at(a.start_time + a.duration_ms), 1_000_000);
    }

    #[test]
    fn midpoint_is_average() {
        let a = auction();
        assert_eq!(a.price_at(a.start_time + 300_000), 1_500_000);
    }

    #[test]
    fn clamps_outside_the_window() {
        let a = auction();
        assert_eq!(a.price_at(0), 2_000_000);
        assert_eq!(a.price_at(a.start_time + a.duration_ms * 10), 1_000_000);
    }

    #[test]
    fn curve_is_monotone_decreasing() {
        let a = auction();
        let mut prev = a.price_at(a.start_time);
        for step in 1..=60 {
            let p = a.price_at(a.start_time + step * 10_000);
            assert!(p <= prev, "curve rose at step {step}");
            prev = p;
        }
    }

    #[test]
    fn equal_endpoints_degenerate_to_constant() {
        let a = DutchAuction {
            taking_amount_end: 2_000_000,
            ..auction()
        };
        for step in 0..=10 {
            assert_eq!(a.price_at(a.start_time + step * 60_000), 2_000_000);
        }
    }

    #[test]
    fn partial_fill_reserve_is_pro_rata() {
        let a = auction();
        // Half the order at the midpoint: half of 1.5M.
        let r = a
            .required_taking_amount(500, 1_000, a.start_time + 300_000)
            .unwrap();
        assert_eq!(r, 750_000);
    }
}
