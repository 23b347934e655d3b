//! Linear value.
//!
//! A [`Balance`] is a move-only claim on locked asset units: it cannot be
//! cloned or copied, splitting conserves the total, and the type is
//! `#[must_use]`, so a value coming out of [`Balance::split`] or
//! [`Balance::take_all`] cannot be ignored without a compiler warning.
//! Both ends of the lifecycle are crate-private: [`Balance::issue`] pairs
//! with the account-book debit in `Account::debit_*`, and
//! [`Balance::into_units`] with the credit in `Account::credit_*`. Outside
//! this crate a balance can only be split, joined, moved into an object,
//! credited back to an account, or destroyed provably empty — every point
//! where locked value enters or leaves circulation lives here and is
//! auditable. Rust cannot forbid dropping a local value outright, so the
//! guarantee is this narrow sink surface, not a compile-time drop check.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::error::CrosslockError;

/// Marker for the asset an amount is denominated in.
pub trait AssetKind {
    /// Short label used in diagnostics.
    const NAME: &'static str;
}

/// The traded asset locked as escrow principal.
#[derive(Debug)]
pub enum Token {}

impl AssetKind for Token {
    const NAME: &'static str = "token";
}

/// The ledger's native gas asset, used for safety deposits.
#[derive(Debug)]
pub enum Native {}

impl AssetKind for Native {
    const NAME: &'static str = "native";
}

/// A linear, move-only quantity of asset `K`. Deliberately neither `Clone`
/// nor `Copy`.
#[must_use = "a Balance carries locked value; credit it to an account, join it, or destroy_zero it"]
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Balance<K: AssetKind> {
    units: u128,
    #[serde(skip)]
    _kind: PhantomData<K>,
}

impl<K: AssetKind> Balance<K> {
    /// The empty balance.
    pub fn zero() -> Self {
        Self { units: 0, _kind: PhantomData }
    }

    /// Issue a balance of `units`. Crate-private: `Account::debit_token` /
    /// `debit_native` pair this with the account-book debit, and they are
    /// the only place value enters circulation.
    pub(crate) fn issue(units: u128) -> Self {
        Self { units, _kind: PhantomData }
    }

    pub fn units(&self) -> u128 {
        self.units
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Split `units` off into a new balance. The sum of the two is the
    /// original.
    pub fn split(&mut self, units: u128) -> Result<Balance<K>, CrosslockError> {
        if units > self.units {
            return Err(CrosslockError::InsufficientBalance {
                need: units,
                have: self.units,
            });
        }
        self.units -= units;
        Ok(Balance { units, _kind: PhantomData })
    }

    /// Merge `other` into this balance, consuming it.
    pub fn join(&mut self, other: Balance<K>) {
        self.units += other.units;
    }

    /// Drain the full balance, leaving zero behind.
    pub fn take_all(&mut self) -> Balance<K> {
        let units = self.units;
        self.units = 0;
        Balance { units, _kind: PhantomData }
    }

    /// Consume an empty balance. Fails if any units remain.
    pub fn destroy_zero(self) -> Result<(), CrosslockError> {
        if self.units != 0 {
            return Err(CrosslockError::ResidualBalance { units: self.units });
        }
        Ok(())
    }

    /// Consume the balance and surrender its units. Crate-private: the
    /// account book's credit methods are the only callers, so retirement
    /// stays in one audited place.
    pub(crate) fn into_units(self) -> u128 {
        self.units
    }
}
