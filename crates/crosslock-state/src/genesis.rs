//! Genesis seeding.
//!
//! Writes the protocol config and the initial account book directly into a
//! fresh `StateDb`, bypassing the transaction engine (genesis is the founding
//! document — there is nothing to validate against yet). Applied exactly
//! once; a second application is refused.

use serde::{Deserialize, Serialize};
use tracing::info;

use crosslock_core::constants::{DEFAULT_MIN_SAFETY_DEPOSIT, DEFAULT_RESCUE_DELAY_MS};
use crosslock_core::error::CrosslockError;
use crosslock_core::object::{Account, ProtocolConfig};
use crosslock_core::types::{AccountId, Amount};

use crate::db::StateDb;

/// One pre-funded account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub account: AccountId,
    /// Initial traded-asset balance.
    pub token: Amount,
    /// Initial native gas-asset balance.
    pub native: Amount,
}

/// Parameters for a fresh deployment, usually loaded from a JSON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Holder of the administrative capability.
    pub admin: AccountId,
    /// Override for the default 7-day rescue delay (ms).
    #[serde(default)]
    pub rescue_delay_ms: Option<u64>,
    /// Override for the default safety-deposit floor.
    #[serde(default)]
    pub min_safety_deposit: Option<Amount>,
    #[serde(default)]
    pub allocations: Vec<GenesisAllocation>,
}

/// Apply the genesis state to an empty `StateDb`. Returns the protocol
/// config that was written.
pub fn apply_genesis(
    db: &StateDb,
    params: &GenesisParams,
) -> Result<ProtocolConfig, CrosslockError> {
    if db.get_config()?.is_some() {
        return Err(CrosslockError::Storage(
            "genesis already applied to this database".into(),
        ));
    }

    let config = ProtocolConfig {
        admin: params.admin.clone(),
        rescue_delay_ms: params.rescue_delay_ms.unwrap_or(DEFAULT_RESCUE_DELAY_MS),
        min_safety_deposit: params
            .min_safety_deposit
            .unwrap_or(DEFAULT_MIN_SAFETY_DEPOSIT),
    };
    if config.rescue_delay_ms == 0 || config.min_safety_deposit == 0 {
        return Err(CrosslockError::InvalidAmount(
            "genesis config values must be non-zero".into(),
        ));
    }
    db.put_config(&config)?;
    info!(
        admin = %config.admin,
        rescue_delay_ms = config.rescue_delay_ms,
        min_safety_deposit = config.min_safety_deposit,
        "genesis: protocol config written"
    );

    for alloc in &params.allocations {
        let mut account = Account::new(alloc.account.clone());
        account.token_balance = alloc.token;
        account.native_balance = alloc.native;
        db.put_account(&account)?;
    }
    info!(accounts = params.allocations.len(), "genesis: account book seeded");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenesisParams {
        GenesisParams {
            admin: AccountId::from_bytes([0xAD; 32]),
            rescue_delay_ms: None,
            min_safety_deposit: None,
            allocations: vec![GenesisAllocation {
                account: AccountId::from_bytes([1u8; 32]),
                token: 1_000,
                native: 500,
            }],
        }
    }

    #[test]
    fn seeds_config_and_accounts() {
        let db = StateDb::temporary().unwrap();
        let config = apply_genesis(&db, &params()).unwrap();
        assert_eq!(config.rescue_delay_ms, DEFAULT_RESCUE_DELAY_MS);
        assert_eq!(config.min_safety_deposit, DEFAULT_MIN_SAFETY_DEPOSIT);

        let acc = db
            .get_account(&AccountId::from_bytes([1u8; 32]))
            .unwrap()
            .unwrap();
        assert_eq!(acc.token_balance, 1_000);
        assert_eq!(acc.native_balance, 500);
    }

    #[test]
    fn refuses_double_application() {
        let db = StateDb::temporary().unwrap();
        apply_genesis(&db, &params()).unwrap();
        assert!(apply_genesis(&db, &params()).is_err());
    }

    #[test]
    fn params_round_trip_through_json() {
        let p = params();
        let json = serde_json::to_string(&p).unwrap();
        let back: GenesisParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.admin, p.admin);
        assert_eq!(back.allocations.len(), 1);
    }
}
