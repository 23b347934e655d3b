//! crosslock-state
//!
//! The persistent half of the protocol: a sled-backed state database holding
//! accounts, shared wallet/escrow objects and the event log, plus the
//! `SwapEngine` that applies one atomic transaction at a time against it.

pub mod db;
pub mod engine;
pub mod genesis;
pub mod query;

pub use db::StateDb;
pub use engine::SwapEngine;
pub use genesis::{apply_genesis, GenesisAllocation, GenesisParams};
pub use query::{stage_of, EscrowQuery, WalletQuery};
