pub mod balance;
pub mod constants;
pub mod error;
pub mod event;
pub mod fill;
pub mod object;
pub mod transaction;
pub mod types;

pub use balance::{AssetKind, Balance, Native, Token};
pub use constants::*;
pub use error::CrosslockError;
pub use event::{Event, EventRecord};
pub use object::{
    Account, Escrow, EscrowSide, EscrowStatus, MerkleState, ProtocolConfig, Timelocks, Wallet,
};
pub use transaction::{Action, Transaction, TransactionBody};
pub use types::*;
