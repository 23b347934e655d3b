//! crosslock-rpc
//!
//! JSON-RPC 2.0 server for Crosslock nodes.
//!
//! Namespace: "crosslock"
//! Methods:
//!   crosslock_getAccount        — account book entry
//!   crosslock_getWallet         — wallet object by id
//!   crosslock_getEscrow         — escrow object by id, with live stage
//!   crosslock_getEscrowsByOrder — both legs of an order
//!   crosslock_getWalletsByMaker — wallets published by a maker
//!   crosslock_getEvents         — page through the event log
//!   crosslock_sendTransaction   — submit a transaction (hex-encoded bincode)
//!   crosslock_getConfig         — live protocol configuration
//!   crosslock_getProtocolInfo   — static protocol constants

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcAccount, RpcConfig, RpcEscrow, RpcEvent, RpcProtocolInfo, RpcWallet};
