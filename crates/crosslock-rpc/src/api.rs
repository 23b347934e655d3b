use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcAccount, RpcConfig, RpcEscrow, RpcEvent, RpcProtocolInfo, RpcWallet};

/// Crosslock JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "crosslock_" via `namespace`.
#[rpc(server, namespace = "crosslock")]
pub trait CrosslockApi {
    /// Get the account book entry for a base-58 account id.
    #[method(name = "getAccount")]
    async fn get_account(&self, account_id: String) -> RpcResult<Option<RpcAccount>>;

    /// Get a wallet by hex object id.
    #[method(name = "getWallet")]
    async fn get_wallet(&self, wallet_id: String) -> RpcResult<Option<RpcWallet>>;

    /// Get an escrow by hex object id, including its current stage.
    #[method(name = "getEscrow")]
    async fn get_escrow(&self, escrow_id: String) -> RpcResult<Option<RpcEscrow>>;

    /// List every escrow bound to a hex order hash (both legs of the swap).
    #[method(name = "getEscrowsByOrder")]
    async fn get_escrows_by_order(&self, order_hash: String) -> RpcResult<Vec<RpcEscrow>>;

    /// List wallets published by a base-58 maker account.
    #[method(name = "getWalletsByMaker")]
    async fn get_wallets_by_maker(&self, maker: String) -> RpcResult<Vec<RpcWallet>>;

    /// Page through the event log. Watchers poll this to drive the
    /// counterparty chain.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: u64) -> RpcResult<Vec<RpcEvent>>;

    /// Submit a transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the TxId hex on acceptance into the queue.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String>;

    /// Current protocol configuration (admin, rescue delay, deposit floor).
    #[method(name = "getConfig")]
    async fn get_config(&self) -> RpcResult<RpcConfig>;

    /// Static protocol constants.
    #[method(name = "getProtocolInfo")]
    async fn get_protocol_info(&self) -> RpcResult<RpcProtocolInfo>;
}
