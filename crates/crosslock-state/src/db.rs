use std::path::Path;

use crosslock_core::error::CrosslockError;
use crosslock_core::event::{Event, EventRecord};
use crosslock_core::object::{Account, Escrow, ProtocolConfig, Wallet};
use crosslock_core::types::{AccountId, ObjectId, OrderHash};

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   accounts — AccountId bytes → bincode(Account)
///   wallets  — ObjectId bytes  → bincode(Wallet)
///   escrows  — ObjectId bytes  → bincode(Escrow)
///   events   — u64 BE seq      → bincode(EventRecord)
///   meta     — utf8 key bytes  → raw bytes (protocol config)
pub struct StateDb {
    _db: sled::Db,
    accounts: sled::Tree,
    wallets: sled::Tree,
    escrows: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

const CONFIG_KEY: &str = "protocol_config";

fn storage_err(e: impl std::fmt::Display) -> CrosslockError {
    CrosslockError::Storage(e.to_string())
}

fn codec_err(e: impl std::fmt::Display) -> CrosslockError {
    CrosslockError::Serialization(e.to_string())
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CrosslockError> {
        let db = sled::open(path).map_err(storage_err)?;
        Self::with_db(db)
    }

    /// In-memory database for tests. Dropped with the process.
    pub fn temporary() -> Result<Self, CrosslockError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_err)?;
        Self::with_db(db)
    }

    fn with_db(db: sled::Db) -> Result<Self, CrosslockError> {
        let accounts = db.open_tree("accounts").map_err(storage_err)?;
        let wallets = db.open_tree("wallets").map_err(storage_err)?;
        let escrows = db.open_tree("escrows").map_err(storage_err)?;
        let events = db.open_tree("events").map_err(storage_err)?;
        let meta = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self { _db: db, accounts, wallets, escrows, events, meta })
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    pub fn get_account(&self, id: &AccountId) -> Result<Option<Account>, CrosslockError> {
        match self.accounts.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_account(&self, account: &Account) -> Result<(), CrosslockError> {
        let bytes = bincode::serialize(account).map_err(codec_err)?;
        self.accounts
            .insert(account.account_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Wallets ──────────────────────────────────────────────────────────────

    pub fn get_wallet(&self, id: &ObjectId) -> Result<Option<Wallet>, CrosslockError> {
        match self.wallets.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_wallet(&self, wallet: &Wallet) -> Result<(), CrosslockError> {
        let bytes = bincode::serialize(wallet).map_err(codec_err)?;
        self.wallets
            .insert(wallet.id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn delete_wallet(&self, id: &ObjectId) -> Result<(), CrosslockError> {
        self.wallets.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    /// All wallets published by `maker`. Full scan; the wallet tree stays
    /// small because rescue deletes abandoned objects.
    pub fn iter_wallets_for_maker(
        &self,
        maker: &AccountId,
    ) -> Result<Vec<Wallet>, CrosslockError> {
        let mut out = Vec::new();
        for item in self.wallets.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let wallet: Wallet = bincode::deserialize(&bytes).map_err(codec_err)?;
            if &wallet.maker == maker {
                out.push(wallet);
            }
        }
        Ok(out)
    }

    // ── Escrows ──────────────────────────────────────────────────────────────

    pub fn get_escrow(&self, id: &ObjectId) -> Result<Option<Escrow>, CrosslockError> {
        match self.escrows.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_escrow(&self, escrow: &Escrow) -> Result<(), CrosslockError> {
        let bytes = bincode::serialize(escrow).map_err(codec_err)?;
        self.escrows
            .insert(escrow.id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn delete_escrow(&self, id: &ObjectId) -> Result<(), CrosslockError> {
        self.escrows.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    /// Both legs of an order: every escrow bound to `order_hash`.
    pub fn iter_escrows_for_order(
        &self,
        order_hash: &OrderHash,
    ) -> Result<Vec<Escrow>, CrosslockError> {
        let mut out = Vec::new();
        for item in self.escrows.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let escrow: Escrow = bincode::deserialize(&bytes).map_err(codec_err)?;
            if &escrow.order_hash == order_hash {
                out.push(escrow);
            }
        }
        Ok(out)
    }

    /// True if any object (wallet or escrow) occupies `id`.
    pub fn object_exists(&self, id: &ObjectId) -> bool {
        self.wallets.contains_key(id.as_bytes()).unwrap_or(false)
            || self.escrows.contains_key(id.as_bytes()).unwrap_or(false)
    }

    // ── Event log ────────────────────────────────────────────────────────────

    /// Append an event, assigning the next sequence number. Returns the
    /// assigned seq.
    pub fn append_event(&self, event: &Event) -> Result<u64, CrosslockError> {
        let seq = match self.events.last().map_err(storage_err)? {
            Some((key, _)) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&key);
                u64::from_be_bytes(arr) + 1
            }
            None => 0,
        };
        let record = EventRecord { seq, event: event.clone() };
        let bytes = bincode::serialize(&record).map_err(codec_err)?;
        self.events
            .insert(seq.to_be_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(seq)
    }

    /// Events with `seq >= from_seq`, oldest first, at most `limit`.
    pub fn events_since(
        &self,
        from_seq: u64,
        limit: usize,
    ) -> Result<Vec<EventRecord>, CrosslockError> {
        let mut out = Vec::new();
        for item in self.events.range(from_seq.to_be_bytes()..) {
            if out.len() >= limit {
                break;
            }
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(codec_err)?);
        }
        Ok(out)
    }

    pub fn event_count(&self) -> u64 {
        self.events.len() as u64
    }

    // ── Protocol config ──────────────────────────────────────────────────────

    pub fn get_config(&self) -> Result<Option<ProtocolConfig>, CrosslockError> {
        match self.meta.get(CONFIG_KEY.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_config(&self, config: &ProtocolConfig) -> Result<(), CrosslockError> {
        let bytes = bincode::serialize(config).map_err(codec_err)?;
        self.meta
            .insert(CONFIG_KEY.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), CrosslockError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}
