use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crosslock_core::constants::{MAX_MERKLE_PROOF_LEN, MAX_PARTS_AMOUNT, MIN_SECRET_LEN};
use crosslock_core::error::CrosslockError;
use crosslock_core::event::Event;
use crosslock_core::fill::{expected_index, fill_amount, proportional_deposit};
use crosslock_core::object::{
    Account, Escrow, EscrowSide, EscrowStatus, MerkleState, ProtocolConfig, Wallet,
};
use crosslock_core::transaction::{Action, Transaction};
use crosslock_core::types::{AccountId, ObjectId, SecretIndex, Timestamp};
use crosslock_crypto::keccak::{keccak256, verify_secret};
use crosslock_crypto::merkle::{leaf_hash, verify_proof};
use crosslock_crypto::object_id_from_tx;
use crosslock_timelock::auction::DutchAuction;
use crosslock_timelock::stage::{
    dst_stage, rescue_start, src_stage, validate as validate_timelocks, DstStage, SrcStage,
};

use crate::db::StateDb;

// ── Staged mutations ──────────────────────────────────────────────────────────

/// Account-book working set. Each account is loaded at most once per
/// transaction so that a caller who is also a recipient sees one coherent
/// entry, then written back exactly once at commit.
#[derive(Default)]
struct StagedAccounts(BTreeMap<AccountId, Account>);

impl StagedAccounts {
    fn entry(&mut self, db: &StateDb, id: &AccountId) -> Result<&mut Account, CrosslockError> {
        if !self.0.contains_key(id) {
            let account = db
                .get_account(id)?
                .unwrap_or_else(|| Account::new(id.clone()));
            self.0.insert(id.clone(), account);
        }
        Ok(self.0.get_mut(id).expect("entry inserted above"))
    }
}

/// All state changes staged by a handler before atomic commit.
#[derive(Default)]
struct StagedMutations {
    accounts: StagedAccounts,
    wallets: Vec<Wallet>,
    escrows: Vec<Escrow>,
    deleted_wallets: Vec<ObjectId>,
    deleted_escrows: Vec<ObjectId>,
    config: Option<ProtocolConfig>,
    events: Vec<Event>,
}

// ── SwapEngine ────────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Validates and applies one transaction at a time against the persistent
/// state database. Each `apply` call is atomic: every precondition is checked
/// against the pre-state, and mutations commit only after the whole action
/// has succeeded. On abort the state is untouched and the error carries a
/// stable numeric code.
pub struct SwapEngine {
    pub db: Arc<StateDb>,
}

impl SwapEngine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    /// Validate and apply a transaction at ledger time `now` (ms). Returns
    /// the events emitted by the transition.
    pub fn apply(&self, tx: &Transaction, now: Timestamp) -> Result<Vec<Event>, CrosslockError> {
        let mut staged = StagedMutations::default();
        let object_id = object_id_from_tx(&tx.tx_id);
        self.apply_action(&tx.caller, &tx.action, now, &object_id, &mut staged)?;

        // ── Commit ────────────────────────────────────────────────────────────
        for account in staged.accounts.0.values() {
            self.db.put_account(account)?;
        }
        for wallet in &staged.wallets {
            self.db.put_wallet(wallet)?;
        }
        for escrow in &staged.escrows {
            self.db.put_escrow(escrow)?;
        }
        for id in &staged.deleted_wallets {
            self.db.delete_wallet(id)?;
        }
        for id in &staged.deleted_escrows {
            self.db.delete_escrow(id)?;
        }
        if let Some(config) = &staged.config {
            self.db.put_config(config)?;
        }
        for event in &staged.events {
            let seq = self.db.append_event(event)?;
            info!(tx_id = %tx.tx_id, seq, kind = event.kind(), "applied transaction");
        }

        Ok(staged.events)
    }

    fn config(&self) -> Result<ProtocolConfig, CrosslockError> {
        self.db
            .get_config()?
            .ok_or_else(|| CrosslockError::Storage("protocol config missing (no genesis)".into()))
    }

    /// Reserve an object id for the transaction's published object.
    fn claim_object_id(&self, id: &ObjectId) -> Result<(), CrosslockError> {
        if self.db.object_exists(id) {
            return Err(CrosslockError::ObjectExists(id.to_hex()));
        }
        Ok(())
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn apply_action(
        &self,
        caller: &AccountId,
        action: &Action,
        now: Timestamp,
        object_id: &ObjectId,
        staged: &mut StagedMutations,
    ) -> Result<(), CrosslockError> {
        match action {
            // ── CreateWallet ──────────────────────────────────────────────────
            Action::CreateWallet {
                order_hash,
                making_amount,
                taking_amount_start,
                taking_amount_end,
                auction_duration_ms,
                hashlock,
                allow_partial_fills,
                parts_amount,
                safety_deposit,
                timelocks,
            } => {
                let config = self.config()?;

                if order_hash.is_zero() {
                    return Err(CrosslockError::InvalidOrderHash);
                }
                if hashlock.is_zero() {
                    return Err(CrosslockError::InvalidHashlock);
                }
                if *making_amount == 0 {
                    return Err(CrosslockError::InvalidAmount(
                        "making amount must be positive".into(),
                    ));
                }
                if *taking_amount_end == 0 || taking_amount_start < taking_amount_end {
                    return Err(CrosslockError::InvalidAmount(
                        "taking amount must decay to a positive reserve".into(),
                    ));
                }
                if *auction_duration_ms == 0 {
                    return Err(CrosslockError::InvalidTime);
                }
                if *safety_deposit < config.min_safety_deposit {
                    return Err(CrosslockError::InvalidSafetyDeposit {
                        min: config.min_safety_deposit,
                        got: *safety_deposit,
                    });
                }
                validate_partial_config(*allow_partial_fills, *parts_amount)?;
                validate_timelocks(timelocks)?;

                self.claim_object_id(object_id)?;
                let maker = staged.accounts.entry(&self.db, caller)?;
                let funding = maker.debit_token(*making_amount)?;

                staged.events.push(Event::WalletCreated {
                    wallet_id: object_id.clone(),
                    order_hash: order_hash.clone(),
                    maker: caller.clone(),
                    initial_amount: *making_amount,
                    created_at: now,
                });
                staged.wallets.push(Wallet {
                    id: object_id.clone(),
                    order_hash: order_hash.clone(),
                    maker: caller.clone(),
                    balance: funding,
                    making_amount: *making_amount,
                    taking_amount_start: *taking_amount_start,
                    taking_amount_end: *taking_amount_end,
                    auction_duration_ms: *auction_duration_ms,
                    hashlock: hashlock.clone(),
                    allow_partial_fills: *allow_partial_fills,
                    parts_amount: *parts_amount,
                    last_used_index: None,
                    safety_deposit: *safety_deposit,
                    timelocks: *timelocks,
                    deployed_at: now,
                    is_active: true,
                    rescue_delay_ms: config.rescue_delay_ms,
                });
                Ok(())
            }

            // ── CreateEscrowSrc ───────────────────────────────────────────────
            Action::CreateEscrowSrc {
                wallet_id,
                secret_hashlock,
                secret_index,
                merkle_proof,
                taker,
                amount,
                taking_amount,
                safety_deposit,
                timelocks,
            } => {
                let config = self.config()?;
                let mut wallet = self
                    .db
                    .get_wallet(wallet_id)?
                    .ok_or_else(|| CrosslockError::ObjectNotFound(wallet_id.to_hex()))?;

                if !wallet.is_active {
                    return Err(CrosslockError::WalletInactive);
                }
                if *amount == 0 {
                    return Err(CrosslockError::InvalidAmount(
                        "fill amount must be positive".into(),
                    ));
                }
                if wallet.balance.units() < *amount {
                    return Err(CrosslockError::InsufficientBalance {
                        need: *amount,
                        have: wallet.balance.units(),
                    });
                }

                // The offer must meet the published reserve curve at `now`,
                // pro-rata for a partial fill.
                let auction = DutchAuction {
                    start_time: wallet.deployed_at,
                    duration_ms: wallet.auction_duration_ms,
                    taking_amount_start: wallet.taking_amount_start,
                    taking_amount_end: wallet.taking_amount_end,
                };
                let reserve =
                    auction.required_taking_amount(*amount, wallet.making_amount, now)?;
                if *taking_amount < reserve {
                    return Err(CrosslockError::InvalidAmount(format!(
                        "taking amount {taking_amount} below auction reserve {reserve}"
                    )));
                }

                let required_deposit =
                    proportional_deposit(wallet.safety_deposit, *amount, wallet.making_amount)?;
                if *safety_deposit < required_deposit {
                    return Err(CrosslockError::InvalidSafetyDeposit {
                        min: required_deposit,
                        got: *safety_deposit,
                    });
                }

                if wallet.allow_partial_fills {
                    if *secret_index > wallet.parts_amount {
                        return Err(CrosslockError::InvalidPartialFill(format!(
                            "index {secret_index} out of range 0..={}",
                            wallet.parts_amount
                        )));
                    }
                    if let Some(last) = wallet.last_used_index {
                        if *secret_index <= last {
                            return Err(CrosslockError::SecretAlreadyUsed {
                                index: *secret_index,
                            });
                        }
                    }
                    if merkle_proof.len() > MAX_MERKLE_PROOF_LEN {
                        return Err(CrosslockError::InvalidMerkleProof);
                    }
                    let leaf = leaf_hash(*secret_index, secret_hashlock.as_bytes());
                    if !verify_proof(leaf, merkle_proof, &wallet.hashlock) {
                        return Err(CrosslockError::InvalidMerkleProof);
                    }
                    let filled_after = wallet.filled_amount() + *amount;
                    let expected = expected_index(
                        wallet.making_amount,
                        filled_after,
                        *amount,
                        wallet.parts_amount,
                    )?;
                    if expected != *secret_index {
                        return Err(CrosslockError::InvalidPartialFill(format!(
                            "fill of {amount} requires index {expected}, got {secret_index}"
                        )));
                    }
                    wallet.last_used_index = Some(*secret_index);
                } else {
                    if *secret_index != 0 {
                        return Err(CrosslockError::InvalidPartialFill(
                            "single-fill orders use index 0".into(),
                        ));
                    }
                    if !merkle_proof.is_empty() {
                        return Err(CrosslockError::InvalidMerkleProof);
                    }
                    if secret_hashlock != &wallet.hashlock {
                        return Err(CrosslockError::InvalidHashlock);
                    }
                }

                validate_timelocks(timelocks)?;

                self.claim_object_id(object_id)?;
                let principal = wallet.balance.split(*amount)?;
                if wallet.balance.is_zero() {
                    wallet.is_active = false;
                }
                let resolver = staged.accounts.entry(&self.db, caller)?;
                let deposit = resolver.debit_native(*safety_deposit)?;

                staged.events.push(Event::EscrowCreated {
                    escrow_id: object_id.clone(),
                    order_hash: wallet.order_hash.clone(),
                    hashlock: secret_hashlock.clone(),
                    maker: wallet.maker.clone(),
                    taker: taker.clone(),
                    amount: *amount,
                    safety_deposit: *safety_deposit,
                    resolver: caller.clone(),
                    created_at: now,
                    is_merkle: wallet.allow_partial_fills,
                    parts_amount: wallet.parts_amount,
                });
                staged.escrows.push(Escrow {
                    id: object_id.clone(),
                    side: EscrowSide::Src,
                    order_hash: wallet.order_hash.clone(),
                    hashlock: secret_hashlock.clone(),
                    maker: wallet.maker.clone(),
                    taker: taker.clone(),
                    resolver: caller.clone(),
                    token_balance: principal,
                    native_balance: deposit,
                    amount: *amount,
                    safety_deposit: *safety_deposit,
                    timelocks: *timelocks,
                    deployed_at: now,
                    status: EscrowStatus::Active,
                    merkle: None,
                    secret_index: wallet.allow_partial_fills.then_some(*secret_index),
                    rescue_delay_ms: config.rescue_delay_ms,
                });
                staged.wallets.push(wallet);
                Ok(())
            }

            // ── CreateEscrowDst ───────────────────────────────────────────────
            Action::CreateEscrowDst {
                order_hash,
                hashlock,
                maker,
                amount,
                safety_deposit,
                timelocks,
                allow_partial_fills,
                parts_amount,
                src_cancellation_timestamp,
            } => {
                let config = self.config()?;

                if order_hash.is_zero() {
                    return Err(CrosslockError::InvalidOrderHash);
                }
                if hashlock.is_zero() {
                    return Err(CrosslockError::InvalidHashlock);
                }
                if *amount == 0 {
                    return Err(CrosslockError::InvalidAmount(
                        "escrow amount must be positive".into(),
                    ));
                }
                if *safety_deposit < config.min_safety_deposit {
                    return Err(CrosslockError::InvalidSafetyDeposit {
                        min: config.min_safety_deposit,
                        got: *safety_deposit,
                    });
                }
                validate_partial_config(*allow_partial_fills, *parts_amount)?;
                validate_timelocks(timelocks)?;

                // The destination leg must die before the source leg: once the
                // source side becomes cancellable, funds locked here would be
                // stranded.
                if now + timelocks.dst_cancellation > *src_cancellation_timestamp {
                    return Err(CrosslockError::InvalidTimelock(
                        "destination cancellation outlives source cancellation".into(),
                    ));
                }

                self.claim_object_id(object_id)?;
                let taker = staged.accounts.entry(&self.db, caller)?;
                let principal = taker.debit_token(*amount)?;
                let deposit = taker.debit_native(*safety_deposit)?;

                staged.events.push(Event::EscrowCreated {
                    escrow_id: object_id.clone(),
                    order_hash: order_hash.clone(),
                    hashlock: hashlock.clone(),
                    maker: maker.clone(),
                    taker: caller.clone(),
                    amount: *amount,
                    safety_deposit: *safety_deposit,
                    resolver: caller.clone(),
                    created_at: now,
                    is_merkle: *allow_partial_fills,
                    parts_amount: *parts_amount,
                });
                staged.escrows.push(Escrow {
                    id: object_id.clone(),
                    side: EscrowSide::Dst,
                    order_hash: order_hash.clone(),
                    hashlock: hashlock.clone(),
                    maker: maker.clone(),
                    taker: caller.clone(),
                    resolver: caller.clone(),
                    token_balance: principal,
                    native_balance: deposit,
                    amount: *amount,
                    safety_deposit: *safety_deposit,
                    timelocks: *timelocks,
                    deployed_at: now,
                    status: EscrowStatus::Active,
                    merkle: allow_partial_fills.then(|| MerkleState {
                        root: hashlock.clone(),
                        parts_amount: *parts_amount,
                        used_indices: Vec::new(),
                    }),
                    secret_index: None,
                    rescue_delay_ms: config.rescue_delay_ms,
                });
                Ok(())
            }

            // ── Withdraw ──────────────────────────────────────────────────────
            Action::Withdraw {
                escrow_id,
                secret,
                secret_index,
                merkle_proof,
            } => self.withdraw(caller, escrow_id, secret, *secret_index, merkle_proof, now, staged),

            // ── Cancel ────────────────────────────────────────────────────────
            Action::Cancel { escrow_id } => self.cancel(caller, escrow_id, now, staged),

            // ── CancelWallet ──────────────────────────────────────────────────
            Action::CancelWallet { wallet_id } => {
                let mut wallet = self
                    .db
                    .get_wallet(wallet_id)?
                    .ok_or_else(|| CrosslockError::ObjectNotFound(wallet_id.to_hex()))?;

                if caller != &wallet.maker {
                    return Err(CrosslockError::Unauthorised);
                }
                if !wallet.is_active {
                    return Err(CrosslockError::WalletInactive);
                }
                let stage = src_stage(&wallet.timelocks, wallet.deployed_at, now);
                if now < wallet.deployed_at + wallet.timelocks.src_cancellation {
                    return Err(CrosslockError::NotCancellable { stage: stage.name() });
                }

                let refund = wallet.balance.take_all();
                let refunded_amount = refund.units();
                wallet.is_active = false;

                staged
                    .accounts
                    .entry(&self.db, &wallet.maker)?
                    .credit_token(refund)?;
                staged.events.push(Event::WalletClosed {
                    wallet_id: wallet.id.clone(),
                    order_hash: wallet.order_hash.clone(),
                    maker: wallet.maker.clone(),
                    refunded_amount,
                    closed_at: now,
                });
                staged.wallets.push(wallet);
                Ok(())
            }

            // ── Rescue ────────────────────────────────────────────────────────
            Action::Rescue { object_id: target } => self.rescue(caller, target, now, staged),

            // ── SetRescueDelay ────────────────────────────────────────────────
            Action::SetRescueDelay { rescue_delay_ms } => {
                let mut config = self.config()?;
                if caller != &config.admin {
                    return Err(CrosslockError::Unauthorised);
                }
                if *rescue_delay_ms == 0 {
                    return Err(CrosslockError::InvalidTime);
                }
                config.rescue_delay_ms = *rescue_delay_ms;
                staged.events.push(Event::ConfigUpdated {
                    admin: caller.clone(),
                    rescue_delay_ms: config.rescue_delay_ms,
                    min_safety_deposit: config.min_safety_deposit,
                    updated_at: now,
                });
                staged.config = Some(config);
                Ok(())
            }

            // ── SetMinSafetyDeposit ───────────────────────────────────────────
            Action::SetMinSafetyDeposit { min_safety_deposit } => {
                let mut config = self.config()?;
                if caller != &config.admin {
                    return Err(CrosslockError::Unauthorised);
                }
                if *min_safety_deposit == 0 {
                    return Err(CrosslockError::InvalidSafetyDeposit { min: 1, got: 0 });
                }
                config.min_safety_deposit = *min_safety_deposit;
                staged.events.push(Event::ConfigUpdated {
                    admin: caller.clone(),
                    rescue_delay_ms: config.rescue_delay_ms,
                    min_safety_deposit: config.min_safety_deposit,
                    updated_at: now,
                });
                staged.config = Some(config);
                Ok(())
            }
        }
    }

    // ── Withdraw ──────────────────────────────────────────────────────────────

    fn withdraw(
        &self,
        caller: &AccountId,
        escrow_id: &ObjectId,
        secret: &[u8],
        secret_index: Option<SecretIndex>,
        merkle_proof: &[[u8; 32]],
        now: Timestamp,
        staged: &mut StagedMutations,
    ) -> Result<(), CrosslockError> {
        let mut escrow = self
            .db
            .get_escrow(escrow_id)?
            .ok_or_else(|| CrosslockError::ObjectNotFound(escrow_id.to_hex()))?;

        require_active(&escrow)?;
        match escrow.side {
            EscrowSide::Src => match src_stage(&escrow.timelocks, escrow.deployed_at, now) {
                SrcStage::ResolverExclusiveWithdraw => {
                    if caller != &escrow.resolver {
                        return Err(CrosslockError::Unauthorised);
                    }
                }
                SrcStage::PublicWithdraw => {}
                stage => return Err(CrosslockError::NotWithdrawable { stage: stage.name() }),
            },
            EscrowSide::Dst => match dst_stage(&escrow.timelocks, escrow.deployed_at, now) {
                DstStage::ResolverExclusiveWithdraw => {
                    if caller != &escrow.resolver {
                        return Err(CrosslockError::Unauthorised);
                    }
                }
                DstStage::PublicWithdraw => {}
                stage => return Err(CrosslockError::NotWithdrawable { stage: stage.name() }),
            },
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(CrosslockError::InvalidSecret);
        }

        // Resolve the settled share. A destination escrow in partial-fill
        // mode settles per revealed secret; everything else drains fully.
        let (fill, deposit_share, merkle_index) = match escrow.merkle.as_mut() {
            Some(merkle) => {
                let index =
                    secret_index.ok_or_else(|| {
                        CrosslockError::InvalidPartialFill("secret index required".into())
                    })?;
                if index > merkle.parts_amount {
                    return Err(CrosslockError::InvalidPartialFill(format!(
                        "index {index} out of range 0..={}",
                        merkle.parts_amount
                    )));
                }
                if merkle.is_used(index) {
                    return Err(CrosslockError::SecretAlreadyUsed { index });
                }
                if merkle_proof.len() > MAX_MERKLE_PROOF_LEN {
                    return Err(CrosslockError::InvalidMerkleProof);
                }
                let leaf = leaf_hash(index, &keccak256(secret));
                if !verify_proof(leaf, merkle_proof, &merkle.root) {
                    return Err(CrosslockError::InvalidMerkleProof);
                }

                let remaining = escrow.token_balance.units();
                let share = fill_amount(escrow.amount, index, merkle.parts_amount).min(remaining);
                let deposit_share = if share == remaining {
                    // The closing share sweeps the deposit dust with it.
                    escrow.native_balance.units()
                } else {
                    proportional_deposit(escrow.safety_deposit, share, escrow.amount)?
                        .min(escrow.native_balance.units())
                };
                merkle.mark_used(index)?;
                (share, deposit_share, Some(index))
            }
            None => {
                verify_secret(secret, &escrow.hashlock)?;
                (
                    escrow.token_balance.units(),
                    escrow.native_balance.units(),
                    escrow.secret_index,
                )
            }
        };

        let principal = escrow.token_balance.split(fill)?;
        let deposit = escrow.native_balance.split(deposit_share)?;
        if escrow.token_balance.is_zero() {
            escrow.status = EscrowStatus::Withdrawn { withdrawn_at: now };
        }

        let recipient = escrow.withdraw_recipient().clone();
        staged
            .accounts
            .entry(&self.db, &recipient)?
            .credit_token(principal)?;
        staged
            .accounts
            .entry(&self.db, caller)?
            .credit_native(deposit)?;

        staged.events.push(Event::EscrowWithdrawn {
            escrow_id: escrow.id.clone(),
            order_hash: escrow.order_hash.clone(),
            secret: secret.to_vec(),
            withdrawn_by: caller.clone(),
            maker: escrow.maker.clone(),
            taker: escrow.taker.clone(),
            amount: fill,
            withdrawn_at: now,
            merkle_index,
        });
        staged.escrows.push(escrow);
        Ok(())
    }

    // ── Cancel ────────────────────────────────────────────────────────────────

    fn cancel(
        &self,
        caller: &AccountId,
        escrow_id: &ObjectId,
        now: Timestamp,
        staged: &mut StagedMutations,
    ) -> Result<(), CrosslockError> {
        let mut escrow = self
            .db
            .get_escrow(escrow_id)?
            .ok_or_else(|| CrosslockError::ObjectNotFound(escrow_id.to_hex()))?;

        require_active(&escrow)?;
        match escrow.side {
            EscrowSide::Src => match src_stage(&escrow.timelocks, escrow.deployed_at, now) {
                SrcStage::ResolverExclusiveCancel => {
                    if caller != &escrow.resolver {
                        return Err(CrosslockError::Unauthorised);
                    }
                }
                SrcStage::PublicCancel => {}
                stage => return Err(CrosslockError::NotCancellable { stage: stage.name() }),
            },
            // No public cancellation on the destination side.
            EscrowSide::Dst => match dst_stage(&escrow.timelocks, escrow.deployed_at, now) {
                DstStage::ResolverExclusiveCancel => {
                    if caller != &escrow.resolver {
                        return Err(CrosslockError::Unauthorised);
                    }
                }
                stage => return Err(CrosslockError::NotCancellable { stage: stage.name() }),
            },
        }

        let principal = escrow.token_balance.take_all();
        let deposit = escrow.native_balance.take_all();
        let refunded = principal.units();

        let refund_to = escrow.refund_recipient().clone();
        staged
            .accounts
            .entry(&self.db, &refund_to)?
            .credit_token(principal)?;
        staged
            .accounts
            .entry(&self.db, caller)?
            .credit_native(deposit)?;

        escrow.status = EscrowStatus::Cancelled { cancelled_at: now };
        staged.events.push(Event::EscrowCancelled {
            escrow_id: escrow.id.clone(),
            order_hash: escrow.order_hash.clone(),
            maker: escrow.maker.clone(),
            taker: escrow.taker.clone(),
            cancelled_by: caller.clone(),
            amount: refunded,
            cancelled_at: now,
        });
        staged.escrows.push(escrow);
        Ok(())
    }

    // ── Rescue ────────────────────────────────────────────────────────────────

    fn rescue(
        &self,
        caller: &AccountId,
        target: &ObjectId,
        now: Timestamp,
        staged: &mut StagedMutations,
    ) -> Result<(), CrosslockError> {
        if let Some(mut escrow) = self.db.get_escrow(target)? {
            require_active(&escrow)?;
            let rescue_at = rescue_start(escrow.deployed_at, escrow.rescue_delay_ms);
            if now < rescue_at {
                return Err(CrosslockError::TimelockNotExpired { rescue_at });
            }

            let principal = escrow.token_balance.take_all();
            let deposit = escrow.native_balance.take_all();
            let principal_amount = principal.units();
            let deposit_amount = deposit.units();

            // Residual principal still belongs to whoever contributed it;
            // the rescuer earns the deposit and the storage rebate.
            let refund_to = escrow.refund_recipient().clone();
            staged
                .accounts
                .entry(&self.db, &refund_to)?
                .credit_token(principal)?;
            staged
                .accounts
                .entry(&self.db, caller)?
                .credit_native(deposit)?;

            staged.deleted_escrows.push(target.clone());
            staged.events.push(Event::FundsRescued {
                escrow_id: target.clone(),
                rescuer: caller.clone(),
                principal_amount,
                deposit_amount,
            });
            return Ok(());
        }

        if let Some(mut wallet) = self.db.get_wallet(target)? {
            let rescue_at = rescue_start(wallet.deployed_at, wallet.rescue_delay_ms);
            if now < rescue_at {
                return Err(CrosslockError::TimelockNotExpired { rescue_at });
            }

            let principal = wallet.balance.take_all();
            let principal_amount = principal.units();
            staged
                .accounts
                .entry(&self.db, &wallet.maker)?
                .credit_token(principal)?;

            staged.deleted_wallets.push(target.clone());
            staged.events.push(Event::FundsRescued {
                escrow_id: target.clone(),
                rescuer: caller.clone(),
                principal_amount,
                deposit_amount: 0,
            });
            return Ok(());
        }

        Err(CrosslockError::ObjectNotFound(target.to_hex()))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_active(escrow: &Escrow) -> Result<(), CrosslockError> {
    match escrow.status {
        EscrowStatus::Active => Ok(()),
        EscrowStatus::Withdrawn { .. } => Err(CrosslockError::AlreadyWithdrawn),
        EscrowStatus::Cancelled { .. } => Err(CrosslockError::AlreadyCancelled),
    }
}

fn validate_partial_config(allow_partial_fills: bool, parts_amount: u64) -> Result<(), CrosslockError> {
    if allow_partial_fills {
        if parts_amount == 0 || parts_amount > MAX_PARTS_AMOUNT {
            return Err(CrosslockError::InvalidPartialFill(format!(
                "parts amount must be 1..={MAX_PARTS_AMOUNT}"
            )));
        }
    } else if parts_amount != 0 {
        return Err(CrosslockError::InvalidPartialFill(
            "parts amount must be zero when partial fills are disabled".into(),
        ));
    }
    Ok(())
}
