//! Per-sub-wallet UTXO ledger.
//!
//! Mirrors an output/input tracking split across `db::outputs`
//! (unspent outputs, confirmation), `db::pending_outputs`/
//! `transactions::fund_locker` (locking to prevent double-spend), and
//! `models::output_status` (the `Unspent`/`Locked`/`Spent` classification,
//! reflected here by `TransactionInput::status`). Those versions are async
//! and SQLite-backed; this one is a plain in-memory map guarded by the
//! container's mutex, since the container never does I/O while holding
//! its lock.

use crate::currency::Currency;
use crate::types::{Amount, Hash, Height, KeyDerivation, KeyImage, PublicKey, SecretKey, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Coarse spendability classification. Not stored directly; derived from
/// the other fields by [`TransactionInput::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStatus {
    Unspent,
    Locked,
    Spent,
}

/// One output observed on-chain that belongs to a sub-wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Unique identity of the spend opportunity. Absent in view wallets
    /// until a spend key becomes available.
    pub key_image: Option<KeyImage>,
    pub amount: Amount,
    /// Inclusion height, used for fork rollback.
    pub block_height: Height,
    pub transaction_public_key: PublicKey,
    pub transaction_index: u64,
    pub global_output_index: u64,
    /// The derived one-time output public key.
    pub key: PublicKey,
    pub parent_transaction_hash: Hash,
    /// 0 if unspent; otherwise the block the spend was confirmed in.
    pub spend_height: Height,
    /// Dual-purpose: a UNIX timestamp if `> MAX_BLOCK_NUMBER`, else a
    /// block height, at which the output first becomes spendable.
    pub unlock_time: u64,
    /// Set when a spend is submitted, cleared on confirmation or
    /// cancellation.
    pub locked: bool,
    /// Which submitted transaction locked this input, if any. Recorded so
    /// `remove_cancelled_transactions` can unlock exactly the inputs a
    /// cancelled transaction locked (see `DESIGN.md`'s open-question note
    /// on tracking lock ownership).
    pub locked_by: Option<Hash>,
    /// True for a coinbase (miner-reward) output.
    pub is_coinbase: bool,
}

impl TransactionInput {
    /// Internal identity used for ledger storage before a key image is
    /// known (view wallets). Never exposed outside this module; purely a
    /// map key so duplicate scanner reports of the same output are
    /// idempotent even without a key image.
    fn provisional_identity(&self) -> KeyImage {
        let mut hasher = Sha256::new();
        hasher.update(self.parent_transaction_hash.as_bytes());
        hasher.update(self.global_output_index.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        KeyImage(bytes)
    }

    fn storage_key(&self) -> KeyImage {
        self.key_image.unwrap_or_else(|| self.provisional_identity())
    }

    /// Whether `unlock_time` has passed, per the dual height/timestamp mode
    /// rule: values at or below `max_block_number()` are heights, values
    /// above it are UNIX timestamps.
    fn unlock_time_passed(&self, current_height: Height, now: Timestamp, currency: &dyn Currency) -> bool {
        if self.unlock_time == 0 {
            return true;
        }
        if self.unlock_time > currency.max_block_number() {
            now >= self.unlock_time
        } else {
            current_height >= self.unlock_time
        }
    }

    fn coinbase_matured(&self, current_height: Height, currency: &dyn Currency) -> bool {
        if !self.is_coinbase {
            return true;
        }
        current_height >= self.block_height + currency.mined_money_unlock_window()
    }

    /// Coarse status: spent, locked, or unspent.
    pub fn status(&self) -> OutputStatus {
        if self.spend_height > 0 {
            OutputStatus::Spent
        } else if self.locked {
            OutputStatus::Locked
        } else {
            OutputStatus::Unspent
        }
    }

    fn is_unlocked(&self, current_height: Height, now: Timestamp, currency: &dyn Currency) -> bool {
        self.spend_height == 0
            && !self.locked
            && self.unlock_time_passed(current_height, now, currency)
            && self.coinbase_matured(current_height, currency)
    }
}

/// The set of UTXOs owned by one spend key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputLedger {
    inputs: HashMap<KeyImage, TransactionInput>,
}

impl InputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalizes a candidate UTXO discovered by the scanner. If not a view
    /// wallet, derives the key image from `derivation`, `output_index`, and
    /// the sub-wallet's spend keys, then stores it. For view wallets,
    /// stores without a key image. Idempotent on duplicate key images.
    #[allow(clippy::too_many_arguments)]
    pub fn complete_and_store_input(
        &mut self,
        crypto: &dyn crate::crypto::CryptoProvider,
        derivation: &KeyDerivation,
        output_index: u64,
        mut input: TransactionInput,
        spend_public: Option<&PublicKey>,
        spend_secret: Option<&SecretKey>,
    ) {
        if let (Some(spend_public), Some(spend_secret)) = (spend_public, spend_secret) {
            input.key_image = Some(crypto.derive_key_image(derivation, output_index, spend_public, spend_secret));
        } else {
            input.key_image = None;
        }

        let key = input.storage_key();
        self.inputs.entry(key).or_insert(input);
    }

    /// Returns the unspent, unlocked UTXOs.
    pub fn get_inputs(&self, current_height: Height, now: Timestamp, currency: &dyn Currency) -> Vec<TransactionInput> {
        self.inputs
            .values()
            .filter(|i| i.is_unlocked(current_height, now, currency))
            .cloned()
            .collect()
    }

    /// Sets `locked = true` and records which transaction hash caused the
    /// lock. Silently does nothing if the key image is unknown (treated as
    /// already spent or reorged away).
    pub fn mark_input_as_locked(&mut self, key_image: &KeyImage, locked_by: Hash) {
        if let Some(input) = self.inputs.get_mut(key_image) {
            input.locked = true;
            input.locked_by = Some(locked_by);
        }
    }

    /// Sets `spend_height` and clears `locked`. Idempotent: calling this
    /// twice with the same arguments leaves the same state as calling it
    /// once.
    pub fn mark_input_as_spent(&mut self, key_image: &KeyImage, spend_height: Height) {
        if let Some(input) = self.inputs.get_mut(key_image) {
            input.spend_height = spend_height;
            input.locked = false;
            input.locked_by = None;
        }
    }

    /// For each UTXO: deletes it if mined at or after `fork_height`;
    /// otherwise, if it was spent at or after `fork_height`, unspends it.
    pub fn remove_forked_inputs(&mut self, fork_height: Height) {
        self.inputs.retain(|_, input| input.block_height < fork_height);
        for input in self.inputs.values_mut() {
            if input.spend_height >= fork_height {
                input.spend_height = 0;
                input.locked = false;
                input.locked_by = None;
            }
        }
    }

    /// Clears `locked` on every UTXO whose recorded `locked_by` hash is in
    /// `hashes`. Unlocks *all* matching inputs in one pass, not just the
    /// first one found.
    pub fn remove_cancelled_transactions(&mut self, hashes: &std::collections::HashSet<Hash>) {
        for input in self.inputs.values_mut() {
            if input.locked_by.is_some_and(|h| hashes.contains(&h)) {
                input.locked = false;
                input.locked_by = None;
            }
        }
    }

    /// Drops UTXOs mined at or after `scan_height`; clears every `locked`
    /// flag.
    pub fn reset(&mut self, scan_height: Height) {
        self.inputs.retain(|_, input| input.block_height < scan_height);
        for input in self.inputs.values_mut() {
            input.locked = false;
            input.locked_by = None;
        }
    }

    /// Returns `(unlocked, locked)` totals across every tracked input.
    pub fn get_balance(&self, current_height: Height, now: Timestamp, currency: &dyn Currency) -> (Amount, Amount) {
        let mut unlocked = 0u64;
        let mut locked = 0u64;
        for input in self.inputs.values() {
            if input.spend_height != 0 {
                continue;
            }
            if input.is_unlocked(current_height, now, currency) {
                unlocked = unlocked.saturating_add(input.amount);
            } else {
                locked = locked.saturating_add(input.amount);
            }
        }
        (unlocked, locked)
    }

    /// True if this ledger holds an input with the given key image.
    pub fn has_key_image(&self, key_image: &KeyImage) -> bool {
        self.inputs.contains_key(key_image)
    }

    /// Number of UTXOs tracked, spent or not. Mostly useful for tests.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
