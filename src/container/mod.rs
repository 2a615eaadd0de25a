//! Sub-wallet container: orchestrates a keyed collection of [`SubWallet`]
//! records, a [`Journal`], the shared private view key, and a mutex. This
//! is the only type application code talks to directly; the scanner feeds
//! it discovered outputs and fork notices, the transaction builder asks it
//! for inputs and reports back locks/spends.
//!
//! Mirrors a `db` module playing the same role (account table plus
//! output/transaction tables behind a connection pool) but async and
//! SQLite-backed. This container is synchronous and in-memory: no
//! operation may suspend for I/O while holding the lock, so a plain
//! [`std::sync::Mutex`] replaces an `r2d2` pool.

mod selection;

pub use selection::FusionSelection;

use crate::address::AddressCodec;
use crate::clock::Clock;
use crate::crypto::CryptoProvider;
use crate::currency::Currency;
use crate::error::{WalletCoreError, WalletCoreResult};
use crate::input_ledger::TransactionInput;
use crate::journal::{Journal, Transaction};
use crate::log::mask_string;
use crate::sub_wallet::SubWallet;
use crate::types::{Amount, Hash, Height, KeyDerivation, KeyImage, PublicKey, SecretKey, Timestamp};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mutable interior state, guarded by [`Container`]'s mutex.
#[derive(Debug, Default)]
struct ContainerState {
    sub_wallets: HashMap<PublicKey, SubWallet>,
    public_spend_keys: Vec<PublicKey>,
    journal: Journal,
}

/// The sub-wallet container. Cheap to construct, expensive to clone only in
/// proportion to the number of sub-wallets and UTXOs it holds (the external
/// collaborators are shared via `Arc`, not duplicated).
pub struct Container {
    private_view_key: SecretKey,
    is_view_wallet: bool,
    crypto: Arc<dyn CryptoProvider>,
    address_codec: Arc<dyn AddressCodec>,
    currency: Arc<dyn Currency>,
    clock: Arc<dyn Clock>,
    state: Mutex<ContainerState>,
}

impl Container {
    /// Full-wallet constructor: a wallet holding both the spend and view
    /// private keys. The given `address` is trusted as-is (it is not
    /// re-derived from the keys); the first sub-wallet is primary.
    #[allow(clippy::too_many_arguments)]
    pub fn new_full(
        private_spend_key: SecretKey,
        private_view_key: SecretKey,
        address: String,
        scan_height: Height,
        new_wallet: bool,
        crypto: Arc<dyn CryptoProvider>,
        address_codec: Arc<dyn AddressCodec>,
        currency: Arc<dyn Currency>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let public_spend_key = crypto.secret_key_to_public_key(&private_spend_key);
        let (sync_start_height, sync_start_timestamp) = initial_sync_start(new_wallet, scan_height, clock.as_ref());

        let primary = SubWallet::new(
            public_spend_key,
            Some(private_spend_key),
            address,
            sync_start_height,
            sync_start_timestamp,
            true,
        );

        debug!(sub_wallet = mask_string(&public_spend_key.to_string()).as_str(); "created full sub-wallet container");

        Self::assemble(private_view_key, false, public_spend_key, primary, crypto, address_codec, currency, clock)
    }

    /// View-wallet constructor: a wallet holding only the private view
    /// key. The public spend and view keys are decoded from `address` via
    /// the address codec.
    #[allow(clippy::too_many_arguments)]
    pub fn new_view(
        private_view_key: SecretKey,
        address: String,
        scan_height: Height,
        new_wallet: bool,
        crypto: Arc<dyn CryptoProvider>,
        address_codec: Arc<dyn AddressCodec>,
        currency: Arc<dyn Currency>,
        clock: Arc<dyn Clock>,
    ) -> WalletCoreResult<Self> {
        let (public_spend_key, _public_view_key) = address_codec
            .address_to_keys(&address)
            .map_err(|e| WalletCoreError::Corruption(format!("cannot decode view wallet address: {e}")))?;
        let (sync_start_height, sync_start_timestamp) = initial_sync_start(new_wallet, scan_height, clock.as_ref());

        let primary = SubWallet::new(public_spend_key, None, address, sync_start_height, sync_start_timestamp, true);

        debug!(sub_wallet = mask_string(&public_spend_key.to_string()).as_str(); "created view sub-wallet container");

        Ok(Self::assemble(
            private_view_key,
            true,
            public_spend_key,
            primary,
            crypto,
            address_codec,
            currency,
            clock,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        private_view_key: SecretKey,
        is_view_wallet: bool,
        public_spend_key: PublicKey,
        primary: SubWallet,
        crypto: Arc<dyn CryptoProvider>,
        address_codec: Arc<dyn AddressCodec>,
        currency: Arc<dyn Currency>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut sub_wallets = HashMap::new();
        sub_wallets.insert(public_spend_key, primary);

        Self {
            private_view_key,
            is_view_wallet,
            crypto,
            address_codec,
            currency,
            clock,
            state: Mutex::new(ContainerState {
                sub_wallets,
                public_spend_keys: vec![public_spend_key],
                journal: Journal::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ContainerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A prior panic while the lock was held leaves the interior
                // state merely *suspect*, not unreadable; surfacing it as a
                // corruption error (rather than re-panicking) lets a caller
                // decide whether to keep using the container.
                poisoned.into_inner()
            }
        }
    }

    fn require_full_wallet(&self) -> WalletCoreResult<()> {
        if self.is_view_wallet {
            Err(WalletCoreError::IllegalViewWalletOperation)
        } else {
            Ok(())
        }
    }

    pub fn is_view_wallet(&self) -> bool {
        self.is_view_wallet
    }

    pub fn private_view_key(&self) -> &SecretKey {
        &self.private_view_key
    }

    /// Public view key, derived on demand rather than stored redundantly.
    pub fn public_view_key(&self) -> PublicKey {
        self.crypto.secret_key_to_public_key(&self.private_view_key)
    }

    // ---- Sub-wallet management -----------------------------------

    /// Generates a fresh spend key pair and adds it as a new, non-primary
    /// sub-wallet. Fails on view wallets.
    pub fn add_sub_wallet(&self) -> WalletCoreResult<PublicKey> {
        self.require_full_wallet()?;

        let (public_spend_key, private_spend_key) = self.crypto.generate_keys();
        let public_view_key = self.public_view_key();
        let address = self.address_codec.public_keys_to_address(&public_spend_key, &public_view_key);
        let sync_start_timestamp = self.clock.current_adjusted_timestamp();

        let sub_wallet = SubWallet::new(public_spend_key, Some(private_spend_key), address, 0, sync_start_timestamp, false);

        let mut state = self.lock();
        if state.sub_wallets.contains_key(&public_spend_key) {
            return Err(WalletCoreError::SubWalletAlreadyExists);
        }
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!(sub_wallet = mask_string(&public_spend_key.to_string()).as_str(); "added generated sub-wallet");
        Ok(public_spend_key)
    }

    /// Imports a known spend key pair as a new, non-primary sub-wallet.
    /// Fails on view wallets, or if the spend key is already present.
    pub fn import_sub_wallet(&self, private_spend_key: SecretKey, scan_height: Height, new_wallet: bool) -> WalletCoreResult<PublicKey> {
        self.require_full_wallet()?;

        let public_spend_key = self.crypto.secret_key_to_public_key(&private_spend_key);
        let public_view_key = self.public_view_key();
        let address = self.address_codec.public_keys_to_address(&public_spend_key, &public_view_key);
        let (sync_start_height, sync_start_timestamp) = initial_sync_start(new_wallet, scan_height, self.clock.as_ref());

        let mut state = self.lock();
        if state.sub_wallets.contains_key(&public_spend_key) {
            return Err(WalletCoreError::SubWalletAlreadyExists);
        }

        let sub_wallet = SubWallet::new(
            public_spend_key,
            Some(private_spend_key),
            address,
            sync_start_height,
            sync_start_timestamp,
            false,
        );
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!(sub_wallet = mask_string(&public_spend_key.to_string()).as_str(); "imported sub-wallet");
        Ok(public_spend_key)
    }

    /// Imports a known public spend key as a new, non-primary, spend-less
    /// sub-wallet. Fails on full wallets, or if the spend key is already
    /// present.
    pub fn import_view_sub_wallet(&self, public_spend_key: PublicKey, scan_height: Height, new_wallet: bool) -> WalletCoreResult<()> {
        if !self.is_view_wallet {
            return Err(WalletCoreError::IllegalNonViewWalletOperation);
        }

        let public_view_key = self.public_view_key();
        let address = self.address_codec.public_keys_to_address(&public_spend_key, &public_view_key);
        let (sync_start_height, sync_start_timestamp) = initial_sync_start(new_wallet, scan_height, self.clock.as_ref());

        let mut state = self.lock();
        if state.sub_wallets.contains_key(&public_spend_key) {
            return Err(WalletCoreError::SubWalletAlreadyExists);
        }

        let sub_wallet = SubWallet::new(public_spend_key, None, address, sync_start_height, sync_start_timestamp, false);
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!(sub_wallet = mask_string(&public_spend_key.to_string()).as_str(); "imported view-only sub-wallet");
        Ok(())
    }

    pub fn public_spend_keys(&self) -> Vec<PublicKey> {
        self.lock().public_spend_keys.clone()
    }

    /// The sub-wallet created at construction time, distinguished for UI
    /// and key-export purposes. Absence is an invariant violation: every
    /// container must have exactly one primary sub-wallet.
    pub fn primary_address(&self) -> WalletCoreResult<String> {
        let state = self.lock();
        state
            .sub_wallets
            .values()
            .find(|sw| sw.is_primary_address())
            .map(|sw| sw.address().to_string())
            .ok_or_else(|| WalletCoreError::Corruption("no sub-wallet is marked primary".to_string()))
    }

    // ---- Minimum initial sync start -------------------------------

    /// Returns `(height, timestamp)` at which a fresh scan should begin,
    /// choosing whichever sub-wallet needs the earliest coverage.
    ///
    /// Each sub-wallet sets at most one of `sync_start_height` /
    /// `sync_start_timestamp`; the other is zero, meaning "not specified
    /// in this mode" rather than "the earliest possible point". So the
    /// per-field minimum is taken only over the sub-wallets that actually
    /// specify that field; a field nobody specifies defaults to zero. The
    /// height/zero short-circuit and the timestamp-scale comparison then
    /// follow. See `DESIGN.md` for why this reading is adopted over a
    /// literal zero-inclusive minimum (the latter makes the
    /// height-vs-timestamp comparison unreachable given the "at most one
    /// nonzero" invariant).
    pub fn get_min_initial_sync_start(&self) -> (Height, Timestamp) {
        let state = self.lock();
        if state.sub_wallets.is_empty() {
            return (0, 0);
        }

        let mut min_height: Option<Height> = None;
        let mut min_timestamp: Option<Timestamp> = None;
        for sub_wallet in state.sub_wallets.values() {
            let height = sub_wallet.sync_start_height();
            if height != 0 {
                min_height = Some(min_height.map_or(height, |m| m.min(height)));
            }
            let timestamp = sub_wallet.sync_start_timestamp();
            if timestamp != 0 {
                min_timestamp = Some(min_timestamp.map_or(timestamp, |m| m.min(timestamp)));
            }
        }
        drop(state);

        let min_height = min_height.unwrap_or(0);
        let min_timestamp = min_timestamp.unwrap_or(0);

        if min_height == 0 || min_timestamp == 0 {
            return (min_height, min_timestamp);
        }

        let height_as_timestamp = self.currency.scan_height_to_timestamp(min_height);
        if height_as_timestamp < min_timestamp {
            (min_height, 0)
        } else {
            (0, min_timestamp)
        }
    }

    // ---- Key-image ownership --------------------------------------

    /// Returns `(true, owner)` for the first sub-wallet holding `key_image`,
    /// else `(false, PublicKey::ZERO)`. View wallets never hold key images,
    /// so they report `(false, PublicKey::ZERO)` unconditionally.
    pub fn get_key_image_owner(&self, key_image: &KeyImage) -> (bool, PublicKey) {
        if self.is_view_wallet {
            return (false, PublicKey::ZERO);
        }

        let state = self.lock();
        for (public_spend_key, sub_wallet) in state.sub_wallets.iter() {
            if sub_wallet.has_key_image(key_image) {
                return (true, *public_spend_key);
            }
        }
        (false, PublicKey::ZERO)
    }

    // ---- scanner feed ----------------------------------------------------

    /// Routes one scanner-discovered output to the owning sub-wallet's
    /// ledger. The caller (the scanner) is responsible for having already
    /// determined ownership, e.g. by trial-decrypting the output against
    /// each sub-wallet's keys.
    pub fn add_input(
        &self,
        owner_public_spend_key: &PublicKey,
        derivation: &KeyDerivation,
        output_index: u64,
        input: TransactionInput,
    ) -> WalletCoreResult<()> {
        let mut state = self.lock();
        let sub_wallet = state
            .sub_wallets
            .get_mut(owner_public_spend_key)
            .ok_or_else(|| WalletCoreError::Corruption("add_input: unknown sub-wallet".to_string()))?;

        let owner = *sub_wallet.public_spend_key();
        let spend_secret = sub_wallet.private_spend_key().cloned();
        sub_wallet.ledger_mut().complete_and_store_input(
            self.crypto.as_ref(),
            derivation,
            output_index,
            input,
            Some(&owner),
            spend_secret.as_ref(),
        );
        Ok(())
    }

    /// Appends a user-submitted, not-yet-confirmed transaction to the
    /// journal. Does not touch any ledger; locking specific inputs is a
    /// separate call via [`Container::mark_input_as_locked`].
    pub fn add_unconfirmed_transaction(&self, tx: Transaction) {
        self.lock().journal.add_unconfirmed(tx);
    }

    /// Appends a confirmed transaction to the journal, collapsing any
    /// matching locked entry.
    pub fn add_confirmed_transaction(&self, tx: Transaction) {
        self.lock().journal.add_confirmed(tx);
    }

    pub fn all_confirmed_transactions(&self) -> Vec<Transaction> {
        self.lock().journal.all_confirmed().to_vec()
    }

    pub fn all_unconfirmed_transactions(&self) -> Vec<Transaction> {
        self.lock().journal.all_unconfirmed().to_vec()
    }

    /// Hashes of every not-yet-confirmed transaction. Requires a full
    /// wallet: a view wallet never locks inputs, so it has nothing
    /// meaningful to enumerate here.
    pub fn locked_hashes(&self) -> WalletCoreResult<HashSet<Hash>> {
        self.require_full_wallet()?;
        Ok(self.lock().journal.locked_hashes())
    }

    // ---- locking / spending ----------------------------------------------

    /// Marks the UTXO behind `key_image` as locked by `locked_by` (the hash
    /// of the transaction that is about to spend it). No-op if the key
    /// image is unknown.
    pub fn mark_input_as_locked(&self, key_image: &KeyImage, locked_by: Hash) -> WalletCoreResult<()> {
        self.require_full_wallet()?;
        let mut state = self.lock();
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.ledger_mut().mark_input_as_locked(key_image, locked_by);
        }
        Ok(())
    }

    /// Marks the UTXO behind `key_image` as spent at `spend_height`.
    /// Idempotent. No-op if the key image is unknown.
    pub fn mark_input_as_spent(&self, key_image: &KeyImage, spend_height: Height) -> WalletCoreResult<()> {
        self.require_full_wallet()?;
        let mut state = self.lock();
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.ledger_mut().mark_input_as_spent(key_image, spend_height);
        }
        Ok(())
    }

    /// Returns the unspent, unlocked UTXOs across the given sub-wallets (or
    /// all of them, if `take_from_all`), each paired with its owning
    /// sub-wallet's public and private spend keys. Fails on view wallets:
    /// the private spend key half of the triple does not exist there.
    pub fn get_inputs(
        &self,
        sub_wallet_keys: &[PublicKey],
        take_from_all: bool,
        current_height: Height,
    ) -> WalletCoreResult<Vec<(TransactionInput, PublicKey, SecretKey)>> {
        self.require_full_wallet()?;
        let now = self.clock.current_adjusted_timestamp();
        let state = self.lock();
        let keys: Vec<PublicKey> = if take_from_all {
            state.public_spend_keys.clone()
        } else {
            sub_wallet_keys.to_vec()
        };

        let mut triples = Vec::new();
        for key in &keys {
            let Some(sub_wallet) = state.sub_wallets.get(key) else {
                continue;
            };
            let Some(private_spend_key) = sub_wallet.private_spend_key() else {
                continue;
            };
            for input in sub_wallet.ledger().get_inputs(current_height, now, self.currency.as_ref()) {
                triples.push((input, *key, private_spend_key.clone()));
            }
        }
        Ok(triples)
    }

    // ---- Balance ----------------------------------------------------

    /// Sums `(unlocked, locked)` across the given sub-wallets, or all of
    /// them if `take_from_all` is set. Works for view wallets: balance
    /// depends only on stored amounts, never on key images.
    pub fn get_balance(&self, sub_wallet_keys: &[PublicKey], take_from_all: bool, current_height: Height) -> (Amount, Amount) {
        let state = self.lock();
        let now = self.clock.current_adjusted_timestamp();
        let keys: Vec<PublicKey> = if take_from_all {
            state.public_spend_keys.clone()
        } else {
            sub_wallet_keys.to_vec()
        };

        let mut unlocked_total = 0u64;
        let mut locked_total = 0u64;
        for key in &keys {
            if let Some(sub_wallet) = state.sub_wallets.get(key) {
                let (unlocked, locked) = sub_wallet.ledger().get_balance(current_height, now, self.currency.as_ref());
                unlocked_total = unlocked_total.saturating_add(unlocked);
                locked_total = locked_total.saturating_add(locked);
            }
        }
        (unlocked_total, locked_total)
    }

    // ---- Fork and cancellation handling -----------------------------

    /// Drops confirmed journal entries at or above `fork_height` and rolls
    /// back every sub-wallet's ledger accordingly. Valid on view wallets:
    /// rollback is scanner-driven, not spend-driven.
    pub fn remove_forked_transactions(&self, fork_height: Height) {
        let mut state = self.lock();
        state.journal.remove_forked(fork_height);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.ledger_mut().remove_forked_inputs(fork_height);
        }
        debug!(fork_height = fork_height; "rolled back transactions and inputs at fork height");
    }

    /// Drops locked journal entries by hash and unlocks the inputs each of
    /// them locked.
    pub fn remove_cancelled_transactions(&self, hashes: &HashSet<Hash>) -> WalletCoreResult<()> {
        self.require_full_wallet()?;
        let mut state = self.lock();
        state.journal.remove_cancelled(hashes);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.ledger_mut().remove_cancelled_transactions(hashes);
        }
        Ok(())
    }

    /// Clears all locked journal entries, drops confirmed entries at or
    /// above `scan_height`, and resets every sub-wallet's ledger to match.
    /// Valid on view wallets.
    pub fn reset(&self, scan_height: Height) {
        let mut state = self.lock();
        state.journal.reset(scan_height);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.ledger_mut().reset(scan_height);
        }
        debug!(scan_height = scan_height; "reset container to scan height");
    }
}

/// Shared by `new_full`/`new_view`/`import_sub_wallet`/`import_view_sub_wallet`:
/// a freshly generated wallet scans from "now" (minus the clock's safety
/// margin); a restored one scans from the height the caller supplied.
fn initial_sync_start(new_wallet: bool, scan_height: Height, clock: &dyn Clock) -> (Height, Timestamp) {
    if new_wallet {
        (0, clock.current_adjusted_timestamp())
    } else {
        (scan_height, 0)
    }
}

// Private helpers consumed by `selection.rs`. Items with no visibility
// modifier are visible throughout this module and its descendants
// (`container::selection`), but nowhere else in the crate.
impl Container {
    fn with_state<R>(&self, f: impl FnOnce(&mut ContainerState, &dyn Currency) -> R) -> R {
        let mut state = self.lock();
        f(&mut state, self.currency.as_ref())
    }

    fn currency(&self) -> &dyn Currency {
        self.currency.as_ref()
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn is_view_wallet_flag(&self) -> bool {
        self.is_view_wallet
    }
}

impl ContainerState {
    fn spendable_inputs(&self, keys: &[PublicKey], current_height: Height, now: Timestamp, currency: &dyn Currency) -> Vec<TransactionInput> {
        let mut inputs = Vec::new();
        for key in keys {
            if let Some(sub_wallet) = self.sub_wallets.get(key) {
                inputs.extend(sub_wallet.ledger().get_inputs(current_height, now, currency));
            }
        }
        inputs
    }

    fn public_spend_keys(&self) -> &[PublicKey] {
        &self.public_spend_keys
    }
}

impl Clone for Container {
    /// Copy construction clones all interior state. The collaborators
    /// (crypto/address/currency/clock) are stateless engines, not wallet
    /// data, so they are shared via `Arc` rather than duplicated.
    fn clone(&self) -> Self {
        let state = self.lock();
        Self {
            private_view_key: self.private_view_key.clone(),
            is_view_wallet: self.is_view_wallet,
            crypto: Arc::clone(&self.crypto),
            address_codec: Arc::clone(&self.address_codec),
            currency: Arc::clone(&self.currency),
            clock: Arc::clone(&self.clock),
            state: Mutex::new(ContainerState {
                sub_wallets: state.sub_wallets.clone(),
                public_spend_keys: state.public_spend_keys.clone(),
                journal: state.journal.clone(),
            }),
        }
    }
}
