//! Sub-wallet record: one spend key's identity plus its UTXO ledger.
//!
//! Thin aggregate over identity plus an [`InputLedger`], modeled on an
//! accounts table (`db::accounts::AccountRow`: keys, address, flags)
//! paired with its per-account output rows.

use crate::input_ledger::InputLedger;
use crate::types::{Height, PublicKey, SecretKey, Timestamp};
use serde::{Deserialize, Serialize};

/// Identity plus ledger for one spend key within a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubWallet {
    public_spend_key: PublicKey,
    private_spend_key: Option<SecretKey>,
    address: String,
    sync_start_height: Height,
    sync_start_timestamp: Timestamp,
    is_primary: bool,
    ledger: InputLedger,
}

impl SubWallet {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        public_spend_key: PublicKey,
        private_spend_key: Option<SecretKey>,
        address: String,
        sync_start_height: Height,
        sync_start_timestamp: Timestamp,
        is_primary: bool,
    ) -> Self {
        Self {
            public_spend_key,
            private_spend_key,
            address,
            sync_start_height,
            sync_start_timestamp,
            is_primary,
            ledger: InputLedger::new(),
        }
    }

    pub fn public_spend_key(&self) -> &PublicKey {
        &self.public_spend_key
    }

    pub fn private_spend_key(&self) -> Option<&SecretKey> {
        self.private_spend_key.as_ref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sync_start_height(&self) -> Height {
        self.sync_start_height
    }

    pub fn sync_start_timestamp(&self) -> Timestamp {
        self.sync_start_timestamp
    }

    pub fn is_primary_address(&self) -> bool {
        self.is_primary
    }

    pub fn has_key_image(&self, key_image: &crate::types::KeyImage) -> bool {
        self.ledger.has_key_image(key_image)
    }

    pub fn ledger(&self) -> &InputLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut InputLedger {
        &mut self.ledger
    }
}
