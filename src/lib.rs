//! Sub-wallet container for a CryptoNote-family cryptocurrency wallet.
//!
//! This crate owns the wallet-side ledger state of a multi-address wallet
//! sharing a single view key: deterministic sub-wallet key pairs, the
//! unspent-transaction-output ledger of each, a transaction journal, and
//! balance and input-selection logic. It is deliberately isolated from
//! the filesystem, network, and CLI: the blockchain scanner feeds it
//! discovered outputs and fork notices, and the transaction builder asks
//! it for inputs and reports back locks and spends. See [`container`] for
//! the single type applications interact with.
//!
//! # Architecture
//!
//! - [`types`]: fixed-size key/hash newtypes and the `Amount`/`Height`/
//!   `Timestamp` aliases shared by every other module.
//! - [`error`]: the `WalletCoreError` taxonomy returned by fallible
//!   container operations.
//! - [`crypto`], [`address`], [`currency`], [`clock`]: external
//!   collaborator contracts (traits) plus one reasonable default
//!   implementation each, so the container itself never touches curve
//!   arithmetic, Base58, or the wall clock directly.
//! - [`input_ledger`]: the UTXO set owned by one spend key.
//! - [`sub_wallet`]: identity (keys, address, flags) plus an input ledger.
//! - [`journal`]: confirmed and locked transactions, indexed by hash.
//! - [`container`]: orchestrates the above: construction, sub-wallet
//!   management, balance, standard and fusion input selection, and
//!   fork/cancellation/reset handling.
//! - [`log`]: PII-masking helpers used by this crate's own log output.
//!
//! # Getting started
//!
//! ```
//! use std::sync::Arc;
//! use subwallet_core::address::Base58AddressCodec;
//! use subwallet_core::clock::SystemClock;
//! use subwallet_core::container::Container;
//! use subwallet_core::crypto::{CryptoProvider, Ed25519CryptoProvider};
//! use subwallet_core::currency::CryptoNoteCurrency;
//!
//! let crypto = Ed25519CryptoProvider;
//! let (_public_spend, private_spend) = crypto.generate_keys();
//! let (_public_view, private_view) = crypto.generate_keys();
//!
//! let container = Container::new_full(
//!     private_spend,
//!     private_view,
//!     "placeholder-address".to_string(),
//!     0,
//!     true,
//!     Arc::new(Ed25519CryptoProvider),
//!     Arc::new(Base58AddressCodec),
//!     Arc::new(CryptoNoteCurrency),
//!     Arc::new(SystemClock),
//! );
//!
//! assert!(!container.is_view_wallet());
//! ```

pub mod address;
pub mod clock;
pub mod container;
pub mod crypto;
pub mod currency;
pub mod error;
pub mod input_ledger;
pub mod journal;
pub mod log;
pub mod sub_wallet;
pub mod types;

pub use crate::container::{Container, FusionSelection};
pub use crate::error::{WalletCoreError, WalletCoreResult};
pub use crate::input_ledger::{InputLedger, OutputStatus, TransactionInput};
pub use crate::journal::{Journal, Transaction};
pub use crate::sub_wallet::SubWallet;
