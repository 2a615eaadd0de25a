//! Error taxonomy for the sub-wallet container.
//!
//! One enum covers every layer (input ledger, sub-wallet, journal, container),
//! the same way a single `WalletDbError` covers a database layer and a
//! single `UtxoSelectionError` covers input selection elsewhere.

use thiserror::Error;

/// Errors returned by the public container API.
#[derive(Debug, Error)]
pub enum WalletCoreError {
    /// A spend-only operation was called on a view wallet.
    #[error("operation requires a private spend key, but this is a view wallet")]
    IllegalViewWalletOperation,

    /// `import_view_sub_wallet` was called on a full (non-view) wallet.
    #[error("operation requires a view wallet, but this is a full wallet")]
    IllegalNonViewWalletOperation,

    /// A sub-wallet import collided with an existing public spend key.
    #[error("sub-wallet already exists for this public spend key")]
    SubWalletAlreadyExists,

    /// Standard input selection could not meet the requested amount.
    #[error("not enough funds: needed {needed}, found {found}")]
    NotEnoughFunds {
        /// The amount the caller asked for.
        needed: u64,
        /// The amount actually gathered before the search gave up.
        found: u64,
    },

    /// An internal invariant was violated. This should never happen in
    /// normal operation; if it does, the container's state is corrupt.
    #[error("internal invariant violation: {0}")]
    Corruption(String),
}

/// Convenience alias, following the usual `FooResult` pattern.
pub type WalletCoreResult<T> = Result<T, WalletCoreError>;
