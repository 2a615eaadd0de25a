//! Transaction journal: confirmed and locked (in-flight) transactions.
//!
//! Mirrors a split between `db::pending_transactions` (submitted, not
//! yet observed on-chain) and `db::completed_transactions` (confirmed),
//! reconciled by hash when a scan confirms what the user submitted; this
//! module does the same in [`Journal::add_confirmed`].

use crate::types::{Amount, Hash, Height, PublicKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A confirmed or locked (in-flight) wallet-relevant transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: Hash,
    pub block_height: Height,
    pub timestamp: Timestamp,
    pub unlock_time: u64,
    pub payment_id: Option<Hash>,
    pub fee: Amount,
    pub is_coinbase: bool,
    /// Net signed amount per sub-wallet's public spend key. Positive is
    /// incoming, negative is outgoing. Stored as `i64`: CryptoNote amounts
    /// never approach `i64::MAX`.
    pub transfers: HashMap<PublicKey, i64>,
}

impl Transaction {
    /// A fusion transaction is any non-coinbase entry with zero fee.
    pub fn is_fusion(&self) -> bool {
        !self.is_coinbase && self.fee == 0
    }
}

/// Confirmed and locked transactions, indexed by hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    transactions: Vec<Transaction>,
    locked_transactions: Vec<Transaction>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user-submitted, not-yet-confirmed transaction.
    pub fn add_unconfirmed(&mut self, tx: Transaction) {
        self.locked_transactions.push(tx);
    }

    /// Removes any locked entry with the same hash (the scanner has now
    /// observed what the user submitted), then appends `tx` to the
    /// confirmed list.
    pub fn add_confirmed(&mut self, tx: Transaction) {
        self.locked_transactions.retain(|locked| locked.hash != tx.hash);
        self.transactions.push(tx);
    }

    /// Drops every confirmed entry mined at or after `fork_height`.
    pub fn remove_forked(&mut self, fork_height: Height) {
        self.transactions.retain(|tx| tx.block_height < fork_height);
    }

    /// Drops every locked entry whose hash is in `hashes`.
    pub fn remove_cancelled(&mut self, hashes: &HashSet<Hash>) {
        self.locked_transactions.retain(|tx| !hashes.contains(&tx.hash));
    }

    /// Clears locked transactions; drops confirmed entries mined at or
    /// after `scan_height`.
    pub fn reset(&mut self, scan_height: Height) {
        self.locked_transactions.clear();
        self.transactions.retain(|tx| tx.block_height < scan_height);
    }

    pub fn locked_hashes(&self) -> HashSet<Hash> {
        self.locked_transactions.iter().map(|tx| tx.hash).collect()
    }

    pub fn all_confirmed(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn all_unconfirmed(&self) -> &[Transaction] {
        &self.locked_transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: u8, height: Height) -> Transaction {
        Transaction {
            hash: Hash([hash; 32]),
            block_height: height,
            timestamp: 0,
            unlock_time: 0,
            payment_id: None,
            fee: 1,
            is_coinbase: false,
            transfers: HashMap::new(),
        }
    }

    #[test]
    fn confirmation_collapse() {
        let mut journal = Journal::new();
        journal.add_unconfirmed(tx(1, 0));
        assert_eq!(journal.all_unconfirmed().len(), 1);

        journal.add_confirmed(tx(1, 10));
        assert_eq!(journal.all_unconfirmed().len(), 0);
        assert_eq!(journal.all_confirmed().len(), 1);
    }

    #[test]
    fn remove_forked_drops_all_matching_in_one_call() {
        let mut journal = Journal::new();
        journal.add_confirmed(tx(1, 10));
        journal.add_confirmed(tx(2, 20));
        journal.add_confirmed(tx(3, 30));

        journal.remove_forked(20);

        assert_eq!(journal.all_confirmed().len(), 1);
        assert_eq!(journal.all_confirmed()[0].block_height, 10);
    }

    #[test]
    fn remove_cancelled_drops_all_matching_in_one_call() {
        let mut journal = Journal::new();
        journal.add_unconfirmed(tx(1, 0));
        journal.add_unconfirmed(tx(2, 0));
        journal.add_unconfirmed(tx(3, 0));

        let mut hashes = HashSet::new();
        hashes.insert(Hash([1u8; 32]));
        hashes.insert(Hash([2u8; 32]));
        journal.remove_cancelled(&hashes);

        assert_eq!(journal.all_unconfirmed().len(), 1);
    }

    #[test]
    fn fusion_requires_zero_fee_and_not_coinbase() {
        let mut fusion = tx(1, 0);
        fusion.fee = 0;
        assert!(fusion.is_fusion());

        let mut coinbase = tx(2, 0);
        coinbase.fee = 0;
        coinbase.is_coinbase = true;
        assert!(!coinbase.is_fusion());
    }
}
