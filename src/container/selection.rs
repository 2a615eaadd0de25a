//! Input selection: standard (amount-targeted) and fusion (consolidation)
//! selection over the candidate UTXOs of one or more sub-wallets.
//!
//! Mirrors `transactions::input_selector`, which walks a shuffled
//! candidate list accumulating towards a target; this module keeps that
//! shape and adds the fusion bucketing pass a plain amount-targeted
//! selector does not need.

use super::Container;
use crate::error::{WalletCoreError, WalletCoreResult};
use crate::input_ledger::TransactionInput;
use crate::types::{Amount, Height, PublicKey};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Result of fusion input selection. Unlike standard selection this never
/// fails on "not enough" grounds; the caller decides whether `inputs` is
/// worth submitting as a fusion transaction.
#[derive(Debug, Clone)]
pub struct FusionSelection {
    pub inputs: Vec<TransactionInput>,
    pub max_inputs: u64,
    pub found_money: Amount,
}

impl Container {
    /// Standard input selection. Gathers spendable
    /// inputs from the requested sub-wallets (or all of them, if
    /// `take_from_all`), shuffles them, and accumulates until `amount` is
    /// met. `amount == 0` short-circuits to `(empty, 0)`, since the
    /// accumulation precondition is already satisfied.
    pub fn get_transaction_inputs_for_amount(
        &self,
        amount: Amount,
        take_from_all: bool,
        sub_wallet_keys: &[PublicKey],
        current_height: Height,
    ) -> WalletCoreResult<(Vec<TransactionInput>, Amount)> {
        if self.is_view_wallet_flag() {
            return Err(WalletCoreError::IllegalViewWalletOperation);
        }

        if amount == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut candidates = self.gather_candidates(take_from_all, sub_wallet_keys, current_height);
        candidates.shuffle(&mut OsRng);

        let mut selected = Vec::new();
        let mut sum: Amount = 0;
        for candidate in candidates {
            if sum >= amount {
                break;
            }
            sum = sum.saturating_add(candidate.amount);
            selected.push(candidate);
        }

        if sum < amount {
            return Err(WalletCoreError::NotEnoughFunds { needed: amount, found: sum });
        }

        Ok((selected, sum))
    }

    /// Fusion input selection: groups candidates into amount buckets and
    /// prefers to fill one bucket at random over spreading across all of
    /// them.
    pub fn get_fusion_transaction_inputs(
        &self,
        take_from_all: bool,
        sub_wallet_keys: &[PublicKey],
        mixin: u64,
        current_height: Height,
    ) -> WalletCoreResult<FusionSelection> {
        if self.is_view_wallet_flag() {
            return Err(WalletCoreError::IllegalViewWalletOperation);
        }

        let currency = self.currency();
        let max_inputs = currency.approx_max_input_count(currency.fusion_tx_max_size(), currency.fusion_tx_min_in_out_count_ratio(), mixin);
        let min_input_count = currency.fusion_tx_min_input_count();

        let mut candidates = self.gather_candidates(take_from_all, sub_wallet_keys, current_height);
        candidates.shuffle(&mut OsRng);

        let mut buckets: BTreeMap<u32, Vec<TransactionInput>> = BTreeMap::new();
        for candidate in candidates {
            buckets.entry(fusion_bucket(candidate.amount)).or_default().push(candidate);
        }

        let mut full_bucket_keys: Vec<u32> = buckets
            .iter()
            .filter(|(_, members)| members.len() >= min_input_count)
            .map(|(key, _)| *key)
            .collect();

        let chosen: Vec<TransactionInput> = if full_bucket_keys.is_empty() {
            buckets.into_values().flatten().collect()
        } else {
            full_bucket_keys.shuffle(&mut OsRng);
            buckets.remove(&full_bucket_keys[0]).unwrap_or_default()
        };

        let mut inputs = Vec::new();
        let mut found_money: Amount = 0;
        for candidate in chosen {
            if inputs.len() as u64 >= max_inputs {
                break;
            }
            found_money = found_money.saturating_add(candidate.amount);
            inputs.push(candidate);
        }

        Ok(FusionSelection { inputs, max_inputs, found_money })
    }

    fn gather_candidates(&self, take_from_all: bool, sub_wallet_keys: &[PublicKey], current_height: Height) -> Vec<TransactionInput> {
        let now = self.clock().current_adjusted_timestamp();
        self.with_state(|state, currency| {
            let keys: Vec<PublicKey> = if take_from_all {
                state.public_spend_keys().to_vec()
            } else {
                sub_wallet_keys.to_vec()
            };
            state.spendable_inputs(&keys, current_height, now, currency)
        })
    }
}

/// `floor(log10(amount))`. `log10(0)` is undefined, so zero amounts fold
/// into bucket 0 alongside single-digit amounts.
fn fusion_bucket(amount: Amount) -> u32 {
    if amount == 0 {
        return 0;
    }
    (amount as f64).log10().floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_bucket_boundaries() {
        assert_eq!(fusion_bucket(0), 0);
        assert_eq!(fusion_bucket(1), 0);
        assert_eq!(fusion_bucket(9), 0);
        assert_eq!(fusion_bucket(10), 1);
        assert_eq!(fusion_bucket(99), 1);
        assert_eq!(fusion_bucket(100), 2);
        assert_eq!(fusion_bucket(700), 2);
    }
}
