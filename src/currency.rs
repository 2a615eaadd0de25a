//! Protocol constants and the derived helper functions the container needs
//! from them. Values mirror typical CryptoNote protocol parameters.

use crate::types::{Height, Timestamp};

/// External collaborator: protocol constants and derived helpers.
pub trait Currency: Send + Sync {
    /// Unlock times at or below this value are block heights; above it,
    /// they are UNIX timestamps.
    fn max_block_number(&self) -> u64;

    /// Number of blocks a coinbase output must wait before it is spendable.
    fn mined_money_unlock_window(&self) -> u64;

    /// Maximum serialized size, in bytes, of a fusion transaction.
    fn fusion_tx_max_size(&self) -> u64;

    /// Minimum ratio of inputs to outputs a fusion transaction must have.
    fn fusion_tx_min_in_out_count_ratio(&self) -> u64;

    /// Minimum number of same-bucket inputs for a bucket to be "full".
    fn fusion_tx_min_input_count(&self) -> usize;

    /// Estimates the maximum number of inputs a fusion transaction can hold
    /// at the given mixin, staying under `max_size`.
    fn approx_max_input_count(&self, max_size: u64, min_in_out_ratio: u64, mixin: u64) -> u64;

    /// Converts a block height into an approximate UNIX timestamp, used to
    /// compare a height-based sync start against a timestamp-based one on
    /// the same scale.
    fn scan_height_to_timestamp(&self, height: Height) -> Timestamp;
}

/// Default [`Currency`] using typical CryptoNote-family parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct CryptoNoteCurrency;

/// Approximate block time, used only to convert a height into a timestamp
/// for the "earliest needed sync point" comparison across sub-wallets.
const AVERAGE_BLOCK_TIME_SECONDS: u64 = 120;

/// Rough bytes-per-input/output used to derive `approx_max_input_count`
/// from a byte budget and a mixin (ring size minus the real input).
const BYTES_PER_RING_MEMBER: u64 = 32;
const BYTES_PER_OUTPUT: u64 = 64;

impl Currency for CryptoNoteCurrency {
    fn max_block_number(&self) -> u64 {
        500_000_000
    }

    fn mined_money_unlock_window(&self) -> u64 {
        60
    }

    fn fusion_tx_max_size(&self) -> u64 {
        256 * 1024
    }

    fn fusion_tx_min_in_out_count_ratio(&self) -> u64 {
        4
    }

    fn fusion_tx_min_input_count(&self) -> usize {
        12
    }

    fn approx_max_input_count(&self, max_size: u64, min_in_out_ratio: u64, mixin: u64) -> u64 {
        let ring_size = mixin + 1;
        let bytes_per_input = BYTES_PER_RING_MEMBER.saturating_mul(ring_size).max(1);
        let outputs_budget = max_size / min_in_out_ratio.max(1);
        let max_outputs = (outputs_budget / BYTES_PER_OUTPUT).max(1);
        let max_inputs_for_remaining_budget = (max_size.saturating_sub(outputs_budget)) / bytes_per_input;
        max_inputs_for_remaining_budget.max(max_outputs)
    }

    fn scan_height_to_timestamp(&self, height: Height) -> Timestamp {
        height.saturating_mul(AVERAGE_BLOCK_TIME_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_zero_maps_to_timestamp_zero() {
        let currency = CryptoNoteCurrency;
        assert_eq!(currency.scan_height_to_timestamp(0), 0);
    }

    #[test]
    fn approx_max_input_count_is_positive_and_shrinks_with_mixin() {
        let currency = CryptoNoteCurrency;
        let small_mixin = currency.approx_max_input_count(
            currency.fusion_tx_max_size(),
            currency.fusion_tx_min_in_out_count_ratio(),
            1,
        );
        let big_mixin = currency.approx_max_input_count(
            currency.fusion_tx_max_size(),
            currency.fusion_tx_min_in_out_count_ratio(),
            15,
        );
        assert!(small_mixin > 0);
        assert!(big_mixin > 0);
        assert!(big_mixin <= small_mixin);
    }
}
