//! Address encoding and decoding.
//!
//! CryptoNote-family addresses are conventionally a Base58 encoding of the
//! public spend and view keys plus a checksum, the same convention
//! `mc-util-b58-decoder` and `tari_common_types::tari_address::TariAddress`
//! implement. [`Base58AddressCodec`] implements that convention directly
//! with `bs58`.

use crate::types::PublicKey;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors returned while decoding an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string was not valid Base58.
    #[error("invalid base58 address: {0}")]
    InvalidEncoding(String),
    /// The decoded payload had the wrong length or a bad checksum.
    #[error("malformed address payload")]
    Malformed,
}

/// External collaborator: encodes/decodes addresses from key pairs.
pub trait AddressCodec: Send + Sync {
    /// Decodes an address string into its public spend and view keys.
    fn address_to_keys(&self, address: &str) -> Result<(PublicKey, PublicKey), AddressError>;

    /// Encodes a public spend/view key pair into its address form.
    fn public_keys_to_address(&self, public_spend: &PublicKey, public_view: &PublicKey) -> String;
}

const CHECKSUM_LEN: usize = 4;

/// Default [`AddressCodec`]: `base58(public_spend || public_view || checksum)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base58AddressCodec;

impl Base58AddressCodec {
    fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha256::digest(Sha256::digest(payload));
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[..CHECKSUM_LEN]);
        out
    }
}

impl AddressCodec for Base58AddressCodec {
    fn address_to_keys(&self, address: &str) -> Result<(PublicKey, PublicKey), AddressError> {
        let decoded = bs58::decode(address)
            .into_vec()
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        if decoded.len() != 32 + 32 + CHECKSUM_LEN {
            return Err(AddressError::Malformed);
        }

        let (payload, checksum) = decoded.split_at(64);
        if Self::checksum(payload) != checksum {
            return Err(AddressError::Malformed);
        }

        let spend: [u8; 32] = payload[0..32].try_into().map_err(|_| AddressError::Malformed)?;
        let view: [u8; 32] = payload[32..64].try_into().map_err(|_| AddressError::Malformed)?;
        Ok((PublicKey(spend), PublicKey(view)))
    }

    fn public_keys_to_address(&self, public_spend: &PublicKey, public_view: &PublicKey) -> String {
        let mut payload = Vec::with_capacity(64);
        payload.extend_from_slice(public_spend.as_bytes());
        payload.extend_from_slice(public_view.as_bytes());
        let checksum = Self::checksum(&payload);
        payload.extend_from_slice(&checksum);
        bs58::encode(payload).into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_keys_through_an_address() {
        let codec = Base58AddressCodec;
        let spend = PublicKey([1u8; 32]);
        let view = PublicKey([2u8; 32]);

        let address = codec.public_keys_to_address(&spend, &view);
        let (decoded_spend, decoded_view) = codec.address_to_keys(&address).unwrap();

        assert_eq!(decoded_spend, spend);
        assert_eq!(decoded_view, view);
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let codec = Base58AddressCodec;
        let address = codec.public_keys_to_address(&PublicKey([1u8; 32]), &PublicKey([2u8; 32]));
        let mut corrupted = address.clone();
        corrupted.push('1');
        assert!(codec.address_to_keys(&corrupted).is_err());
    }
}
