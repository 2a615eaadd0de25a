//! Key generation and key-image derivation.
//!
//! The container never performs cryptography itself; it calls out to a
//! [`CryptoProvider`], the same way curve operations stay behind
//! `tari_crypto`/`tari_transaction_components::key_manager` call sites
//! rather than inline arithmetic in wallet logic.
//!
//! [`Ed25519CryptoProvider`] is a reasonably realistic default modeled on
//! the key-image derivation shape used by Monero wallet scanning: a
//! one-way function of an output's one-time public key and the owner's
//! spend keys, built from `curve25519-dalek` primitives. It is not an
//! audited CryptoNote implementation and should not be used to secure real
//! funds.

use crate::types::{KeyDerivation, KeyImage, PublicKey, SecretKey};
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha512};

/// External collaborator: key generation and key-image derivation.
///
/// Implementations must be safe to call concurrently without shared
/// mutable state (the container never holds its own lock while calling
/// into this trait).
pub trait CryptoProvider: Send + Sync {
    /// Derives the public key corresponding to a secret key.
    fn secret_key_to_public_key(&self, sk: &SecretKey) -> PublicKey;

    /// Generates a fresh, uniformly random key pair.
    fn generate_keys(&self) -> (PublicKey, SecretKey);

    /// Derives the key image of an output, given the shared derivation,
    /// the output's index within its transaction, and the owning
    /// sub-wallet's spend key pair.
    fn derive_key_image(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_public: &PublicKey,
        spend_secret: &SecretKey,
    ) -> KeyImage;
}

fn scalar_from_wide(bytes: &[u8]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// Hashes arbitrary bytes down to a point on the curve. Not Monero's exact
/// `hash_to_ec`, but the same shape: hash, then multiply onto the curve.
fn hash_to_point(bytes: &[u8]) -> curve25519_dalek::edwards::EdwardsPoint {
    let scalar = scalar_from_wide(bytes);
    &scalar * &ED25519_BASEPOINT_TABLE
}

/// Default [`CryptoProvider`] built on `curve25519-dalek`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519CryptoProvider;

impl CryptoProvider for Ed25519CryptoProvider {
    fn secret_key_to_public_key(&self, sk: &SecretKey) -> PublicKey {
        let scalar = Scalar::from_bytes_mod_order(*sk.as_bytes());
        let point = &scalar * &ED25519_BASEPOINT_TABLE;
        PublicKey(point.compress().to_bytes())
    }

    fn generate_keys(&self) -> (PublicKey, SecretKey) {
        let mut rng = rand::rngs::OsRng;
        let scalar = Scalar::random(&mut rng);
        let secret = SecretKey(scalar.to_bytes());
        let public = self.secret_key_to_public_key(&secret);
        (public, secret)
    }

    fn derive_key_image(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_public: &PublicKey,
        spend_secret: &SecretKey,
    ) -> KeyImage {
        // one_time_secret = Hs(derivation || output_index) + spend_secret
        let mut preimage = Vec::with_capacity(40);
        preimage.extend_from_slice(derivation.as_bytes());
        preimage.extend_from_slice(&output_index.to_le_bytes());
        let offset = scalar_from_wide(&preimage);
        let base_secret = Scalar::from_bytes_mod_order(*spend_secret.as_bytes());
        let one_time_secret = offset + base_secret;

        // key_image = one_time_secret * Hp(one_time_public)
        let mut point_input = Vec::with_capacity(32 + 32);
        point_input.extend_from_slice(derivation.as_bytes());
        point_input.extend_from_slice(spend_public.as_bytes());
        let h_p = hash_to_point(&point_input);
        let image_point = one_time_secret * h_p;
        KeyImage(image_point.compress().to_bytes())
    }
}
