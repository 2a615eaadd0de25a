//! Fixed-size key and hash types shared by every layer of the container.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Unsigned atomic-unit amount.
pub type Amount = u64;

/// Block index.
pub type Height = u64;

/// UNIX seconds.
pub type Timestamp = u64;

macro_rules! fixed_bytes {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(#[serde(with = "hex_bytes")] pub [u8; $len]);

        impl $name {
            /// All-zero value, used as a sentinel (e.g. "no key image yet").
            pub const ZERO: Self = Self([0u8; $len]);

            /// Raw byte view.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// True if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }
    };
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(bytes: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(d: D) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(d)?;
        let decoded = hex::decode(&s).map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|v: Vec<u8>| serde::de::Error::custom(format!("expected {} bytes, got {}", N, v.len())))
    }
}

fixed_bytes!(PublicKey, 32, "A public key (spend or view).");
fixed_bytes!(KeyImage, 32, "The one-way identity of a spendable output.");
fixed_bytes!(KeyDerivation, 32, "Shared secret derived from a transaction public key and a view key.");
fixed_bytes!(Hash, 32, "A generic 32-byte hash (transaction hash, block hash, ...).");

/// A private key. Zeroized on drop; `Debug` never prints the bytes.
#[derive(Clone, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey(#[serde(with = "hex_bytes")] pub [u8; 32]);

impl SecretKey {
    /// Raw byte view.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(***)")
    }
}

impl From<[u8; 32]> for SecretKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
