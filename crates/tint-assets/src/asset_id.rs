//! Asset identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

use tint_primitives::hash::hash160;
use tint_script::Script;

/// A unique asset identifier.
///
/// The 20-byte id is the Hash160 of the issuer's locking script, which ties
/// every asset to the issuance authority that created it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssetId(#[serde(with = "hex_bytes")] [u8; 20]);

mod hex_bytes {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 20 {
            return Err(serde::de::Error::custom("expected 20 bytes"));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

impl AssetId {
    /// Derive the asset id from an issuer locking script.
    ///
    /// # Arguments
    /// * `script` - The locking script of the issuance coin's output.
    ///
    /// # Returns
    /// The Hash160 of the script bytes as an `AssetId`.
    pub fn from_script(script: &Script) -> Self {
        AssetId(hash160(script.to_bytes()))
    }

    /// Create an `AssetId` directly from 20 raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - The 20-byte id.
    ///
    /// # Returns
    /// The wrapped `AssetId`.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        AssetId(bytes)
    }

    /// Return the raw 20-byte id.
    ///
    /// # Returns
    /// A reference to the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Return the id as a lowercase hex string.
    ///
    /// # Returns
    /// A 40-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
