//! Scope salt.
//!
//! One random 32-byte value per team scope, combined with the pepper to derive
//! that scope's encryption key. Created once and never rotated.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::constants::SALT_LEN;

/// A per-scope salt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopeSalt([u8; SALT_LEN]);

impl ScopeSalt {
    /// Generate a fresh salt from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// Standard base64 encoding, used on the wire and on disk.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode from base64. Returns `None` unless exactly 32 bytes decode.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let bytes = STANDARD.decode(encoded.trim()).ok()?;
        let bytes: [u8; SALT_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl std::fmt::Debug for ScopeSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = self.to_base64();
        write!(f, "ScopeSalt({}..)", &encoded[..8])
    }
}

impl Serialize for ScopeSalt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ScopeSalt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded)
            .ok_or_else(|| serde::de::Error::custom("salt must be 32 base64-encoded bytes"))
    }
}
