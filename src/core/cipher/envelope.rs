//! Versioned envelope format.
//!
//! An encrypted value is a compact JSON object:
//!
//! ```text
//! {"v":1,"nonce":"<b64>","ciphertext":"<b64>","tag":"<b64>"}
//! ```
//!
//! The version is checked before any field is decoded, so a record written
//! by a future format is rejected instead of being misread.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{CipherError, Result};

/// Current envelope version.
pub const VERSION: u64 = 1;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Self-describing encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "v")]
    version: u64,
    nonce: String,
    ciphertext: String,
    tag: String,
}

/// Only the version, read before trusting the rest of the document.
#[derive(Deserialize)]
struct VersionProbe {
    v: u64,
}

/// Decoded envelope fields.
#[derive(Debug)]
pub struct Sealed {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl Envelope {
    /// Build a current-version envelope from raw parts.
    pub fn new(nonce: &[u8; NONCE_LEN], ciphertext: &[u8], tag: &[u8; TAG_LEN]) -> Self {
        Self {
            version: VERSION,
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
            tag: STANDARD.encode(tag),
        }
    }

    /// Envelope version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Serialize the envelope to its string form.
    pub fn seal(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            CipherError::EncryptionFailed(format!("failed to serialize envelope: {}", e)).into()
        })
    }

    /// Parse an encoded envelope.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::UnsupportedVersion` for any version other than
    /// [`VERSION`], and `CipherError::DecryptionFailed` for anything that is
    /// not an envelope.
    pub fn parse(encoded: &str) -> Result<Self> {
        let probe: VersionProbe = serde_json::from_str(encoded)
            .map_err(|_| CipherError::DecryptionFailed("malformed envelope".to_string()))?;
        if probe.v != VERSION {
            return Err(CipherError::UnsupportedVersion(probe.v).into());
        }

        serde_json::from_str(encoded).map_err(|e| {
            CipherError::DecryptionFailed(format!("malformed envelope: {}", e)).into()
        })
    }

    /// Decode the base64 fields and check their lengths.
    pub fn decode(&self) -> Result<Sealed> {
        let nonce = decode_field("nonce", &self.nonce)?;
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;
        let tag = decode_field("tag", &self.tag)?;

        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|v: Vec<u8>| {
            CipherError::DecryptionFailed(format!("nonce must be {} bytes, got {}", NONCE_LEN, v.len()))
        })?;
        let tag: [u8; TAG_LEN] = tag.try_into().map_err(|v: Vec<u8>| {
            CipherError::DecryptionFailed(format!("tag must be {} bytes, got {}", TAG_LEN, v.len()))
        })?;

        Ok(Sealed {
            nonce,
            ciphertext,
            tag,
        })
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| CipherError::DecryptionFailed(format!("invalid {}: {}", name, e)).into())
}
