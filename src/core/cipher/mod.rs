//! Envelope encryption for variable values.
//!
//! Each value is encrypted with AES-256-GCM under a key derived (Argon2id)
//! from a process-wide pepper and the owning scope's salt, then wrapped in a
//! versioned [`Envelope`].
//!
//! The pepper is passed to [`EnvelopeCipher::new`]; it is never read from
//! ambient state and never stored next to ciphertext. Losing it makes every
//! stored value unrecoverable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::constants::MIN_PEPPER_LEN;
use crate::core::domain::ScopeSalt;
use crate::error::{CipherError, Result, ValidationError};

mod envelope;
mod kdf;

pub use envelope::{Envelope, Sealed, NONCE_LEN, TAG_LEN, VERSION};
pub use kdf::{derive_key, KdfParams, KEY_LEN};

/// Process-wide secret combined with each scope salt.
pub struct Pepper(Zeroizing<Vec<u8>>);

impl Pepper {
    /// Wrap pepper bytes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WeakPepper` if shorter than 16 bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.len() < MIN_PEPPER_LEN {
            return Err(ValidationError::WeakPepper {
                min: MIN_PEPPER_LEN,
                actual: bytes.len(),
            }
            .into());
        }
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Pepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pepper(..)")
    }
}

/// A derived scope key. Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct SealingKey {
    key: Arc<Zeroizing<[u8; KEY_LEN]>>,
}

impl SealingKey {
    fn cipher(&self) -> Aes256Gcm {
        let bytes: &[u8; KEY_LEN] = &self.key;
        Aes256Gcm::new(bytes.into())
    }

    /// Encrypt a value into an envelope string.
    ///
    /// Every plaintext, the empty one included, gets a full authenticated
    /// envelope.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut sealed = self
            .cipher()
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        // aes-gcm appends the tag to the ciphertext
        if sealed.len() < TAG_LEN {
            return Err(CipherError::EncryptionFailed("ciphertext missing tag".to_string()).into());
        }
        let tag_bytes = sealed.split_off(sealed.len() - TAG_LEN);
        let tag: [u8; TAG_LEN] = tag_bytes
            .try_into()
            .map_err(|_| CipherError::EncryptionFailed("invalid tag length".to_string()))?;
        let nonce: [u8; NONCE_LEN] = nonce.into();

        trace!(plaintext_len = plaintext.len(), "sealed value");
        Envelope::new(&nonce, &sealed, &tag).seal()
    }

    /// Decrypt an envelope string.
    ///
    /// The empty string decrypts to the empty string. Anything else must be a
    /// well-formed current-version envelope whose tag verifies under this key.
    pub fn open(&self, encoded: &str) -> Result<Zeroizing<String>> {
        if encoded.is_empty() {
            return Ok(Zeroizing::new(String::new()));
        }
        self.open_envelope(&Envelope::parse(encoded)?)
    }

    fn open_envelope(&self, envelope: &Envelope) -> Result<Zeroizing<String>> {
        let Sealed {
            nonce,
            mut ciphertext,
            tag,
        } = envelope.decode()?;
        ciphertext.extend_from_slice(&tag);

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| {
                CipherError::DecryptionFailed(
                    "authentication failed: wrong key or tampered value".to_string(),
                )
            })?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::DecryptionFailed("invalid UTF-8".to_string()).into())
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealingKey(..)")
    }
}

/// Encrypts and decrypts values for any scope, given that scope's salt.
///
/// Key derivation is deliberately slow, so derived keys are cached per salt
/// for the life of this value.
pub struct EnvelopeCipher {
    pepper: Pepper,
    params: KdfParams,
    keys: Mutex<HashMap<ScopeSalt, SealingKey>>,
}

impl EnvelopeCipher {
    /// Cipher with the default (documented) work factor.
    pub fn new(pepper: Pepper) -> Self {
        Self::with_params(pepper, KdfParams::default())
    }

    /// Cipher with a custom work factor. Values sealed under one work factor
    /// cannot be opened under another.
    pub fn with_params(pepper: Pepper, params: KdfParams) -> Self {
        Self {
            pepper,
            params,
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// Derive (or reuse) the key for a salt.
    pub fn key_for(&self, salt: &ScopeSalt) -> Result<SealingKey> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(key) = keys.get(salt) {
            return Ok(key.clone());
        }

        debug!(salt = ?salt, "deriving scope key");
        let derived = derive_key(self.pepper.as_bytes(), salt.as_bytes(), &self.params)?;
        let key = SealingKey {
            key: Arc::new(derived),
        };
        keys.insert(salt.clone(), key.clone());
        Ok(key)
    }

    /// Encrypt a plaintext for the scope owning `salt`.
    pub fn encrypt(&self, plaintext: &str, salt: &ScopeSalt) -> Result<String> {
        self.key_for(salt)?.seal(plaintext)
    }

    /// Decrypt an envelope for the scope owning `salt`.
    ///
    /// The envelope is parsed and version-checked before any key derivation.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` on tampering, a wrong salt or pepper, an unknown
    /// version, or malformed input. Only the empty string is accepted as a
    /// non-envelope.
    pub fn decrypt(&self, encoded: &str, salt: &ScopeSalt) -> Result<Zeroizing<String>> {
        if encoded.is_empty() {
            return Ok(Zeroizing::new(String::new()));
        }
        let envelope = Envelope::parse(encoded)?;
        self.key_for(salt)?.open_envelope(&envelope)
    }
}

impl std::fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
