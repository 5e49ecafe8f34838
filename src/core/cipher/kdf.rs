//! Argon2id key derivation.
//!
//! Turns the process pepper and a scope salt into a 256-bit AES key.
//!
//! Default work factor (fixed; every stored envelope depends on it):
//! - Memory cost: 19,456 KiB (19 MiB)
//! - Time cost: 2 iterations
//! - Parallelism: 1 lane
//! - Output length: 32 bytes

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub mem_cost_kib: u32,
    /// Number of iterations
    pub time_cost: u32,
    /// Number of lanes
    pub parallelism: u32,
}

impl KdfParams {
    pub const fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 19_456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Derive a scope key from the pepper and the scope's salt.
///
/// # Errors
///
/// Returns `CipherError::KdfFailed` if the parameters are rejected by Argon2
/// (e.g. memory below 8 KiB per lane).
pub fn derive_key(
    pepper: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let argon_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CipherError::KdfFailed(format!("invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(pepper, salt, key.as_mut())
        .map_err(|e| CipherError::KdfFailed(format!("{}", e)))?;

    Ok(key)
}
