//! Canonical content fingerprint.
//!
//! Detects drift between local and remote variable sets. Two sets with the
//! same names and values hash identically regardless of input order.
//!
//! Values are joined without escaping, so a value containing `\n` or `=`
//! can make two different sets share a canonical text. Known gap; a
//! length-prefixed encoding would close it but changes every stored hash.

use sha2::{Digest, Sha256};

use crate::core::types::Fingerprint;

/// Fingerprint of the empty variable set.
pub const EMPTY: &str = "";

/// Compute the canonical fingerprint of a name→value mapping.
///
/// Entries are sorted byte-wise by name, rendered as `name=value` lines joined
/// by `\n`, hashed with SHA-256 and rendered as lowercase hex. An empty mapping
/// yields [`EMPTY`].
pub fn fingerprint<'a, I>(entries: I) -> Fingerprint
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries: Vec<(&str, &str)> = entries.into_iter().collect();
    if entries.is_empty() {
        return EMPTY.to_string();
    }

    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut hasher = Sha256::new();
    for (i, (name, value)) in entries.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Fingerprint of an owned map, for callers holding `BTreeMap<String, String>`.
pub fn of_map(map: &std::collections::BTreeMap<String, String>) -> Fingerprint {
    fingerprint(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}
