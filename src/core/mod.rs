//! Core library components.
//!
//! Hashing, encryption, key management, storage and reconciliation. Nothing
//! here prints; the CLI layer owns presentation.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod fingerprint;
pub mod keys;
pub mod merge;
pub mod remote;
pub mod store;
pub mod sync;
pub mod types;
pub mod validation;
