//! dotsync - keeps a local `.env` file and a remote project in step.
//!
//! Values are sealed on the client with a key derived from a deployment
//! pepper and a per-team salt, so the remote only ever stores ciphertext.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Create a remote project and link it
//! │   ├── link          # Link/unlink a working directory
//! │   ├── push, pull    # One-way transfers
//! │   ├── sync          # Three-way reconcile
//! │   └── status        # Hash comparison
//! └── core/
//!     ├── config        # Settings and pepper loading
//!     ├── fingerprint   # Canonical content hash
//!     ├── cipher/       # Envelope encryption
//!     │   ├── envelope  # AES-256-GCM envelope format
//!     │   └── kdf       # Argon2id key derivation
//!     ├── keys          # Per-scope salt service
//!     ├── remote/       # Remote trait
//!     │   ├── fs        # Shared-directory remote
//!     │   └── memory    # In-process remote
//!     ├── store/        # Linked-project store
//!     ├── merge         # Merge policies
//!     └── sync/         # Reconciler
//! ```

pub mod cli;
pub mod core;
pub mod error;
