//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A variable name (e.g., DATABASE_URL, API_KEY).
///
/// Must be a valid environment variable name.
pub type VarName = String;

/// An encrypted value: a serialized envelope. The empty string reads as a
/// cleared value.
pub type EncryptedValue = String;

/// A canonical fingerprint (lowercase hex SHA-256, or empty for no variables).
pub type Fingerprint = String;

/// Identifier of a team scope. Owns one salt and one variable namespace.
pub type ScopeId = String;

/// Identifier of a remote project.
pub type ProjectId = String;

/// Name of an environment tier (development, production, ...).
pub type Stage = String;
