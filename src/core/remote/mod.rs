//! Remote store interface.
//!
//! The authoritative copy of every project's variables lives behind the
//! [`Remote`] trait. Each operation has its own request and response type,
//! shared by the reconciler, the bundled backends, and test doubles.
//!
//! ## Backends
//!
//! - **fs**: a shared directory (network mount, synced folder).
//! - **memory**: in-process, for tests; supports fault injection.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Remote` trait
//! 2. Keep variable bookkeeping in a [`StageDoc`] so mutation semantics match
//! 3. Enforce uniqueness of salts per scope in `insert_salt`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::domain::{ScopeSalt, Variable};
use crate::core::fingerprint;
use crate::core::types::{EncryptedValue, Fingerprint, ProjectId, ScopeId, Stage, VarName};
use crate::error::Result;

mod fs;
mod memory;

pub use fs::FsRemote;
pub use memory::MemoryRemote;

/// Look up a project by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProjectRequest {
    pub project_id: ProjectId,
}

/// Create a project owned by a team scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub team_id: ScopeId,
}

/// A remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub team_id: ScopeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Fetch a stage's variables unless they match `local_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetVariablesRequest {
    pub scope: ScopeId,
    pub project_id: ProjectId,
    pub stage: Stage,
    /// Hash the caller already holds. Equal to the remote hash ⇒ `changed: false`.
    pub local_hash: Fingerprint,
}

/// Variables of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetVariablesResponse {
    /// `false` only when the remote hash equals the request's `local_hash`.
    /// Variables are omitted in that case.
    pub changed: bool,
    /// Remote content hash; `None` if no complete write has vouched for it.
    pub hash: Option<Fingerprint>,
    pub variables: Vec<Variable>,
}

/// A name and its encrypted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    pub name: VarName,
    pub value: EncryptedValue,
}

/// Create variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVariablesRequest {
    pub scope: ScopeId,
    pub project_id: ProjectId,
    pub stage: Stage,
    pub variables: Vec<VariableValue>,
    /// Content hash after this request. `None` marks the remote hash unknown
    /// (more requests of the same operation follow).
    pub content_hash: Option<Fingerprint>,
}

/// Replace values of existing variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVariablesRequest {
    pub scope: ScopeId,
    pub project_id: ProjectId,
    pub stage: Stage,
    pub variables: Vec<VariableValue>,
    pub content_hash: Option<Fingerprint>,
}

/// Delete variables by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveVariablesRequest {
    pub scope: ScopeId,
    pub project_id: ProjectId,
    pub stage: Stage,
    pub names: Vec<VarName>,
    pub content_hash: Option<Fingerprint>,
}

/// What a mutation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub updated_hash: Option<Fingerprint>,
    pub additions: Vec<VarName>,
    pub removals: Vec<VarName>,
    pub modifications: Vec<VarName>,
}

/// Result of a guarded salt insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This caller's salt is now the scope's salt.
    Inserted,
    /// Another caller inserted first; re-read to get theirs.
    Conflict,
}

/// The authoritative store.
///
/// Implementations must be safe to share between threads. Every error is
/// reported as `RemoteError` and leaves the caller free to retry.
pub trait Remote: Send + Sync {
    /// Resolve a project.
    fn get_project(&self, req: &GetProjectRequest) -> Result<ProjectInfo>;

    /// Create a project.
    fn create_project(&self, req: &CreateProjectRequest) -> Result<ProjectInfo>;

    /// Fetch variables relative to a hash the caller holds.
    fn get_variables(&self, req: &GetVariablesRequest) -> Result<GetVariablesResponse>;

    /// Create variables. Names that already exist are updated instead.
    fn add_variables(&self, req: &AddVariablesRequest) -> Result<MutationResponse>;

    /// Update variables, keeping one prior value. Unknown names are created.
    fn update_variables(&self, req: &UpdateVariablesRequest) -> Result<MutationResponse>;

    /// Delete variables. Unknown names are ignored.
    fn remove_variables(&self, req: &RemoveVariablesRequest) -> Result<MutationResponse>;

    /// Read a scope's salt, if one exists.
    fn read_salt(&self, scope: &str) -> Result<Option<ScopeSalt>>;

    /// Insert a scope's salt unless one already exists.
    fn insert_salt(&self, scope: &str, salt: &ScopeSalt) -> Result<InsertOutcome>;
}

/// Stored state of one project stage.
///
/// Both bundled backends keep their per-stage data in this shape, so add,
/// update and remove behave the same everywhere. A stage that was never
/// written is known to be empty and vouches for the empty fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDoc {
    /// Content hash vouched for by the last complete write
    #[serde(default)]
    pub hash: Option<Fingerprint>,
    #[serde(default)]
    pub variables: BTreeMap<VarName, Variable>,
}

impl Default for StageDoc {
    fn default() -> Self {
        Self {
            hash: Some(fingerprint::EMPTY.to_string()),
            variables: BTreeMap::new(),
        }
    }
}

impl StageDoc {
    /// Answer a `get_variables` query.
    pub fn snapshot(&self, local_hash: &str) -> GetVariablesResponse {
        if self.hash.as_deref() == Some(local_hash) {
            return GetVariablesResponse {
                changed: false,
                hash: self.hash.clone(),
                variables: Vec::new(),
            };
        }

        GetVariablesResponse {
            changed: true,
            hash: self.hash.clone(),
            variables: self.variables.values().cloned().collect(),
        }
    }

    /// Insert or update values.
    pub fn upsert(
        &mut self,
        stage: &str,
        values: &[VariableValue],
        content_hash: Option<Fingerprint>,
    ) -> MutationResponse {
        let mut response = MutationResponse::default();

        for VariableValue { name, value } in values {
            match self.variables.get_mut(name) {
                Some(existing) => {
                    existing.update(value.clone());
                    response.modifications.push(name.clone());
                }
                None => {
                    self.variables.insert(
                        name.clone(),
                        Variable::new(name.clone(), value.clone(), stage.to_string()),
                    );
                    response.additions.push(name.clone());
                }
            }
        }

        self.hash = content_hash;
        response.updated_hash = self.hash.clone();
        response
    }

    /// Delete names.
    pub fn remove(&mut self, names: &[VarName], content_hash: Option<Fingerprint>) -> MutationResponse {
        let mut response = MutationResponse::default();

        for name in names {
            if self.variables.remove(name).is_some() {
                response.removals.push(name.clone());
            }
        }

        self.hash = content_hash;
        response.updated_hash = self.hash.clone();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(name: &str, value: &str) -> VariableValue {
        VariableValue {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_snapshot_short_circuits_on_equal_hash() {
        let doc = StageDoc {
            hash: Some("abc".to_string()),
            ..Default::default()
        };
        let snap = doc.snapshot("abc");
        assert!(!snap.changed);
        assert!(snap.variables.is_empty());

        assert!(doc.snapshot("other").changed);
    }

    #[test]
    fn test_unknown_hash_never_short_circuits() {
        let doc = StageDoc {
            hash: None,
            ..Default::default()
        };
        assert!(doc.snapshot("").changed);
    }

    #[test]
    fn test_unwritten_stage_vouches_empty() {
        let snap = StageDoc::default().snapshot("");
        assert!(!snap.changed);
        assert_eq!(snap.hash.as_deref(), Some(""));
    }

    #[test]
    fn test_upsert_classifies_and_keeps_history() {
        let mut doc = StageDoc::default();
        let first = doc.upsert("dev", &[value("A", "1")], None);
        assert_eq!(first.additions, vec!["A"]);
        assert_eq!(first.updated_hash, None);

        let second = doc.upsert("dev", &[value("A", "2")], Some("h".to_string()));
        assert_eq!(second.modifications, vec!["A"]);
        assert_eq!(second.updated_hash.as_deref(), Some("h"));
        assert_eq!(doc.variables["A"].previous.as_deref(), Some("1"));
    }

    #[test]
    fn test_remove_ignores_unknown() {
        let mut doc = StageDoc::default();
        doc.upsert("dev", &[value("A", "1")], None);
        let response = doc.remove(&["A".to_string(), "B".to_string()], Some(String::new()));
        assert_eq!(response.removals, vec!["A"]);
        assert!(doc.variables.is_empty());
        assert_eq!(doc.hash.as_deref(), Some(""));
    }
}
