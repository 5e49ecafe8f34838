//! Variable type.
//!
//! A single encrypted variable as held by the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{EncryptedValue, Stage, VarName};

/// An encrypted variable with its name, stage and one prior value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, unique per project and stage
    pub name: VarName,
    /// Current encrypted value
    pub value: EncryptedValue,
    /// Stage tag
    pub stage: Stage,
    /// Encrypted value before the last update, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<EncryptedValue>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Variable {
    /// A newly created variable.
    pub fn new(name: VarName, value: EncryptedValue, stage: Stage) -> Self {
        Self {
            name,
            value,
            stage,
            previous: None,
            updated_at: Utc::now(),
        }
    }

    /// Replace the value, keeping the old one as history.
    pub fn update(&mut self, value: EncryptedValue) {
        let old = std::mem::replace(&mut self.value, value);
        self.previous = Some(old);
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
