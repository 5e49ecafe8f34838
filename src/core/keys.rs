//! Scope key service.
//!
//! Obtains the salt of a team scope, creating it the first time it is asked
//! for. Concurrent first-time callers, in this process or others, converge on
//! the one salt the remote accepted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::core::domain::ScopeSalt;
use crate::core::remote::{InsertOutcome, Remote};
use crate::core::types::ScopeId;
use crate::error::{RemoteError, Result};

/// Salt lookup with get-or-create semantics.
pub struct ScopeKeys {
    remote: Arc<dyn Remote>,
    cache: Mutex<HashMap<ScopeId, ScopeSalt>>,
}

impl ScopeKeys {
    pub fn new(remote: Arc<dyn Remote>) -> Self {
        Self {
            remote,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Salt of `scope`, creating one if the scope has none.
    ///
    /// Reads first. On a miss a fresh salt is offered to the remote, whose
    /// insert only succeeds if no salt exists yet. A losing insert discards
    /// the local salt and reads the winner's.
    ///
    /// The cache only lives as long as this value and is filled from what
    /// the remote returned, never from an unconfirmed local salt.
    ///
    /// # Errors
    ///
    /// `RemoteError::SaltUnavailable` if an insert conflicts but the winning
    /// salt still cannot be read, or any error from the remote.
    pub fn get_or_create_salt(&self, scope: &str) -> Result<ScopeSalt> {
        if let Some(salt) = self.cached(scope) {
            return Ok(salt);
        }

        let salt = match self.remote.read_salt(scope)? {
            Some(salt) => {
                debug!(scope = %scope, "scope salt found");
                salt
            }
            None => self.create(scope)?,
        };

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(scope.to_string(), salt.clone());
        Ok(salt)
    }

    fn cached(&self, scope: &str) -> Option<ScopeSalt> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(scope)
            .cloned()
    }

    fn create(&self, scope: &str) -> Result<ScopeSalt> {
        let candidate = ScopeSalt::generate();

        match self.remote.insert_salt(scope, &candidate)? {
            InsertOutcome::Inserted => {
                info!(scope = %scope, "created scope salt");
                Ok(candidate)
            }
            InsertOutcome::Conflict => {
                warn!(scope = %scope, "lost salt creation race, using existing salt");
                self.remote
                    .read_salt(scope)?
                    .ok_or_else(|| RemoteError::SaltUnavailable(scope.to_string()).into())
            }
        }
    }
}
