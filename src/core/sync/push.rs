//! Push: make the remote match the local file.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::Reconciler;
use crate::core::domain::PushReport;
use crate::core::fingerprint;
use crate::core::merge::Classification;
use crate::core::remote::{
    AddVariablesRequest, RemoveVariablesRequest, UpdateVariablesRequest, VariableValue,
};
use crate::core::types::{Fingerprint, VarName};
use crate::error::Result;

/// One remote mutation of a push.
enum Request {
    Add(Vec<VariableValue>),
    Update(Vec<VariableValue>),
    Remove(Vec<VarName>),
}

impl Reconciler {
    /// Push the local file for `stage` to the remote.
    ///
    /// Remote values are decrypted and compared with the local ones so only
    /// added, changed and removed names are sent. Changed values are
    /// encrypted in parallel, then sent in sequenced requests of at most
    /// `batch_size` names. Only the last request carries the new content
    /// hash; until it lands the remote hash stays unknown.
    ///
    /// On success the confirmed hash becomes the fingerprint of the local
    /// file read back after the push.
    ///
    /// # Errors
    ///
    /// Any error leaves the confirmed hash and the local file untouched.
    pub fn push(&self, stage: &str) -> Result<PushReport> {
        let project = self.linked(stage)?;
        let local = self.local_env(stage)?.to_map();
        let local_hash = fingerprint::of_map(&local);

        let remote = self.fetch(&project, fingerprint::EMPTY)?;
        let existing = self.decrypt_all(&project, &remote.variables)?;
        let diff = Classification::diff(&existing, &local);

        debug!(
            stage = %stage,
            added = diff.added().len(),
            changed = diff.changed().len(),
            removed = diff.removed().len(),
            "push plan"
        );

        let mut requests = Vec::new();
        if !diff.added().is_empty() || !diff.changed().is_empty() {
            let key = self.scope_key(&project)?;
            let seal = |names: &[String]| -> Result<Vec<VariableValue>> {
                names
                    .par_iter()
                    .map(|name| -> Result<VariableValue> {
                        Ok(VariableValue {
                            name: name.clone(),
                            value: key.seal(&local[name])?,
                        })
                    })
                    .collect()
            };

            let added = seal(diff.added())?;
            let updated = seal(diff.changed())?;
            requests.extend(
                added
                    .chunks(self.batch_size)
                    .map(|c| Request::Add(c.to_vec())),
            );
            requests.extend(
                updated
                    .chunks(self.batch_size)
                    .map(|c| Request::Update(c.to_vec())),
            );
        }
        requests.extend(
            diff.removed()
                .chunks(self.batch_size)
                .map(|c| Request::Remove(c.to_vec())),
        );

        // Content already matches but the remote cannot vouch for it.
        if requests.is_empty() && remote.hash.as_deref() != Some(local_hash.as_str()) {
            requests.push(Request::Remove(Vec::new()));
        }

        self.send(&project.team_id, &project.remote_project_id, stage, requests, &local_hash)?;

        let synced_hash = self.local_hash(stage)?;
        if synced_hash != local_hash {
            warn!(stage = %stage, "local file changed during push");
        }
        self.store.write(&project.with_synced_hash(synced_hash.clone()))?;

        info!(
            stage = %stage,
            added = diff.added().len(),
            updated = diff.changed().len(),
            removed = diff.removed().len(),
            "push complete"
        );

        Ok(PushReport {
            added: diff.added().to_vec(),
            updated: diff.changed().to_vec(),
            removed: diff.removed().to_vec(),
            synced_hash,
        })
    }

    /// Issue requests in order. Only the last one sets `content_hash`.
    fn send(
        &self,
        scope: &str,
        project_id: &str,
        stage: &str,
        requests: Vec<Request>,
        content_hash: &Fingerprint,
    ) -> Result<()> {
        let total = requests.len();

        for (i, request) in requests.into_iter().enumerate() {
            let hash = (i + 1 == total).then(|| content_hash.clone());
            let response = match request {
                Request::Add(variables) => self.remote.add_variables(&AddVariablesRequest {
                    scope: scope.to_string(),
                    project_id: project_id.to_string(),
                    stage: stage.to_string(),
                    variables,
                    content_hash: hash,
                })?,
                Request::Update(variables) => {
                    self.remote.update_variables(&UpdateVariablesRequest {
                        scope: scope.to_string(),
                        project_id: project_id.to_string(),
                        stage: stage.to_string(),
                        variables,
                        content_hash: hash,
                    })?
                }
                Request::Remove(names) => self.remote.remove_variables(&RemoveVariablesRequest {
                    scope: scope.to_string(),
                    project_id: project_id.to_string(),
                    stage: stage.to_string(),
                    names,
                    content_hash: hash,
                })?,
            };

            debug!(
                request = i + 1,
                of = total,
                hash = ?response.updated_hash,
                "remote mutation applied"
            );
        }

        Ok(())
    }
}
