//! In-process remote store.
//!
//! Holds everything in memory behind a mutex. Used by tests and benches, and
//! able to inject failures so interrupted operations can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use super::{
    AddVariablesRequest, CreateProjectRequest, GetProjectRequest, GetVariablesRequest,
    GetVariablesResponse, InsertOutcome, MutationResponse, ProjectInfo, Remote,
    RemoveVariablesRequest, StageDoc, UpdateVariablesRequest,
};
use crate::core::domain::ScopeSalt;
use crate::core::types::{ProjectId, ScopeId, Stage};
use crate::error::{RemoteError, Result};

#[derive(Debug, Default)]
struct State {
    projects: HashMap<ProjectId, ProjectInfo>,
    stages: HashMap<(ProjectId, Stage), StageDoc>,
    salts: HashMap<ScopeId, ScopeSalt>,
}

/// Remote store held in memory.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
    mutations: AtomicUsize,
    /// 1-based mutation number that fails; 0 disables.
    fail_at: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the `n`-th mutation from now fail with `Unavailable`.
    ///
    /// Counts add, update and remove calls. The failing call changes nothing.
    pub fn fail_on_mutation(&self, n: usize) {
        let done = self.mutations.load(Ordering::SeqCst);
        self.fail_at.store(done + n, Ordering::SeqCst);
    }

    /// Fail every call until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of mutation calls received so far, failed ones included.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Stored document for a stage.
    pub fn stage_doc(&self, project_id: &str, stage: &str) -> Option<StageDoc> {
        self.state()
            .stages
            .get(&(project_id.to_string(), stage.to_string()))
            .cloned()
    }

    /// Stored salt for a scope.
    pub fn salt(&self, scope: &str) -> Option<ScopeSalt> {
        self.state().salts.get(scope).cloned()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("remote is offline".to_string()).into());
        }
        Ok(())
    }

    fn check_scope(state: &State, scope: &str, project_id: &str) -> Result<()> {
        match state.projects.get(project_id) {
            Some(project) if project.team_id == scope => Ok(()),
            _ => Err(RemoteError::ProjectNotFound(project_id.to_string()).into()),
        }
    }

    fn mutate(
        &self,
        scope: &str,
        project_id: &str,
        stage: &str,
        apply: impl FnOnce(&mut StageDoc) -> MutationResponse,
    ) -> Result<MutationResponse> {
        self.check_online()?;
        let call = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_at.load(Ordering::SeqCst) {
            debug!(call, "injected remote failure");
            return Err(RemoteError::Unavailable(format!("injected failure on call {}", call)).into());
        }

        let mut state = self.state();
        Self::check_scope(&state, scope, project_id)?;
        let doc = state
            .stages
            .entry((project_id.to_string(), stage.to_string()))
            .or_default();
        Ok(apply(doc))
    }
}

impl Remote for MemoryRemote {
    fn get_project(&self, req: &GetProjectRequest) -> Result<ProjectInfo> {
        self.check_online()?;
        self.state()
            .projects
            .get(&req.project_id)
            .cloned()
            .ok_or_else(|| RemoteError::ProjectNotFound(req.project_id.clone()).into())
    }

    fn create_project(&self, req: &CreateProjectRequest) -> Result<ProjectInfo> {
        self.check_online()?;
        let project = ProjectInfo {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: req.team_id.clone(),
            name: req.name.clone(),
            created_at: Utc::now(),
        };
        self.state()
            .projects
            .insert(project.id.clone(), project.clone());
        Ok(project)
    }

    fn get_variables(&self, req: &GetVariablesRequest) -> Result<GetVariablesResponse> {
        self.check_online()?;
        let state = self.state();
        Self::check_scope(&state, &req.scope, &req.project_id)?;
        let response = state
            .stages
            .get(&(req.project_id.clone(), req.stage.clone()))
            .map(|doc| doc.snapshot(&req.local_hash))
            .unwrap_or_else(|| StageDoc::default().snapshot(&req.local_hash));
        Ok(response)
    }

    fn add_variables(&self, req: &AddVariablesRequest) -> Result<MutationResponse> {
        self.mutate(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.upsert(&req.stage, &req.variables, req.content_hash.clone())
        })
    }

    fn update_variables(&self, req: &UpdateVariablesRequest) -> Result<MutationResponse> {
        self.mutate(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.upsert(&req.stage, &req.variables, req.content_hash.clone())
        })
    }

    fn remove_variables(&self, req: &RemoveVariablesRequest) -> Result<MutationResponse> {
        self.mutate(&req.scope, &req.project_id, &req.stage, |doc| {
            doc.remove(&req.names, req.content_hash.clone())
        })
    }

    fn read_salt(&self, scope: &str) -> Result<Option<ScopeSalt>> {
        self.check_online()?;
        Ok(self.salt(scope))
    }

    fn insert_salt(&self, scope: &str, salt: &ScopeSalt) -> Result<InsertOutcome> {
        self.check_online()?;
        let mut state = self.state();
        if state.salts.contains_key(scope) {
            return Ok(InsertOutcome::Conflict);
        }
        state.salts.insert(scope.to_string(), salt.clone());
        Ok(InsertOutcome::Inserted)
    }
}
