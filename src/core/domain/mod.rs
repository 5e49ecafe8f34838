//! Domain types.

mod env;
mod linked_project;
mod salt;
mod sync;
mod variable;

pub use env::Env;
pub use linked_project::LinkedProject;
pub use salt::ScopeSalt;
pub use sync::{ConflictDecision, PullReport, PushReport, SyncAction, SyncReport, SyncStatus};
pub use variable::Variable;
