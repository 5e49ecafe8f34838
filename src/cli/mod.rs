//! Command-line interface.

pub mod init;
pub mod link;
pub mod output;
pub mod prompt;
pub mod pull;
pub mod push;
pub mod status;
pub mod sync;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::core::cipher::EnvelopeCipher;
use crate::core::config::{self, Settings};
use crate::core::constants;
use crate::core::merge::MergePolicy;
use crate::core::remote::FsRemote;
use crate::core::store::Filesystem;
use crate::core::sync::Reconciler;
use crate::error::Result;

/// dotsync - keep .env files in sync with an encrypted shared store.
#[derive(Parser)]
#[command(
    name = "dotsync",
    about = "Keep .env files in sync with an encrypted shared store",
    version
)]
pub struct Cli {
    /// Stage to operate on (.env for development, .env.<stage> otherwise)
    #[arg(short, long, global = true, default_value = constants::DEFAULT_STAGE)]
    pub stage: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create a remote project and link this directory to it
    Init {
        /// Remote project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,
        /// Team scope that owns the project
        #[arg(short, long)]
        team: Option<String>,
    },

    /// Link this directory to an existing remote project
    Link {
        /// Remote project id
        project_id: String,
    },

    /// Remove this directory's link
    Unlink,

    /// Send local changes to the remote
    Push,

    /// Fetch remote changes into the local file
    Pull {
        /// How remote values are merged into the local file
        #[arg(short, long, value_enum, default_value_t = Policy::Override)]
        policy: Policy,
    },

    /// Push or pull, whichever side changed
    Sync {
        /// How remote values are merged into the local file
        #[arg(short, long, value_enum, default_value_t = Policy::Override)]
        policy: Policy,
        /// What to do when both sides changed (prompts if omitted)
        #[arg(long, value_enum)]
        on_conflict: Option<OnConflict>,
    },

    /// Show local, synced and remote state
    Status {
        /// List every linked project instead
        #[arg(short, long)]
        all: bool,
    },
}

/// Merge policy as given on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Remote values replace local ones
    Override,
    /// Local values win; only new names are added
    Keep,
    /// Ask for each changed or removed name
    Confirm,
}

impl From<Policy> for MergePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Override => MergePolicy::OverrideAll,
            Policy::Keep => MergePolicy::KeepAll,
            Policy::Confirm => MergePolicy::PerKeyConfirm,
        }
    }
}

/// Conflict resolution given on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnConflict {
    Pull,
    Push,
    Abort,
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let stage = cli.stage;
    match cli.command {
        Init { name, team } => init::execute(name.as_deref(), team, &stage),
        Link { project_id } => link::link(&project_id, &stage),
        Unlink => link::unlink(&stage),
        Push => push::execute(&stage),
        Pull { policy } => pull::execute(&stage, policy.into()),
        Sync {
            policy,
            on_conflict,
        } => sync::execute(&stage, policy.into(), on_conflict),
        Status { all } => status::execute(&stage, all),
    }
}

/// Build a reconciler for the current directory from user settings.
pub(crate) fn reconciler(settings: &Settings) -> Result<Reconciler> {
    let home = config::home_dir()?;
    let remote = FsRemote::new(settings.remote_root()?);
    let store = Filesystem::new(config::projects_dir(&home));
    let cipher = EnvelopeCipher::new(settings.pepper()?);
    let cwd = std::env::current_dir()?;

    debug!(
        cwd = %cwd.display(),
        remote = %remote.root().display(),
        store = %store.root().display(),
        "reconciler ready"
    );

    Ok(Reconciler::new(cwd, Arc::new(remote), Box::new(store), cipher)
        .with_batch_size(settings.batch_size()))
}
