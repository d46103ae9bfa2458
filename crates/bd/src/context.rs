//! Resolves the runtime context (store location, actor) shared by every
//! command, from global flags, `.beads/config.yaml`, and the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use beads_config::beads_dir;
use beads_config::config::BeadsConfig;
use beads_storage::store::FsStore;

use crate::cli::GlobalArgs;

pub struct RuntimeContext {
    pub store: FsStore,
    pub beads_dir: PathBuf,
    pub actor: String,
    pub json: bool,
    pub config: BeadsConfig,
}

impl RuntimeContext {
    /// Resolves a `.beads/` directory (explicit flag, or discovered upward
    /// from the current directory) and the actor identity, in that order
    /// of priority over the environment/git chain.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;

        let dir = match &global.beads_dir {
            Some(path) => PathBuf::from(path),
            None => beads_dir::find_beads_dir_or_error(&cwd)
                .context("no .beads directory found (run `bd init` first)")?,
        };

        let config = beads_config::config::load_config(&dir).context("failed to load .beads/config.yaml")?;

        let actor_override = global.actor.clone().or_else(|| config.actor.clone());
        let actor = beads_core::identity::resolve_actor(actor_override.as_deref());

        let mut store = FsStore::new(dir.clone());
        if let Some(prefix) = &config.prefix {
            store = store.with_prefix(prefix.clone());
        }

        Ok(Self { store, beads_dir: dir, actor, json: global.json, config })
    }
}
