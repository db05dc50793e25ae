//! `import` - adopt an existing remote resource into the state file.
//!
//! Projects are importable: the record is reconstructed from the remote
//! by id. API keys are not: the API exposes no way to derive the owning
//! project from a key id, and the one-time secret is unrecoverable, so
//! the attempt surfaces the reconciler's explicit rejection.

use crate::cli::ImportCommand;
use crate::commands::connect;
use crate::config::WorkspaceConfig;
use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{ApiKeyReconciler, ProjectReconciler};
use std::path::Path;

pub fn run(
    _ctx: &Context,
    config_path: &Path,
    state_path: &Path,
    command: ImportCommand,
) -> Result<()> {
    ui::header("Import");

    let config = WorkspaceConfig::load(config_path)?;
    let mut state = StateFile::load(state_path)?;
    let remote = connect(&config)?;

    match command {
        ImportCommand::Project { name, id } => {
            if state.projects.contains_key(&name) {
                bail!("project {name} is already tracked in the state file");
            }
            if config.find_project(&name).is_none() {
                ui::warn(&format!(
                    "no [[projects]] entry named {name} - add one or the next apply will delete it"
                ));
            }

            let projects = ProjectReconciler::new(&remote);
            let record = projects
                .import(&id)
                .with_context(|| format!("cannot import project {id}"))?;

            ui::success(&format!("imported project {name} ({})", record.id));
            state.projects.insert(name, record);
            state.save(state_path)?;
            Ok(())
        }
        ImportCommand::ApiKey { name, id } => {
            let keys = ApiKeyReconciler::new(&remote);
            let record = keys
                .import(&id)
                .with_context(|| format!("cannot import API key {name}"))?;

            // Unreachable today: the reconciler rejects API key import
            // unconditionally.
            state.api_keys.insert(name, record);
            state.save(state_path)?;
            Ok(())
        }
    }
}
