//! `destroy` - delete every resource tracked in the state file.
//!
//! Keys are deleted before their projects. A resource that is already
//! gone remotely counts as destroyed; a deletion the server rejects in
//! the response body does not.

use crate::cli::DestroyArgs;
use crate::commands::connect;
use crate::config::WorkspaceConfig;
use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use dialoguer::Confirm;
use gateway::Remote;
use reconcile::{ApiKeyReconciler, ProjectReconciler};
use std::path::Path;

pub fn run(
    _ctx: &Context,
    config_path: &Path,
    state_path: &Path,
    args: &DestroyArgs,
) -> Result<()> {
    ui::header("Destroying Resources");

    let config = WorkspaceConfig::load(config_path)?;
    let mut state = StateFile::load(state_path)?;

    if state.is_empty() {
        ui::info("Nothing to destroy - the state file is empty");
        return Ok(());
    }

    for name in state.api_keys.keys() {
        println!("  {} API key {}", "-".red(), name.bold());
    }
    for name in state.projects.keys() {
        println!("  {} project {}", "-".red(), name.bold());
    }
    println!();

    if args.dry_run {
        ui::warn("Dry run - no changes were made");
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Destroy all tracked resources?")
            .default(false)
            .interact()
            .context("could not read confirmation")?;
        if !confirmed {
            ui::warn("Aborted");
            return Ok(());
        }
    }

    let remote = connect(&config)?;
    let failures = destroy_tracked(&remote, &mut state);
    state.save(state_path)?;

    println!();
    if failures == 0 {
        ui::success("Destroy complete");
        Ok(())
    } else {
        bail!("destroy finished with {failures} failure(s)");
    }
}

/// Delete everything in the state file, keys first. Returns the number
/// of failures; successfully destroyed entries are removed from state.
fn destroy_tracked(remote: &dyn Remote, state: &mut StateFile) -> usize {
    let mut failures = 0;

    let keys = ApiKeyReconciler::new(remote);
    let tracked: Vec<String> = state.api_keys.keys().cloned().collect();
    for name in tracked {
        let record = state.api_keys[&name].clone();
        match keys.delete(&record.project_id, &record.id) {
            Ok(()) => {
                state.api_keys.remove(&name);
                ui::success(&format!("destroyed API key {name}"));
            }
            Err(err) if err.is_not_found() => {
                state.api_keys.remove(&name);
                ui::dim(&format!("API key {name} was already gone"));
            }
            Err(err) => {
                failures += 1;
                ui::error(&format!("API key {name}: {err}"));
            }
        }
    }

    let projects = ProjectReconciler::new(remote);
    let tracked: Vec<String> = state.projects.keys().cloned().collect();
    for name in tracked {
        let record = state.projects[&name].clone();
        match projects.delete(&record.id) {
            Ok(()) => {
                state.projects.remove(&name);
                ui::success(&format!("destroyed project {name}"));
            }
            Err(err) if err.is_not_found() => {
                state.projects.remove(&name);
                ui::dim(&format!("project {name} was already gone"));
            }
            Err(err) => {
                failures += 1;
                ui::error(&format!("project {name}: {err}"));
            }
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockRemote;
    use reconcile::{ApiKeySpec, ProjectSpec};

    fn populated(remote: &MockRemote) -> StateFile {
        let projects = ProjectReconciler::new(remote);
        let keys = ApiKeyReconciler::new(remote);
        let project = projects.create(&ProjectSpec::named("demo")).unwrap();
        let key = keys
            .create(&ApiKeySpec {
                project_id: project.id.clone(),
                note: None,
            })
            .unwrap();

        let mut state = StateFile::default();
        state.projects.insert("demo".to_string(), project);
        state.api_keys.insert("ci".to_string(), key);
        state
    }

    #[test]
    fn test_destroy_removes_everything() {
        let remote = MockRemote::new();
        let mut state = populated(&remote);

        let failures = destroy_tracked(&remote, &mut state);
        assert_eq!(failures, 0);
        assert!(state.is_empty());
        assert!(remote.projects().is_empty());
    }

    #[test]
    fn test_already_gone_counts_as_destroyed() {
        let remote = MockRemote::new();
        let mut state = populated(&remote);

        // Deleted out-of-band; the project takes its keys with it.
        let id = state.projects["demo"].id.clone();
        remote.delete_project(&id).unwrap();

        let failures = destroy_tracked(&remote, &mut state);
        assert_eq!(failures, 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_rejected_deletion_is_a_failure() {
        let remote = MockRemote::new();
        let mut state = populated(&remote);
        remote.reject_api_key_deletions();

        let failures = destroy_tracked(&remote, &mut state);
        assert_eq!(failures, 1);
        assert!(state.api_keys.contains_key("ci"));
        // The project itself was still destroyed.
        assert!(state.projects.is_empty());
    }
}
