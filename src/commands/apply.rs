//! `apply` - converge remote state to the desired state.
//!
//! Execution order is fixed: orphaned API keys, then projects, then
//! configured API keys, then orphaned projects. Projects run on parallel
//! workers (instances are independent); everything else is sequential.
//! Failures are reported per instance and never retried; whatever
//! succeeded is folded into the state file before the command exits.

use crate::cli::ApplyArgs;
use crate::commands::{Plan, PlannedProject, build_plan, connect, print_plan, refresh_state};
use crate::config::WorkspaceConfig;
use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::{Context as AnyhowContext, Result, bail};
use dialoguer::Confirm;
use gateway::Remote;
use rayon::prelude::*;
use reconcile::{
    Action, ApiKeyReconciler, ApiKeySpec, Error as ReconcileError, ProjectReconciler,
    ProjectRecord,
};
use std::path::Path;

/// Per-run outcome counters.
#[derive(Debug, Default)]
struct Tally {
    created: usize,
    updated: usize,
    replaced: usize,
    removed: usize,
    skipped: usize,
    failed: usize,
}

pub fn run(ctx: &Context, config_path: &Path, state_path: &Path, args: &ApplyArgs) -> Result<()> {
    ui::header("Applying Configuration");

    let config = WorkspaceConfig::load(config_path)?;
    let mut state = StateFile::load(state_path)?;
    let remote = connect(&config)?;

    refresh_state(&remote, &mut state)?;
    let plan = build_plan(&config, &state)?;

    if plan.changes() == 0 {
        ui::success("No changes - remote state matches desired state");
        state.save(state_path)?;
        return Ok(());
    }

    print_plan(ctx, &plan);
    println!();

    if args.dry_run {
        ui::warn("Dry run - no changes were made");
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Apply these operations?")
            .default(false)
            .interact()
            .context("could not read confirmation")?;
        if !confirmed {
            ui::warn("Aborted");
            return Ok(());
        }
    }

    let mut tally = Tally::default();

    // Orphaned keys go first so their projects can follow; orphaned
    // projects go last so their keys are already gone.
    remove_orphan_api_keys(&remote, &plan, &mut state, &mut tally);
    apply_projects(&remote, &plan, &mut state, args.jobs, &mut tally)?;
    apply_api_keys(&remote, &plan, &mut state, &mut tally);
    remove_orphan_projects(&remote, &plan, &mut state, &mut tally);

    state.save(state_path)?;

    println!();
    let summary = format!(
        "{} created, {} updated, {} replaced, {} removed",
        tally.created, tally.updated, tally.replaced, tally.removed
    );
    if tally.failed == 0 {
        ui::success(&format!("Apply complete: {summary}"));
        if tally.skipped > 0 {
            ui::warn(&format!("{} operation(s) skipped", tally.skipped));
        }
        Ok(())
    } else {
        ui::warn(&format!("Apply incomplete: {summary}"));
        bail!("apply finished with {} failure(s)", tally.failed);
    }
}

fn remove_orphan_api_keys(
    remote: &dyn Remote,
    plan: &Plan,
    state: &mut StateFile,
    tally: &mut Tally,
) {
    let keys = ApiKeyReconciler::new(remote);
    for name in &plan.orphan_api_keys {
        let Some(record) = state.api_keys.get(name).cloned() else {
            continue;
        };
        match keys.delete(&record.project_id, &record.id) {
            Ok(()) => {
                state.api_keys.remove(name);
                tally.removed += 1;
                ui::success(&format!("removed API key {name}"));
            }
            Err(err) if err.is_not_found() => {
                state.api_keys.remove(name);
                tally.removed += 1;
            }
            Err(err) => {
                tally.failed += 1;
                ui::error(&format!("API key {name}: {err}"));
            }
        }
    }
}

fn apply_projects(
    remote: &dyn Remote,
    plan: &Plan,
    state: &mut StateFile,
    jobs: usize,
    tally: &mut Tally,
) -> Result<()> {
    let work: Vec<&PlannedProject> = plan
        .projects
        .iter()
        .filter(|p| p.action.is_change())
        .collect();
    if work.is_empty() {
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("failed to create worker pool")?;

    let results: Vec<reconcile::Result<ProjectRecord>> =
        pool.install(|| work.par_iter().map(|p| execute_project(remote, p)).collect());

    for (planned, result) in work.iter().zip(results) {
        match result {
            Ok(record) => {
                match &planned.action {
                    Action::Create => {
                        tally.created += 1;
                        ui::success(&format!("created project {} ({})", planned.name, record.id));
                    }
                    Action::Update { .. } => {
                        tally.updated += 1;
                        ui::success(&format!("updated project {}", planned.name));
                    }
                    Action::Replace { .. } => {
                        tally.replaced += 1;
                        ui::success(&format!(
                            "replaced project {} ({})",
                            planned.name, record.id
                        ));
                    }
                    Action::NoChange => {}
                }
                state.projects.insert(planned.name.clone(), record);
            }
            Err(err) => {
                tally.failed += 1;
                ui::error(&format!("project {}: {err}", planned.name));
            }
        }
    }
    Ok(())
}

fn execute_project(
    remote: &dyn Remote,
    planned: &PlannedProject,
) -> reconcile::Result<ProjectRecord> {
    let projects = ProjectReconciler::new(remote);
    match &planned.action {
        Action::Create => projects.create(&planned.spec),
        Action::Update { .. } => match &planned.observed {
            Some(observed) => projects.update(observed, &planned.spec),
            None => Err(ReconcileError::InvariantViolation(
                "update planned without an observed record".to_string(),
            )),
        },
        Action::Replace { .. } => {
            if let Some(observed) = &planned.observed {
                match projects.delete(&observed.id) {
                    Ok(()) | Err(ReconcileError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            projects.create(&planned.spec)
        }
        Action::NoChange => planned.observed.clone().ok_or_else(|| {
            ReconcileError::InvariantViolation("no-change planned without a record".to_string())
        }),
    }
}

fn apply_api_keys(remote: &dyn Remote, plan: &Plan, state: &mut StateFile, tally: &mut Tally) {
    let keys = ApiKeyReconciler::new(remote);
    let mut captured_secrets = 0;

    for planned in plan.api_keys.iter().filter(|k| k.action.is_change()) {
        let replacing = matches!(planned.action, Action::Replace { .. });

        // Replacement deletes the old key first; the new one is only
        // created if the old one is actually gone.
        if replacing {
            if let Some(observed) = &planned.observed {
                match keys.delete(&observed.project_id, &observed.id) {
                    Ok(()) | Err(ReconcileError::NotFound(_)) => {
                        state.api_keys.remove(&planned.name);
                    }
                    Err(err) => {
                        tally.failed += 1;
                        ui::error(&format!("API key {}: {err}", planned.name));
                        continue;
                    }
                }
            }
        }

        let Some(project) = state.projects.get(&planned.project) else {
            tally.skipped += 1;
            ui::warn(&format!(
                "skipped API key {}: project {} was not created",
                planned.name, planned.project
            ));
            continue;
        };

        let spec = ApiKeySpec {
            project_id: project.id.clone(),
            note: planned.note.clone(),
        };
        match keys.create(&spec) {
            Ok(record) => {
                if replacing {
                    tally.replaced += 1;
                    ui::success(&format!("replaced API key {} ({})", planned.name, record.id));
                } else {
                    tally.created += 1;
                    ui::success(&format!("created API key {} ({})", planned.name, record.id));
                }
                if record.secret_key.is_some() {
                    captured_secrets += 1;
                }
                state.api_keys.insert(planned.name.clone(), record);
            }
            Err(err) => {
                tally.failed += 1;
                ui::error(&format!("API key {}: {err}", planned.name));
            }
        }
    }

    if captured_secrets > 0 {
        ui::info(&format!(
            "{captured_secrets} new secret(s) captured in the state file - the API never returns them again"
        ));
    }
}

fn remove_orphan_projects(
    remote: &dyn Remote,
    plan: &Plan,
    state: &mut StateFile,
    tally: &mut Tally,
) {
    let projects = ProjectReconciler::new(remote);
    for name in &plan.orphan_projects {
        let Some(record) = state.projects.get(name).cloned() else {
            continue;
        };
        match projects.delete(&record.id) {
            Ok(()) | Err(ReconcileError::NotFound(_)) => {
                state.projects.remove(name);
                tally.removed += 1;
                ui::success(&format!("removed project {name}"));
            }
            Err(err) => {
                tally.failed += 1;
                ui::error(&format!("project {name}: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockRemote;

    fn config_from(content: &str) -> WorkspaceConfig {
        toml::from_str(content).unwrap()
    }

    fn apply_all(remote: &dyn Remote, plan: &Plan, state: &mut StateFile) -> Tally {
        let mut tally = Tally::default();
        remove_orphan_api_keys(remote, plan, state, &mut tally);
        apply_projects(remote, plan, state, 2, &mut tally).unwrap();
        apply_api_keys(remote, plan, state, &mut tally);
        remove_orphan_projects(remote, plan, state, &mut tally);
        tally
    }

    #[test]
    fn test_apply_creates_projects_then_keys() {
        let remote = MockRemote::new();
        let config = config_from(
            r#"
            [[projects]]
            name = "demo"
            [[api_keys]]
            name = "ci"
            project = "demo"
            note = "CI pipeline"
            "#,
        );
        let mut state = StateFile::default();
        let plan = build_plan(&config, &state).unwrap();

        let tally = apply_all(&remote, &plan, &mut state);
        assert_eq!(tally.created, 2);
        assert_eq!(tally.failed, 0);

        let project = &state.projects["demo"];
        let key = &state.api_keys["ci"];
        assert_eq!(key.project_id, project.id);
        assert!(key.secret_key.is_some());
    }

    #[test]
    fn test_apply_replaces_key_on_note_change() {
        let remote = MockRemote::new();
        let mut state = StateFile::default();

        let before = config_from(
            r#"
            [[projects]]
            name = "demo"
            [[api_keys]]
            name = "ci"
            project = "demo"
            note = "old"
            "#,
        );
        let plan = build_plan(&before, &state).unwrap();
        apply_all(&remote, &plan, &mut state);
        let old_id = state.api_keys["ci"].id.clone();

        let after = config_from(
            r#"
            [[projects]]
            name = "demo"
            [[api_keys]]
            name = "ci"
            project = "demo"
            note = "new"
            "#,
        );
        let plan = build_plan(&after, &state).unwrap();
        let tally = apply_all(&remote, &plan, &mut state);

        assert_eq!(tally.replaced, 1);
        assert_ne!(state.api_keys["ci"].id, old_id);
        assert_eq!(state.api_keys["ci"].note.as_deref(), Some("new"));
        assert_eq!(remote.api_keys(&state.projects["demo"].id).len(), 1);
    }

    #[test]
    fn test_apply_removes_orphans_in_order() {
        let remote = MockRemote::new();
        let mut state = StateFile::default();

        let before = config_from(
            r#"
            [[projects]]
            name = "demo"
            [[api_keys]]
            name = "ci"
            project = "demo"
            "#,
        );
        let plan = build_plan(&before, &state).unwrap();
        apply_all(&remote, &plan, &mut state);

        // Everything removed from the configuration.
        let plan = build_plan(&config_from(""), &state).unwrap();
        let tally = apply_all(&remote, &plan, &mut state);

        assert_eq!(tally.removed, 2);
        assert!(state.is_empty());
        assert!(remote.projects().is_empty());
    }

    #[test]
    fn test_rejected_key_deletion_keeps_record_and_fails() {
        let remote = MockRemote::new();
        let mut state = StateFile::default();

        let config = config_from(
            r#"
            [[projects]]
            name = "demo"
            [[api_keys]]
            name = "ci"
            project = "demo"
            "#,
        );
        let plan = build_plan(&config, &state).unwrap();
        apply_all(&remote, &plan, &mut state);

        // The server now claims deletions succeed at the HTTP level but
        // reports success=false in the body.
        remote.reject_api_key_deletions();
        let without_key = config_from(
            r#"
            [[projects]]
            name = "demo"
            "#,
        );
        let plan = build_plan(&without_key, &state).unwrap();
        let tally = apply_all(&remote, &plan, &mut state);

        assert_eq!(tally.failed, 1);
        assert!(state.api_keys.contains_key("ci"));
    }
}
