//! Command implementations and the shared planning pipeline.
//!
//! `plan` and `apply` share the same three steps: refresh observed state
//! from the remote (tolerating out-of-band deletions), classify drift per
//! configured entry, and render the resulting operations. `apply` then
//! executes them in a fixed order: orphaned keys, projects, configured
//! keys, orphaned projects, so that keys always have a project id to
//! bind to and projects are never deleted under their keys.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod status;

use crate::config::WorkspaceConfig;
use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use gateway::{HttpRemote, Remote};
use reconcile::{
    Action, ApiKeyReconciler, ApiKeyRecord, ProjectReconciler, ProjectRecord, ProjectSpec,
    plan_api_key, plan_project,
};

/// Build an authenticated remote from the configuration.
///
/// Fails before any network call if credentials are incomplete.
pub fn connect(config: &WorkspaceConfig) -> Result<HttpRemote> {
    let credentials = config.credentials()?;
    log::debug!("using API host {}", credentials.api_host);
    Ok(HttpRemote::new(&credentials))
}

/// A configured project with its classified drift.
pub struct PlannedProject {
    pub name: String,
    pub spec: ProjectSpec,
    pub observed: Option<ProjectRecord>,
    pub action: Action,
}

/// A configured API key with its classified drift.
pub struct PlannedApiKey {
    pub name: String,
    /// Name of the project entry the key belongs to.
    pub project: String,
    pub note: Option<String>,
    pub observed: Option<ApiKeyRecord>,
    pub action: Action,
}

/// Everything one run intends to do.
pub struct Plan {
    pub projects: Vec<PlannedProject>,
    pub api_keys: Vec<PlannedApiKey>,
    /// State entries whose configuration entry was removed.
    pub orphan_projects: Vec<String>,
    pub orphan_api_keys: Vec<String>,
}

impl Plan {
    /// Number of operations that would mutate the remote.
    pub fn changes(&self) -> usize {
        self.projects.iter().filter(|p| p.action.is_change()).count()
            + self.api_keys.iter().filter(|k| k.action.is_change()).count()
            + self.orphan_projects.len()
            + self.orphan_api_keys.len()
    }
}

/// Refresh every tracked record from the remote.
///
/// Records whose resource no longer exists remotely are dropped: for
/// the read step, "not found" means "needs recreation", not an error.
/// Transport failures abort the run.
pub fn refresh_state(remote: &dyn Remote, state: &mut StateFile) -> Result<()> {
    let projects = ProjectReconciler::new(remote);
    let mut refreshed = std::collections::BTreeMap::new();
    for (name, record) in &state.projects {
        match projects.read(&record.id) {
            Ok(fresh) => {
                refreshed.insert(name.clone(), fresh);
            }
            Err(err) if err.is_not_found() => {
                log::info!("project {name} ({}) no longer exists remotely", record.id);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to refresh project {name}"));
            }
        }
    }
    state.projects = refreshed;

    let keys = ApiKeyReconciler::new(remote);
    let mut refreshed = std::collections::BTreeMap::new();
    for (name, record) in &state.api_keys {
        match keys.read(record) {
            Ok(fresh) => {
                refreshed.insert(name.clone(), fresh);
            }
            Err(err) if err.is_not_found() => {
                log::info!("API key {name} ({}) no longer exists remotely", record.id);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to refresh API key {name}"));
            }
        }
    }
    state.api_keys = refreshed;

    Ok(())
}

/// Classify drift for every configured entry against refreshed state.
pub fn build_plan(config: &WorkspaceConfig, state: &StateFile) -> Result<Plan> {
    let mut projects = Vec::new();
    for entry in &config.projects {
        let spec = entry.spec()?;
        let observed = state.projects.get(&entry.name);
        let action = plan_project(&spec, observed)
            .with_context(|| format!("invalid desired state for project {}", entry.name))?;
        projects.push(PlannedProject {
            name: entry.name.clone(),
            spec,
            observed: observed.cloned(),
            action,
        });
    }

    let mut api_keys = Vec::new();
    for entry in &config.api_keys {
        let observed = state.api_keys.get(&entry.name);
        let action = match state.projects.get(&entry.project) {
            Some(project) => plan_api_key(&entry.spec(&project.id), observed),
            // The project does not exist yet; an already-observed key
            // necessarily points at a project that is being recreated.
            None => match observed {
                Some(_) => Action::Replace {
                    field: "project_id",
                },
                None => Action::Create,
            },
        };
        api_keys.push(PlannedApiKey {
            name: entry.name.clone(),
            project: entry.project.clone(),
            note: entry.note.clone(),
            observed: observed.cloned(),
            action,
        });
    }

    let orphan_projects = state
        .projects
        .keys()
        .filter(|name| config.find_project(name).is_none())
        .cloned()
        .collect();
    let orphan_api_keys = state
        .api_keys
        .keys()
        .filter(|name| config.api_keys.iter().all(|k| &k.name != *name))
        .cloned()
        .collect();

    Ok(Plan {
        projects,
        api_keys,
        orphan_projects,
        orphan_api_keys,
    })
}

/// Render the plan as a colored diff.
pub fn print_plan(ctx: &Context, plan: &Plan) {
    let mut created = 0;
    let mut updated = 0;
    let mut replaced = 0;

    ui::section("Projects");
    for project in &plan.projects {
        match &project.action {
            Action::Create => {
                created += 1;
                println!("  {} {}", "+".green(), project.name.bold());
                if let Some(retention) = project.spec.retention_days {
                    ui::dim(&format!("    retention_days: {retention}"));
                }
            }
            Action::Update { fields } => {
                updated += 1;
                println!(
                    "  {} {} {}",
                    "~".yellow(),
                    project.name.bold(),
                    format!("({})", fields.join(", ")).dimmed()
                );
            }
            Action::Replace { field } => {
                replaced += 1;
                println!(
                    "  {} {} {}",
                    "!".red(),
                    project.name.bold(),
                    format!("(replace: {field})").dimmed()
                );
            }
            Action::NoChange => {
                if ctx.verbose > 0 {
                    println!("  {} {}", "=".dimmed(), project.name.dimmed());
                }
            }
        }
    }
    for name in &plan.orphan_projects {
        println!("  {} {}", "-".red(), name.bold());
    }

    if !plan.api_keys.is_empty() || !plan.orphan_api_keys.is_empty() {
        ui::section("API Keys");
        for key in &plan.api_keys {
            match &key.action {
                Action::Create => {
                    created += 1;
                    println!(
                        "  {} {} {}",
                        "+".green(),
                        key.name.bold(),
                        format!("(project: {})", key.project).dimmed()
                    );
                }
                Action::Update { .. } => {
                    // Keys never update in place; planning yields Replace.
                    updated += 1;
                }
                Action::Replace { field } => {
                    replaced += 1;
                    println!(
                        "  {} {} {}",
                        "!".red(),
                        key.name.bold(),
                        format!("(replace: {field})").dimmed()
                    );
                }
                Action::NoChange => {
                    if ctx.verbose > 0 {
                        println!("  {} {}", "=".dimmed(), key.name.dimmed());
                    }
                }
            }
        }
        for name in &plan.orphan_api_keys {
            println!("  {} {}", "-".red(), name.bold());
        }
    }

    let removed = plan.orphan_projects.len() + plan.orphan_api_keys.len();
    println!();
    ui::kv(
        "Plan",
        &format!(
            "{created} to create, {updated} to update, {replaced} to replace, {removed} to remove"
        ),
    );
}
