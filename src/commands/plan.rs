//! `plan` - preview the operations needed to reach the desired state.

use crate::commands::{build_plan, connect, print_plan, refresh_state};
use crate::config::WorkspaceConfig;
use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::Result;
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path, state_path: &Path) -> Result<()> {
    ui::header("Plan");

    let config = WorkspaceConfig::load(config_path)?;
    let mut state = StateFile::load(state_path)?;
    let remote = connect(&config)?;

    // Refresh in memory only; plan never writes the state file.
    refresh_state(&remote, &mut state)?;
    let plan = build_plan(&config, &state)?;

    if plan.changes() == 0 {
        ui::success("No changes - remote state matches desired state");
        return Ok(());
    }

    print_plan(ctx, &plan);
    println!();
    ui::info("Run `lumetry apply` to perform these operations");
    Ok(())
}
