//! `status` - render the tracked observed state.
//!
//! Reads only the state file; nothing touches the network. Secrets are
//! shown through their redacted display form only.

use crate::state::StateFile;
use crate::{Context, ui};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(ctx: &Context, state_path: &Path) -> Result<()> {
    ui::header("Lumetry Status");

    let state = StateFile::load(state_path)?;

    if state.is_empty() {
        ui::info("Nothing is tracked yet - run `lumetry apply` first");
        return Ok(());
    }

    if !state.projects.is_empty() {
        ui::section("Projects");
        for (name, record) in &state.projects {
            println!(
                "  {} {} {}",
                "✓".green(),
                name.bold(),
                format!("({})", record.id).dimmed()
            );
            if !ctx.quiet {
                match record.retention_days {
                    Some(days) => ui::dim(&format!("    retention: {days} days")),
                    None => ui::dim("    retention: none"),
                }
                if !record.metadata.is_empty() {
                    ui::dim(&format!("    metadata: {} key(s)", record.metadata.len()));
                }
                ui::dim(&format!("    updated: {}", record.updated_at));
            }
        }
    }

    if !state.api_keys.is_empty() {
        ui::section("API Keys");
        for (name, record) in &state.api_keys {
            println!(
                "  {} {} {}",
                "✓".green(),
                name.bold(),
                format!("({})", record.id).dimmed()
            );
            if !ctx.quiet {
                ui::dim(&format!("    project: {}", record.project_id));
                ui::dim(&format!("    public key: {}", record.public_key));
                ui::dim(&format!("    secret: {}", record.display_secret_key));
                if record.secret_key.is_none() {
                    ui::dim("    full secret: not captured");
                }
            }
        }
    }

    println!();
    ui::kv("Last updated", &state.last_updated.to_rfc3339());
    Ok(())
}
