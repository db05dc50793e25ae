//! Example: List projects
//!
//! Run with: cargo run -p gateway --example list_projects
//!
//! Expects LUMETRY_API_HOST, LUMETRY_PUBLIC_KEY and LUMETRY_SECRET_KEY
//! to be set in the environment.

use gateway::{Credentials, HttpRemote, Remote};

fn main() {
    let credentials = match Credentials::resolve(None, None, None) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let remote = HttpRemote::new(&credentials);

    match remote.list_projects() {
        Ok(projects) => {
            println!("{} project(s)", projects.len());
            for project in projects {
                let retention = project
                    .retention_days
                    .map(|d| format!("{d} days"))
                    .unwrap_or_else(|| "none".to_string());
                println!("  {} ({}) retention: {}", project.name, project.id, retention);
            }
        }
        Err(e) => {
            eprintln!("Listing failed: {}", e);
            std::process::exit(1);
        }
    }
}
