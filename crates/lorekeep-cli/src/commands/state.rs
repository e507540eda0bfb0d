//! Live state commands
//!
//! Handles: lorekeep state show/set

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use lorekeep_core::sync::domains::{is_persisted, PERSISTED_DOMAINS};
use lorekeep_core::sync::{Hydration, LiveState, StateSync};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;

#[derive(Subcommand)]
pub enum StateCommands {
    /// Print the hydrated campaign state
    Show {
        /// Only print this domain
        domain: Option<String>,
    },
    /// Replace one domain with the JSON in a file and persist it
    Set {
        /// Domain name (npcs, quests, campaignName, ...)
        domain: String,
        /// JSON file holding the new value
        file: PathBuf,
    },
}

pub fn execute(ctx: &Context, cmd: StateCommands) -> Result<()> {
    match cmd {
        StateCommands::Show { domain } => execute_show(ctx, domain.as_deref()),
        StateCommands::Set { domain, file } => execute_set(ctx, &domain, &file),
    }
}

fn hydrated(ctx: &Context) -> Result<(StateSync, Hydration)> {
    let sync = StateSync::new(ctx.store.clone(), LiveState::new());
    let outcome = sync.hydrate()?;
    Ok((sync, outcome))
}

fn execute_show(ctx: &Context, domain: Option<&str>) -> Result<()> {
    let (sync, outcome) = hydrated(ctx)?;

    if outcome == Hydration::Empty {
        println!("No campaign state stored.");
        return Ok(());
    }

    let value = match domain {
        Some(name) => {
            check_domain(name)?;
            sync.state().get(name).unwrap_or(Value::Null)
        }
        None => sync.state().to_value(),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn execute_set(ctx: &Context, domain: &str, file: &Path) -> Result<()> {
    check_domain(domain)?;

    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", file.display()))?;

    let (sync, _) = hydrated(ctx)?;
    sync.state().set(domain, value);
    let record = sync.flush()?;

    println!("Updated '{domain}' in campaign '{}'", record.name);
    Ok(())
}

fn check_domain(name: &str) -> Result<()> {
    if !is_persisted(name) {
        let known: Vec<_> = PERSISTED_DOMAINS.iter().map(|(name, _)| *name).collect();
        bail!("Unknown domain '{name}' (expected one of: {})", known.join(", "));
    }
    Ok(())
}
