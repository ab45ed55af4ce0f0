//! Command handlers for the `adoload` CLI.

pub mod check;
pub mod run;
pub mod templates_cmd;

use std::path::Path;

use anyhow::{Context, Result};

use adoload_core::record::BacklogPlan;
use adoload_core::template::TemplateSet;

/// Loads the template set from an optional path; no path means built-in
/// defaults for every type. Template errors are fatal before any creation.
pub(crate) fn load_templates(path: Option<&str>) -> Result<TemplateSet> {
    match path {
        Some(path) => TemplateSet::from_path(Path::new(path))
            .with_context(|| format!("failed to load template file '{path}'")),
        None => Ok(TemplateSet::empty()),
    }
}

/// Loads the backlog plan from a file.
pub(crate) fn load_plan(path: &str) -> Result<BacklogPlan> {
    BacklogPlan::from_path(Path::new(path))
        .with_context(|| format!("failed to load plan file '{path}'"))
}
