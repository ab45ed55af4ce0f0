//! `adoload check` -- validate a plan without touching Azure DevOps.
//!
//! Every node is visited independently: a parent whose payload fails to
//! build does not suppress checking of its children, unlike `run` where
//! the subtree would be skipped.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use adoload_config::{ConfigError, Parameters, load_parameters};
use adoload_core::client::WorkItemKind;
use adoload_core::markup::PlainText;
use adoload_core::payload::{BuildOptions, PayloadBuilder, WorkItemPayload};
use adoload_core::record::InputRecord;
use adoload_core::template::TemplateSet;

use crate::cli::CheckArgs;
use crate::context::RuntimeContext;
use crate::output::{indent_for, output_json};

#[derive(Serialize)]
struct CheckEntry {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    payload: WorkItemPayload,
}

/// Execute the `adoload check` command.
pub fn run(ctx: &RuntimeContext, args: &CheckArgs) -> Result<()> {
    // A missing or incomplete parameters file is fine here as long as a
    // plan path is available; check never needs credentials.
    let params = load_lenient(&ctx.config_path)?;

    let template_path = args
        .template
        .as_deref()
        .or(params.file_paths.template_file.as_deref());
    let templates = super::load_templates(template_path)?;

    let plan_path = match args.plan.as_deref() {
        Some(path) => path,
        None if !params.file_paths.plan_file.is_empty() => &params.file_paths.plan_file,
        None => bail!("no plan file: pass --plan or set file_paths.plan_file in the parameters file"),
    };
    let plan = super::load_plan(plan_path)?;

    let options = BuildOptions {
        area_path: params.azure_devops.area_path.clone(),
        iteration_path: params.azure_devops.iteration_path.clone(),
        ..BuildOptions::default()
    };
    let renderer = PlainText;
    let builder = PayloadBuilder::new(&options, &renderer);

    let mut entries = Vec::new();
    for feature in &plan.features {
        walk(&builder, &templates, WorkItemKind::Feature, feature, &mut entries);
    }

    let failed = entries.iter().filter(|e| !e.ok).count();

    if ctx.json {
        output_json(&entries);
    } else if !ctx.quiet {
        for entry in &entries {
            let kind = kind_of(entry);
            let status = if entry.ok { "ok" } else { "FAILED" };
            println!(
                "{}{:<6} {} '{}' ({} fields)",
                indent_for(kind),
                status,
                entry.kind,
                entry.title,
                entry.payload.len()
            );
            for error in &entry.errors {
                println!("{}       {}", indent_for(kind), error);
            }
        }
        println!("\n{} checked, {} failed", entries.len(), failed);
    }

    if failed > 0 {
        bail!("payload build failed for {failed} of {} nodes", entries.len());
    }
    Ok(())
}

fn walk(
    builder: &PayloadBuilder<'_>,
    templates: &TemplateSet,
    kind: WorkItemKind,
    record: &InputRecord,
    entries: &mut Vec<CheckEntry>,
) {
    let outcome = builder.build(record, &templates.resolve(kind));
    entries.push(CheckEntry {
        kind: kind.as_str().to_owned(),
        title: record.title().unwrap_or("(untitled)").to_owned(),
        ok: !outcome.is_failed(),
        errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
        payload: outcome.payload,
    });

    if let (Some(key), Some(child_kind)) = (kind.child_key(), kind.child_kind()) {
        for child in record.children(key) {
            walk(builder, templates, child_kind, &child, entries);
        }
    }
}

fn kind_of(entry: &CheckEntry) -> WorkItemKind {
    WorkItemKind::all()
        .into_iter()
        .find(|k| k.as_str() == entry.kind)
        .unwrap_or(WorkItemKind::Feature)
}

/// Loads parameters without requiring the file to exist or validate; the
/// plan path may still come from `--plan`.
fn load_lenient(path: &Path) -> Result<Parameters> {
    match load_parameters(path) {
        Ok(params) => Ok(params),
        Err(ConfigError::NotFound(_)) | Err(ConfigError::MissingParameters(_)) => {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read '{}'", path.display()))?;
                let mut params = Parameters::from_str(&content)
                    .with_context(|| format!("failed to parse '{}'", path.display()))?;
                params.apply_env();
                if let Some(base) = path.parent() {
                    params.resolve_paths(base);
                }
                Ok(params)
            } else {
                Ok(Parameters::default())
            }
        }
        Err(err) => Err(err).with_context(|| {
            format!("failed to load parameters from '{}'", path.display())
        }),
    }
}
