//! `adoload templates` -- show the resolved field mappings per type.

use anyhow::Result;
use serde_json::json;

use adoload_config::{ConfigError, load_parameters};
use adoload_core::client::WorkItemKind;
use adoload_core::template::TemplateSet;
use adoload_core::value::FieldValue;

use crate::cli::TemplatesArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `adoload templates` command.
pub fn run(ctx: &RuntimeContext, args: &TemplatesArgs) -> Result<()> {
    // Parameters only matter here as a template path source.
    let template_path = args.template.clone().or_else(|| {
        match load_parameters(&ctx.config_path) {
            Ok(params) => params.file_paths.template_file,
            Err(ConfigError::NotFound(_)) | Err(ConfigError::MissingParameters(_)) => None,
            Err(_) => None,
        }
    });
    let templates = super::load_templates(template_path.as_deref())?;

    if ctx.json {
        let types: Vec<_> = WorkItemKind::all()
            .into_iter()
            .map(|kind| {
                let template = templates.resolve(kind);
                json!({
                    "type": kind.as_str(),
                    "source": source_label(&templates, kind),
                    "fields": template
                        .fields
                        .iter()
                        .map(|def| {
                            json!({
                                "name": def.display_name,
                                "source_key": def.source_key,
                                "target_path": def.target_path,
                                "value_type": def.value_type.as_str(),
                                "required": def.required,
                                "default": def.default.as_ref().map(FieldValue::to_json),
                            })
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        output_json(&types);
        return Ok(());
    }

    for kind in WorkItemKind::all() {
        let template = templates.resolve(kind);
        println!("{} ({})", kind.as_str(), source_label(&templates, kind));
        let headers = &["FIELD", "SOURCE KEY", "TARGET PATH", "TYPE", "REQUIRED", "DEFAULT"];
        let rows: Vec<Vec<String>> = template
            .fields
            .iter()
            .map(|def| {
                vec![
                    def.display_name.clone(),
                    def.source_key.clone(),
                    def.target_path.clone(),
                    def.value_type.as_str().to_owned(),
                    if def.required { "yes" } else { "" }.to_owned(),
                    def.default
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect();
        output_table(headers, &rows);
        println!();
    }
    Ok(())
}

fn source_label(templates: &TemplateSet, kind: WorkItemKind) -> &'static str {
    if templates.has_override(kind) {
        "template file"
    } else {
        "built-in"
    }
}
