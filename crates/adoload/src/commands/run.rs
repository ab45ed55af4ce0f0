//! `adoload run` -- create every work item in the plan.

use anyhow::{Context, Result, bail};

use adoload_azure::AzureClient;
use adoload_config::load_parameters;
use adoload_core::loader::HierarchyLoader;
use adoload_core::markup::{BasicHtml, MarkupRenderer, PlainText};
use adoload_core::payload::BuildOptions;

use crate::cli::RunArgs;
use crate::context::RuntimeContext;
use crate::output::{ResultView, output_json, print_report};

/// Execute the `adoload run` command.
pub fn run(ctx: &RuntimeContext, args: &RunArgs) -> Result<()> {
    let params = load_parameters(&ctx.config_path).with_context(|| {
        format!(
            "failed to load run configuration from '{}'",
            ctx.config_path.display()
        )
    })?;

    // Template errors abort here, before anything is created.
    let template_path = args
        .template
        .as_deref()
        .or(params.file_paths.template_file.as_deref());
    let templates = super::load_templates(template_path)?;

    let plan_path = args.plan.as_deref().unwrap_or(&params.file_paths.plan_file);
    let plan = super::load_plan(plan_path)?;

    if !ctx.quiet && !ctx.json {
        println!("Organization: {}", params.azure_devops.organization_url);
        println!("Project:      {}", params.azure_devops.project);
        println!("Plan:         {}", plan_path);
        println!(
            "Template:     {}",
            template_path.unwrap_or("(built-in defaults)")
        );
        println!(
            "Markdown:     {}",
            if params.formatting.enable_markdown {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("Token:        {}", params.masked_token());
        println!();
    }

    let renderer: Box<dyn MarkupRenderer> = if params.formatting.enable_markdown {
        Box::new(BasicHtml)
    } else {
        Box::new(PlainText)
    };
    let options = BuildOptions {
        area_path: params.azure_devops.area_path.clone(),
        iteration_path: params.azure_devops.iteration_path.clone(),
        ..BuildOptions::default()
    };

    let mut client = AzureClient::new(
        &params.azure_devops.organization_url,
        &params.azure_devops.project,
        &params.azure_devops.personal_access_token,
    );

    let mut loader = HierarchyLoader::new(&templates, &options, renderer.as_ref(), &mut client);
    let report = loader.run(&plan);

    if ctx.json {
        let views: Vec<ResultView> = report.results.iter().map(ResultView::from_result).collect();
        output_json(&views);
    } else if !ctx.quiet {
        print_report(&report);
    }

    if report.failed() {
        bail!("every top-level feature failed; no hierarchy was created");
    }
    Ok(())
}
