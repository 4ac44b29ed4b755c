use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::artifacts::{ArtifactWriter, RenderedArtifact, safe_file_stem};
use crate::config::ExportOptions;
use crate::context::Context;
use crate::controller::ObjectQuery;
use crate::objects::ObjectCollection;
use crate::render::{AnsibleTaskBuilder, TerraformResourceBuilder};
use crate::sanitize::Sanitizer;

/// Result of one export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub run_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Handles the export: fetch one object, sanitize it and write the requested artifacts
pub struct ExportCommand;

impl ExportCommand {
    /// Execute the export, stamping the run directory with the local fetch time
    pub fn execute(
        ctx: &Context,
        query: &ObjectQuery,
        options: &ExportOptions,
    ) -> Result<ExportSummary> {
        Self::execute_with_clock(ctx, query, options, Local::now)
    }

    pub fn execute_with_clock<F>(
        ctx: &Context,
        query: &ObjectQuery,
        options: &ExportOptions,
        clock: F,
    ) -> Result<ExportSummary>
    where
        F: FnOnce() -> DateTime<Local>,
    {
        options.validate()?;

        ctx.output.section("Export Controller Object");
        ctx.output.key_value("Controller", &query.controller);
        ctx.output.key_value("Tenant", &query.tenant);
        ctx.output.key_value("Object", &format!("{} {}", query.api_path(), query.name));

        // Step 1: Fetch. Any failure aborts before anything is written.
        let raw = ctx.fetcher.fetch(query).with_context(|| {
            format!("Failed to fetch {} '{}' from {}", query.api_path(), query.name, query.controller)
        })?;
        let fetched_at = clock();
        ctx.output.success(&format!("Fetched {} '{}'", query.api_path(), query.name));

        // Step 2: Sanitize
        let sanitizer = Sanitizer::new(options.skip_fields.clone());
        let skip = sanitizer.skip_fields();
        if !skip.is_empty() {
            ctx.output.info(&format!(
                "Stripping {} field name(s): {}",
                skip.len(),
                skip.iter().collect::<Vec<_>>().join(", ")
            ));
        }
        let objects = ObjectCollection::single(query.api_path(), sanitizer.sanitize(&raw));

        // Step 3: Render every requested artifact in memory
        let artifacts = Self::render(query, options, &objects)?;

        // Step 4: Write
        let writer = ArtifactWriter::new(&*ctx.fs, Path::new(&options.output_dir), &fetched_at);
        let files = writer.write_all(&artifacts)?;

        ctx.output.blank();
        for (artifact, path) in artifacts.iter().zip(&files) {
            ctx.output.artifact(artifact.kind, &path.display().to_string());
        }

        if !options.ansible && !options.terraform {
            ctx.output.blank();
            ctx.output.warning(
                "Only the sanitized object was written. Pass --ansible or --terraform to render IaC artifacts.",
            );
        }

        Ok(ExportSummary {
            run_dir: writer.run_dir().to_path_buf(),
            files,
        })
    }

    fn render(
        query: &ObjectQuery,
        options: &ExportOptions,
        objects: &ObjectCollection,
    ) -> Result<Vec<RenderedArtifact>> {
        let stem = format!(
            "{}_{}",
            safe_file_stem(&query.api_path()),
            safe_file_stem(&query.name)
        );
        let mut artifacts = vec![RenderedArtifact::json(
            "raw",
            format!("{}.json", stem),
            &objects.to_json(),
        )?];

        if options.ansible {
            let playbook = AnsibleTaskBuilder::new(&options.module_prefix).build_playbook(objects);
            artifacts.push(RenderedArtifact::yaml("playbook", format!("{}.yml", stem), &playbook)?);
        }

        if options.terraform {
            let set = TerraformResourceBuilder::new(
                &options.module_prefix,
                &options.provider_source,
                options.provider_version(),
            )
            .with_version_default(&options.api_version)
            .with_tenant(&options.tenant)
            .build(objects);

            for (kind, file_name, document) in [
                ("provider", "provider.tf.json", set.provider_document()),
                ("variables", "variables.tf.json", set.variables_document()),
                ("resource", "resource.tf.json", set.resource_document()),
            ] {
                artifacts.push(RenderedArtifact::json(kind, file_name, &document)?);
            }
        }

        Ok(artifacts)
    }
}
