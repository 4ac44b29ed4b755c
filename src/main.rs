mod artifacts;
mod commands;
mod config;
mod context;
mod controller;
mod objects;
mod output;
mod render;
mod sanitize;
mod traits;

use anyhow::Result;
use clap::Parser;
use commands::ExportCommand;
use config::ExportOptions;
use context::Context;
use controller::{AviControllerClient, ExportError, ObjectQuery};
use std::path::Path;
use std::sync::Arc;
use traits::{Output, RealFileSystem, TerminalOutput};

#[derive(Parser, Debug)]
#[command(name = "avi-iac")]
#[command(about = "Export an Avi controller object as Ansible and Terraform artifacts", long_about = None)]
#[command(version)]
struct Cli {
    /// Avi controller IP or hostname
    #[arg(long, env = "AVI_CONTROLLER")]
    controller: String,

    /// Controller username
    #[arg(long, env = "AVI_USERNAME")]
    username: String,

    /// Controller password
    #[arg(long, env = "AVI_PASSWORD", hide_env_values = true)]
    password: String,

    /// Tenant name [default: admin]
    #[arg(long)]
    tenant: Option<String>,

    /// Name of the object
    #[arg(long)]
    name: String,

    /// Object type, e.g. pool or virtualservice
    #[arg(long = "type")]
    object_type: String,

    /// Render an Ansible playbook
    #[arg(long)]
    ansible: bool,

    /// Render Terraform provider, variable and resource files
    #[arg(long)]
    terraform: bool,

    /// Output folder [default: output]
    #[arg(short, long)]
    output: Option<String>,

    /// Controller API version to target [default: 21.1.3]
    #[arg(long)]
    api_version: Option<String>,

    /// YAML file with export options
    #[arg(short, long)]
    config: Option<String>,
}

impl Cli {
    /// Options file (if any) with CLI flags applied on top
    fn options(&self) -> Result<ExportOptions> {
        let mut options = match &self.config {
            Some(path) => ExportOptions::load(&RealFileSystem, Path::new(path))?,
            None => ExportOptions::default(),
        };

        options.ansible |= self.ansible;
        options.terraform |= self.terraform;
        if let Some(tenant) = &self.tenant {
            options.tenant = tenant.clone();
        }
        if let Some(output) = &self.output {
            options.output_dir = output.clone();
        }
        if let Some(version) = &self.api_version {
            options.api_version = version.clone();
        }

        options.validate()?;
        Ok(options)
    }

    fn query(&self, options: &ExportOptions) -> ObjectQuery {
        ObjectQuery {
            controller: self.controller.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            tenant: options.tenant.clone(),
            object_type: self.object_type.clone(),
            name: self.name.clone(),
            api_version: options.api_version.clone(),
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options()?;
    let query = cli.query(&options);

    let ctx = Context::new(Arc::new(AviControllerClient::new()?));
    let summary = ExportCommand::execute(&ctx, &query, &options)?;

    ctx.output.blank();
    ctx.output.success(&format!(
        "Wrote {} file(s) to {}",
        summary.files.len(),
        summary.run_dir.display()
    ));

    Ok(())
}

/// Extra line printed under a fatal error raised while fetching
fn failure_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<ExportError>() {
        Some(export_err) if export_err.is_fetch_failure() => Some(
            "Nothing was written. Check the controller address, the credentials and the object type and name.",
        ),
        _ => None,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        TerminalOutput.error(&format!("{:#}", err));
        if let Some(hint) = failure_hint(&err) {
            TerminalOutput.dimmed(hint);
        }
        std::process::exit(1);
    }
}
