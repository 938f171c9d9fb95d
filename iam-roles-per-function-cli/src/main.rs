// CLI for running the roles-per-function transformation outside the host framework

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use iam_roles_per_function_transform::{
    configuration_schema, RolesPerFunctionService, ServerlessNaming, ServiceDefinition, Template,
};
use log::{debug, info, LevelFilter};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "iam-roles-per-function")]
#[command(version, about = "Give every function in a compiled deployment template its own IAM role", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a compiled template so functions declaring iamRoleStatements get their own role
    Transform {
        /// Materialized service definition (JSON)
        #[arg(short, long)]
        service: PathBuf,

        /// Compiled template (JSON)
        #[arg(short, long)]
        template: PathBuf,

        /// Where to write the rewritten template, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the rewritten template
        #[arg(long)]
        pretty: bool,
    },

    /// Print the JSON Schema of the configuration keys this tool recognizes
    Schema,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()))
        .format_timestamp_millis()
        .init();
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {} as JSON", path.display()))
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn transform(service: &Path, template: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let service = ServiceDefinition::from_value(read_json(service)?)
        .context("Invalid service definition")?;
    let mut template =
        Template::from_value(read_json(template)?).context("Invalid compiled template")?;

    let naming = ServerlessNaming::new(service.service.clone(), service.provider.stage.clone());
    let engine = RolesPerFunctionService::new(&service, &naming)?;
    for hook in engine.hooks() {
        engine
            .run_hook(*hook, &mut template)
            .with_context(|| format!("Lifecycle hook '{hook}' failed"))?;
    }

    let rendered = render(&template.into_value(), pretty)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote rewritten template to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Transform {
            service,
            template,
            output,
            pretty,
        } => transform(&service, &template, output.as_deref(), pretty),
        Commands::Schema => {
            debug!("Rendering configuration schema");
            println!("{}", render(&configuration_schema(), true)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
