mod config;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use operation_merge_core::{
    InMemorySchemaRegistry, OperationDescriptor, OperationModel, merge_operation,
    merge_operation_atomic, validate_descriptor,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{MergeConfig, OutputFormat, read_document};

#[derive(Debug, Parser)]
#[command(name = "op-merge")]
#[command(about = "Merge declared operation metadata into an OpenAPI operation model")]
struct Cli {
    /// Path to an op-merge YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge an operation descriptor into an operation model.
    Merge(MergeArgs),
    /// Validate one or more operation descriptor files.
    Validate(ValidateArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Operation descriptor (JSON, or YAML by extension).
    #[arg(long)]
    descriptor: PathBuf,
    /// Existing operation model to merge into (defaults to an empty model).
    #[arg(long)]
    operation: Option<PathBuf>,
    /// Write output to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Output format (overrides config).
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Validate the whole descriptor before merging (overrides config).
    #[arg(long, overrides_with = "no_atomic")]
    atomic: bool,
    /// Merge response by response even if config enables atomic mode.
    #[arg(long, overrides_with = "atomic")]
    no_atomic: bool,
    /// Component reference prefix (overrides config).
    #[arg(long)]
    ref_prefix: Option<String>,
}

impl MergeArgs {
    /// Atomic mode from the last of `--atomic`/`--no-atomic`, else config.
    fn atomic_mode(&self, config: &MergeConfig) -> bool {
        if self.atomic {
            true
        } else if self.no_atomic {
            false
        } else {
            config.atomic
        }
    }
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Descriptor files to validate.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination path for the config file.
    path: PathBuf,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

/// Merged operation together with the components it references.
#[derive(Debug, Serialize)]
struct MergeOutput {
    operation: OperationModel,
    components: Components,
}

#[derive(Debug, Serialize)]
struct Components {
    schemas: BTreeMap<String, Value>,
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(MergeConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("error: failed to load config: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    let result = match cli.command {
        Command::Merge(args) => run_merge(args, &config),
        Command::Validate(args) => run_validate(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(fallback_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_merge(args: MergeArgs, config: &MergeConfig) -> Result<(), String> {
    let descriptor: OperationDescriptor = read_document(&args.descriptor)
        .map_err(|err| format!("Failed to read '{}': {err}", args.descriptor.display()))?;
    let mut model: OperationModel = match &args.operation {
        Some(path) => read_document(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => OperationModel::default(),
    };

    let ref_prefix = args
        .ref_prefix
        .as_deref()
        .unwrap_or(&config.registry.ref_prefix);
    let registry = InMemorySchemaRegistry::with_ref_prefix(ref_prefix);

    let merged = if args.atomic_mode(config) {
        merge_operation_atomic(&registry, &descriptor, &mut model)
    } else {
        merge_operation(&registry, &descriptor, &mut model)
    };
    merged.map_err(|err| format!("Invalid descriptor '{}': {err}", args.descriptor.display()))?;

    info!(
        responses = model.responses.len(),
        schemas = registry.len(),
        "Merged operation descriptor"
    );

    let output = MergeOutput {
        operation: model,
        components: Components {
            schemas: registry.schemas(),
        },
    };
    let format = args.format.unwrap_or(config.output.format);
    let raw = render(&output, format, config.output.pretty)?;

    match &args.output {
        Some(path) => write_output(path, &raw),
        None => {
            println!("{raw}");
            Ok(())
        }
    }
}

fn render(output: &MergeOutput, format: OutputFormat, pretty: bool) -> Result<String, String> {
    let rendered = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(output).map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_string(output).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(output).map_err(|e| e.to_string()),
    };
    rendered.map_err(|err| format!("Failed to serialize merge output: {err}"))
}

fn write_output(path: &Path, raw: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    for path in &args.inputs {
        let descriptor: OperationDescriptor = read_document(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        validate_descriptor(&descriptor)
            .map_err(|err| format!("Invalid descriptor '{}': {err}", path.display()))?;
    }
    println!("Validated {} descriptor file(s).", args.inputs.len());
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            args.path.display()
        ));
    }
    MergeConfig::default()
        .save(&args.path)
        .map_err(|err| format!("Failed to write '{}': {err}", args.path.display()))?;
    println!("Wrote default config to '{}'.", args.path.display());
    Ok(())
}
