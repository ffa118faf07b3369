//! fabric-drift: network fabric topology import, drift detection and
//! cluster reconciliation.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use fabric_drift::{
    cli::{self, exit_codes},
    codec::FormatKind,
    config::{self, AppConfig, ConfigPreset, Validatable},
    reconcile::parse_duration,
    reports::ReportFormat,
    FabricDriftError,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fabric-drift")]
#[command(version)]
#[command(about = "Fabric topology import, drift detection and cluster reconciliation", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Clean: valid import, no drift, or reconciliation satisfied
    1  Invalid capacity, drift detected, or reconciliation not satisfied
    3  Error occurred

EXAMPLES:
    # Reconstruct the fabric spec of a legacy layout
    fabric-drift import state/lab/fgd

    # Fail only on breaking differences between two save cycles
    fabric-drift diff before/manifests after/manifests --classify

    # Re-encode a legacy layout as manifests
    fabric-drift convert state/lab/fgd --to manifest --out state

    # Wait for a run's resources to appear, at most 5 minutes
    fabric-drift reconcile expected.yaml --run-id 42 --timeout 5m")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "FABRIC_DRIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Start from a named preset instead of a config file (default, strict, lenient)
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Report output options shared by the reporting subcommands
#[derive(clap::Args)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, default_value = "summary")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `import` subcommand
#[derive(Parser)]
struct ImportArgs {
    /// Layout directory (legacy or manifest)
    path: PathBuf,

    /// Also write the reconstructed spec as YAML
    #[arg(long)]
    spec_file: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the `diff` subcommand
#[derive(Parser)]
struct DiffArgs {
    /// Baseline: a layout directory or a manifest file
    baseline: PathBuf,

    /// Compared side: a layout directory or a manifest file
    compared: PathBuf,

    /// Classify differences; exit 1 only on breaking ones
    #[arg(long)]
    classify: bool,

    #[command(flatten)]
    output: OutputArgs,
}

/// Arguments for the `convert` subcommand
#[derive(Parser)]
struct ConvertArgs {
    /// Source layout directory
    source: PathBuf,

    /// Target format (fgd, manifest)
    #[arg(long)]
    to: FormatKind,

    /// State base directory
    #[arg(long)]
    out: PathBuf,

    /// Fabric name (defaults to the decoded name)
    #[arg(long)]
    fabric: Option<String>,
}

/// Arguments for the `reconcile` subcommand
#[derive(Parser)]
struct ReconcileArgs {
    /// Expected resources: a layout directory or a manifest file
    expected: PathBuf,

    /// Run identifier; scopes the namespace and label selector
    #[arg(long, env = "FABRIC_DRIFT_RUN_ID")]
    run_id: String,

    /// Compare against this layout or manifest file instead of the cluster
    #[arg(long)]
    actual: Option<PathBuf>,

    /// Overall deadline (e.g. 90s, 5m)
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Override the configured attempt budget
    #[arg(long)]
    max_attempts: Option<u32>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a fabric spec from a persisted layout and validate capacity
    Import(ImportArgs),

    /// Compare two resource sets
    Diff(DiffArgs),

    /// Re-encode a layout in another format
    Convert(ConvertArgs),

    /// Poll the cluster until a run's expected resources exist
    Reconcile(ReconcileArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the discovered config file
    Path,
    /// Generate an example .fabric-drift.yaml in the current directory
    Init,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = if let Some(name) = &cli.preset {
        let preset = ConfigPreset::from_name(name).with_context(|| {
            let names: Vec<&str> = ConfigPreset::all().iter().map(ConfigPreset::name).collect();
            format!("unknown preset '{name}' (expected one of {})", names.join(", "))
        })?;
        AppConfig::from_preset(preset)
    } else {
        match config::discover_config_file(cli.config.as_deref()) {
            Some(path) => {
                let config = config::load_config_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                tracing::debug!("Loaded config from {}", path.display());
                config
            }
            None => AppConfig::default(),
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let listed: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(FabricDriftError::config(format!("\n  {}", listed.join("\n  "))).into());
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Import(args) => {
            let config = load_config(&cli)?;
            cli::run_import(
                &cli::ImportCommand {
                    path: args.path.clone(),
                    format: args.output.output,
                    output_file: args.output.output_file.clone(),
                    spec_file: args.spec_file.clone(),
                    no_color: cli.no_color,
                    quiet: cli.quiet,
                },
                &config,
            )
        }

        Commands::Diff(args) => {
            let config = load_config(&cli)?;
            cli::run_diff(
                &cli::DiffCommand {
                    baseline: args.baseline.clone(),
                    compared: args.compared.clone(),
                    classify: args.classify,
                    format: args.output.output,
                    output_file: args.output.output_file.clone(),
                    no_color: cli.no_color,
                    quiet: cli.quiet,
                },
                &config,
            )
        }

        Commands::Convert(args) => {
            let config = load_config(&cli)?;
            let written = cli::run_convert(
                &cli::ConvertCommand {
                    source: args.source.clone(),
                    to: args.to,
                    out: args.out.clone(),
                    fabric: args.fabric.clone(),
                    quiet: cli.quiet,
                },
                &config,
            )?;
            if !cli.quiet {
                println!("{}", written.display());
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Reconcile(args) => {
            let config = load_config(&cli)?;
            cli::run_reconcile(
                &cli::ReconcileCommand {
                    expected: args.expected.clone(),
                    run_id: args.run_id.clone(),
                    actual: args.actual.clone(),
                    timeout: args.timeout,
                    max_attempts: args.max_attempts,
                    format: args.output.output,
                    output_file: args.output.output_file.clone(),
                    no_color: cli.no_color,
                    quiet: cli.quiet,
                },
                &config,
            )
        }

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "fabric-drift", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema().context("failed to render schema")?;
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => {
            match action {
                ConfigAction::Show => {
                    let config = load_config(&cli)?;
                    let yaml =
                        serde_yaml::to_string(&config).context("failed to serialize config")?;
                    print!("{yaml}");
                }
                ConfigAction::Path => match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                },
                ConfigAction::Init => {
                    let target = std::env::current_dir()
                        .context("cannot determine current directory")?
                        .join(".fabric-drift.yaml");
                    if target.exists() {
                        anyhow::bail!(
                            "{} already exists. Remove it first to re-initialize.",
                            target.display()
                        );
                    }
                    std::fs::write(&target, config::generate_example_config())
                        .with_context(|| format!("failed to write {}", target.display()))?;
                    eprintln!("Created {}", target.display());
                }
            }
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Log filter used when `RUST_LOG` is unset. `--verbose` wins over `--quiet`.
fn default_log_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| default_log_level(cli.verbose, cli.quiet).to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
