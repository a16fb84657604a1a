//! qcdriver CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qcdriver_config::{load_config, DriverConfig};
use qcdriver_options::OptionValue;
use qcdriver_plugin_api::{CheckpointBackend, ProcessResources};
use qcdriver_plugin_runtime::{canonical_name, PluginLoader};
use qcdriver_runtime::{DynamicOrchestrator, Orchestrator};
use qcdriver_scripting::ScriptEngine;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qcdriver")]
#[command(about = "Module orchestration runtime for computational chemistry drivers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a driver script
    Run {
        /// Path to the driver script
        script: PathBuf,

        /// Path to configuration file
        #[arg(short, long, env = "QCDRIVER_CONFIG")]
        config: Option<PathBuf>,

        /// Log level (trace, debug, info, warn, error); overrides the config
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "qcdriver.yaml")]
        config: PathBuf,
    },

    /// Print option defaults, globally or for one module
    Options {
        /// Module whose options to print
        module: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            config,
            log_level,
        } => {
            let config = match config {
                Some(path) => load_config(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => DriverConfig::default(),
            };
            init_tracing(log_level.as_deref().unwrap_or(&config.log_level))?;

            tracing::info!(script = %script.display(), "Starting qcdriver");
            run_script(&script, &config)
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Memory: {} bytes", cfg.memory);
                    tracing::info!("  Threads: {}", cfg.n_threads);
                    tracing::info!("  Scratch: {}", cfg.scratch_dir.display());
                    tracing::info!("  Plugins: {}", cfg.plugins.len());
                    tracing::info!("  Options: {}", cfg.options.len());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Options { module } => {
            let mut orchestrator = Orchestrator::builder().build();
            match module {
                Some(name) => {
                    orchestrator.set_default_options_for_module(&name)?;
                    print!("{}", orchestrator.options().print());
                    print!("{}", orchestrator.options().print_globals());
                }
                None => print!("{}", orchestrator.options().print_globals()),
            }
            Ok(())
        }

        Commands::Version => {
            println!("qcdriver");
            println!("Version: {}", qcdriver_runtime::VERSION);
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

/// Build the orchestrator from `config`, run the script, and close every plugin
fn run_script(script: &Path, config: &DriverConfig) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let engine = ScriptEngine::new(orchestrator);

    let result = engine.run_file(script);
    let closed = engine.finish();
    tracing::info!(closed, "Plugins closed");

    let value = result.with_context(|| format!("running {}", script.display()))?;
    if !value.is_unit() {
        tracing::info!(result = %value, "Script finished");
    }
    Ok(())
}

fn build_orchestrator(config: &DriverConfig) -> Result<DynamicOrchestrator> {
    let mut resources = ProcessResources::local(&config.scratch_dir, config.namespace.as_str());
    resources.checkpoint = CheckpointBackend::new(config.checkpoint_path());

    let mut orchestrator = Orchestrator::builder()
        .resources(resources)
        .memory(config.memory)
        .n_threads(config.n_threads)
        .build();
    configure(&mut orchestrator, config)?;
    Ok(orchestrator)
}

/// Preload the configured plugins, then apply the configured global options
fn configure<L: PluginLoader>(
    orchestrator: &mut Orchestrator<L>,
    config: &DriverConfig,
) -> Result<()> {
    let mut plugins = Vec::with_capacity(config.plugins.len());
    for plugin in &config.plugins {
        let status = orchestrator
            .plugin_load(plugin)
            .with_context(|| format!("preloading plugin {}", plugin.display()))?;
        tracing::debug!(plugin = %plugin.display(), ?status, "Plugin preloaded");
        plugins.push(canonical_name(plugin)?);
    }

    for (key, value) in &config.options {
        apply_global_option(orchestrator, &plugins, key, value)
            .with_context(|| format!("applying option {key}"))?;
    }
    Ok(())
}

/// Set `key` globally
///
/// A key only a preloaded plugin declares is set while that plugin is the
/// current module, since the store copies local declarations from there.
fn apply_global_option<L: PluginLoader>(
    orchestrator: &mut Orchestrator<L>,
    plugins: &[String],
    key: &str,
    value: &OptionValue,
) -> Result<()> {
    let options = orchestrator.options();
    let owner = if options.get_global(key).is_ok() {
        None
    } else {
        plugins
            .iter()
            .find(|name| options.get_local(name, key).is_some())
            .cloned()
    };

    let Some(owner) = owner else {
        return Ok(orchestrator.set_global_option(key, value.clone())?);
    };

    let options = orchestrator.environment_mut().options_mut();
    let previous = options.current_module().to_string();
    options.set_current_module(owner);
    let result = orchestrator.set_global_option(key, value.clone());
    orchestrator
        .environment_mut()
        .options_mut()
        .set_current_module(previous);
    Ok(result?)
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(filter.into())
                // Script output is always shown
                .add_directive("qcdriver::output=info".parse()?),
        )
        .init();

    Ok(())
}
