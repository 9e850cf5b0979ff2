//! # Dispatch Core Configuration Validator
//!
//! Command-line tool for validating dispatch core configuration files across
//! environments before an embedding process starts with them.

use clap::{Parser, Subcommand};
use dispatch_core::config::{ConfigManager, CoreConfig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate dispatch core configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment overlay to apply (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate all configuration sections
    All,

    /// Validate and summarize a single section
    Component {
        /// Section name (dispatch, admission, rate_limit, policy, circuit_breakers, checkpoint, routing)
        name: String,
    },

    /// Print the merged configuration as JSON
    Show,

    /// List environment overlays found in the configuration directory
    Environments,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Component { name }) => validate_component(&cli, name),
        Some(Commands::Show) => show_config(&cli),
        Some(Commands::Environments) => list_environments(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<Arc<ConfigManager>, Box<dyn std::error::Error>> {
    Ok(ConfigManager::load_from_directory_with_env(
        cli.config_dir.clone(),
        &cli.environment,
    )?)
}

fn validate_all_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating dispatch core configuration");
    println!("Environment: {}", cli.environment);
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }
    println!();

    let manager = match load(cli) {
        Ok(manager) => {
            println!("  ok  configuration loaded and validated");
            manager
        }
        Err(e) => {
            println!("  FAIL {e}");
            return Err(e);
        }
    };

    for section in SECTIONS {
        print_section(manager.config(), section)?;
    }

    println!("\nAll configuration validation checks passed");
    Ok(())
}

const SECTIONS: [&str; 7] = [
    "dispatch",
    "admission",
    "rate_limit",
    "policy",
    "circuit_breakers",
    "checkpoint",
    "routing",
];

fn validate_component(cli: &Cli, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let manager = load(cli)?;
    let section = name.to_lowercase().replace('-', "_");
    print_section(manager.config(), &section)?;
    println!("Section '{section}' validation passed");
    Ok(())
}

fn print_section(config: &CoreConfig, section: &str) -> Result<(), Box<dyn std::error::Error>> {
    match section {
        "dispatch" => println!(
            "  dispatch: default_capacity={} base_rate={} service_minutes={}",
            config.dispatch.default_capacity,
            config.dispatch.base_rate,
            config.dispatch.service_minutes
        ),
        "admission" => println!(
            "  admission: hard_limit={} warn_ratio={} emergency_ratio={}",
            config.admission.hard_limit,
            config.admission.warn_ratio,
            config.admission.emergency_ratio
        ),
        "rate_limit" => {
            if config.rate_limit.enabled {
                println!(
                    "  rate_limit: capacity={} refill_per_second={}",
                    config.rate_limit.capacity, config.rate_limit.refill_per_second
                );
            } else {
                println!("  rate_limit: disabled");
            }
        }
        "policy" => println!(
            "  policy: sensitivity={} streaks watch={} restricted={} halted={}",
            config.policy.sensitivity,
            config.policy.watch_streak,
            config.policy.restricted_streak,
            config.policy.halted_streak
        ),
        "circuit_breakers" => {
            let breakers = &config.circuit_breakers;
            if breakers.enabled {
                println!(
                    "  circuit_breakers: failure_threshold={} success_threshold={} open_timeout={}s overrides={}",
                    breakers.default_config.failure_threshold,
                    breakers.default_config.success_threshold,
                    breakers.default_config.open_timeout_seconds,
                    breakers.component_configs.len()
                );
            } else {
                println!("  circuit_breakers: disabled");
            }
        }
        "checkpoint" => println!("  checkpoint: interval={}", config.checkpoint.interval),
        "routing" => println!("  routing: transit_speed={}", config.routing.transit_speed),
        other => return Err(format!("Unknown section: {other}").into()),
    }
    Ok(())
}

fn show_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let manager = load(cli)?;
    println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
    Ok(())
}

fn list_environments(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("config"));

    if !config_dir.is_dir() {
        println!("Configuration directory not found: {}", config_dir.display());
        return Ok(());
    }

    let mut environments = Vec::new();
    for entry in std::fs::read_dir(&config_dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if let Some(env) = name
            .strip_prefix("dispatch-core.")
            .and_then(|rest| rest.strip_suffix(".toml"))
        {
            environments.push(env.to_string());
        }
    }
    environments.sort();

    println!("Environment overlays in {}:", config_dir.display());
    for env in environments {
        println!("  - {env}");
    }
    Ok(())
}
