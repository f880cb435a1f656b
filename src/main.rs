// SPDX-License-Identifier: AGPL-3.0-or-later
//! jenkup: Idempotent Jenkins provisioning for Debian-family hosts
//!
//! CLI entry point. The interesting work lives in the library crate.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jenkup::provision::{ProvisionReport, StepOutcome};
use jenkup::{Config, Provisioner};

/// jenkup: Jenkins provisioning for Debian-family hosts
///
/// Installs a JDK, registers the Jenkins apt repository (signing key plus
/// source list), and installs Jenkins. Idempotent and fail-fast: re-runs
/// skip satisfied steps, and the first failure aborts the sequence.
#[derive(Parser, Debug)]
#[command(name = "jenkup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "jenkup.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Dry run mode (no actual execution)
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the provisioning sequence
    #[command(alias = "up")]
    Provision,

    /// Print the ordered steps without executing them
    Plan,

    /// Report the host's state against the desired end state
    Status,

    /// Show configuration
    Config,

    /// Initialize a new jenkup configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Version => {
            println!("jenkup v{}", env!("CARGO_PKG_VERSION"));
            println!("Idempotent Jenkins provisioning for Debian-family hosts");
            Ok(())
        }

        Commands::Init { force } => init_config(&cli.config, force),

        Commands::Config => show_config(&cli.config),

        Commands::Plan => show_plan(&cli.config, cli.format),

        Commands::Status => show_status(&cli.config, cli.format).await,

        Commands::Provision => provision(&cli.config, cli.dry_run, cli.format).await,
    }
}

/// Initialize a new configuration file
fn init_config(config_path: &PathBuf, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, jenkup::config::default_config_toml())?;
    info!("Created configuration file: {}", config_path.display());
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

/// Show the current configuration
fn show_config(config_path: &PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        let config = Config::default();
        println!("No configuration file found. Using defaults:");
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Print the ordered provisioning steps
fn show_plan(config_path: &PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::from_file_or_default(config_path)?;
    let steps = jenkup::plan(&config);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&steps)?),
        OutputFormat::Text => {
            println!("Provisioning plan ({} steps):", steps.len());
            println!();
            for (index, step) in steps.iter().enumerate() {
                println!("  {}. {}", index + 1, step.describe());
            }
        }
    }

    Ok(())
}

/// Report the host's state against the desired end state
async fn show_status(config_path: &PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::from_file_or_default(config_path)?;
    let provisioner = Provisioner::new(config, false);
    let status = provisioner.status().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => {
            println!("Host status:");
            println!("  JDK installed:      {}", yes_no(status.jdk_installed));
            println!("  Keyring present:    {}", yes_no(status.keyring_present));
            println!("  Source registered:  {}", yes_no(status.source_registered));
            println!("  Jenkins installed:  {}", yes_no(status.jenkins_installed));
            println!();
            if status.is_provisioned() {
                println!("Host is fully provisioned");
            } else {
                println!("Host is not fully provisioned");
            }
        }
    }

    if !status.is_provisioned() {
        std::process::exit(1);
    }

    Ok(())
}

/// Run the provisioning sequence
async fn provision(
    config_path: &PathBuf,
    dry_run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::from_file_or_default(config_path)?;

    // Keep JSON output a single parseable document.
    if format == OutputFormat::Text {
        if dry_run {
            println!("[DRY RUN] Planning provisioning for '{}'", config.name);
        } else {
            println!("Provisioning '{}'", config.name);
        }
    }

    let provisioner = Provisioner::new(config, dry_run);
    let report = provisioner.execute().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    if !report.success {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &ProvisionReport) {
    println!();
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Changed => println!("  changed  {}", step.description),
            StepOutcome::Skipped { reason } => {
                println!("  skipped  {} ({})", step.description, reason)
            }
            StepOutcome::WouldChange => println!("  would    {}", step.description),
            StepOutcome::Failed { error } => {
                println!("  FAILED   {}", step.description);
                println!("           {}", error);
            }
        }
    }

    println!();
    if report.success {
        if report.dry_run {
            println!("Dry run completed, no changes made");
        } else {
            println!("Provisioning completed successfully");
        }
    } else {
        println!("Provisioning aborted after step failure");
    }

    println!();
    println!("Results:");
    println!("  Duration: {} ms", report.total_duration_ms);
    println!("  Steps changed: {}", report.changed);
    println!("  Steps skipped: {}", report.skipped);
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["jenkup", "version"]).unwrap();
        match cli.command {
            Commands::Version => {}
            _ => panic!("Expected Version command"),
        }
    }

    #[test]
    fn test_cli_provision_alias() {
        let cli = Cli::try_parse_from(["jenkup", "up"]).unwrap();
        match cli.command {
            Commands::Provision => {}
            _ => panic!("Expected Provision command"),
        }
    }

    #[test]
    fn test_cli_dry_run_flag() {
        let cli = Cli::try_parse_from(["jenkup", "--dry-run", "provision"]).unwrap();
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_format_flag() {
        let cli = Cli::try_parse_from(["jenkup", "plan", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_init_force_short_flag() {
        // `-f` belongs to init's --force alone; the global --format has no
        // short name, so this must parse instead of tripping clap's
        // unique-short assertion.
        let cli = Cli::try_parse_from(["jenkup", "init", "-f"]).unwrap();
        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_debug_asserts() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
