//! `formcase config` command - Configuration inspection
//!
//! Shows the effective configuration and where it is read from.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("organization", "Azure DevOps organization"),
    ("project", "Azure DevOps project"),
    ("area_path", "Area path applied to every uploaded work item"),
    ("iteration_path", "Iteration path applied to every uploaded work item"),
    ("assigned_to", "Assignee written to the export"),
    ("base_url", "Service root URL (default https://dev.azure.com)"),
    ("batch_size", "Test cases per upload batch (default 1000)"),
    ("settle_delay_ms", "Pause after each test case (default 500)"),
    ("batch_pause_ms", "Pause between batches (default 2000)"),
    ("dry_run_delay_ms", "Simulated work per case in dry runs (default 100)"),
    (
        "include_custom_fields",
        "Send Custom.TestCaseClassification and Custom.FormName (default true)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        if !VALID_KEYS.iter().any(|(k, _)| k == key) {
            return Err(miette::miette!("Unknown configuration key '{}'", key));
        }
        return match get_config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, get_config_value(&config, key).as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags");
    println!("  2. Environment variables (FORMCASE_*)");
    println!("  3. Local config (./formcase.yaml)");
    println!("  4. Global config (~/.config/formcase/config.yaml)");

    Ok(())
}

fn run_path() -> Result<()> {
    let global_path = Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))?;
    let local_path = std::env::current_dir()
        .into_diagnostic()?
        .join(Config::local_config_path());

    println!("{}", style("Configuration file paths:").bold());
    println!();
    print_path("Global:", &global_path)?;
    println!();
    print_path("Local: ", &local_path)?;

    Ok(())
}

fn print_path(label: &str, path: &Path) -> Result<()> {
    println!("  {} {}", style(label).cyan(), path.display());
    if path.exists() {
        let size = fs::metadata(path).into_diagnostic()?.len();
        println!("          {}", style(format!("(exists, {} bytes)", size)).green());
    } else {
        println!("          {}", style("(not created)").dim());
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<24} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Set keys in ./formcase.yaml or the global config file (see 'formcase config path').")
            .dim()
    );

    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "organization" => config.organization.clone(),
        "project" => config.project.clone(),
        "area_path" => config.area_path.clone(),
        "iteration_path" => config.iteration_path.clone(),
        "assigned_to" => config.assigned_to.clone(),
        "base_url" => config.base_url.clone(),
        "batch_size" => config.batch_size.map(|v| v.to_string()),
        "settle_delay_ms" => config.settle_delay_ms.map(|v| v.to_string()),
        "batch_pause_ms" => config.batch_pause_ms.map(|v| v.to_string()),
        "dry_run_delay_ms" => config.dry_run_delay_ms.map(|v| v.to_string()),
        "include_custom_fields" => config.include_custom_fields.map(|v| v.to_string()),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_is_readable() {
        let config = Config {
            organization: Some("o".to_string()),
            project: Some("p".to_string()),
            area_path: Some("a".to_string()),
            iteration_path: Some("i".to_string()),
            assigned_to: Some("u".to_string()),
            base_url: Some("b".to_string()),
            batch_size: Some(1),
            settle_delay_ms: Some(2),
            batch_pause_ms: Some(3),
            dry_run_delay_ms: Some(4),
            include_custom_fields: Some(true),
        };
        for (key, _) in VALID_KEYS {
            assert!(
                get_config_value(&config, key).is_some(),
                "key {} not mapped",
                key
            );
        }
    }
}
