//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::{style, Term};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::Path;

use crate::cli::ConnectionArgs;
use crate::core::builder::{build, ProcessedCases};
use crate::core::devops::Credentials;
use crate::core::loader::load_table;
use crate::core::Config;

/// Load a requirements CSV and build test cases from it.
///
/// Missing mandatory columns become a diagnostic naming the columns.
pub fn load_and_build(file: &Path) -> Result<ProcessedCases> {
    if !file.exists() {
        return Err(miette::miette!("File not found: {}", file.display()));
    }
    let table = load_table(file).map_err(|e| miette::miette!("{}", e))?;
    build(&table).map_err(|e| {
        miette::miette!(
            help = "The input table needs Custom.TestCaseClassification and Custom.FormName columns",
            "{}",
            e
        )
    })
}

/// Print the data quality warning for forms lacking a Form-Level tier
pub fn warn_null_tiers(processed: &ProcessedCases) {
    if processed.forms_with_null_tier.is_empty() {
        return;
    }
    eprintln!(
        "{} {} form(s) have no Form-Level testing tier; their items keep a blank tier unless set explicitly:",
        style("!").yellow(),
        processed.forms_with_null_tier.len()
    );
    for form in &processed.forms_with_null_tier {
        eprintln!("    {}", style(form).yellow());
    }
}

/// Combine flags, config and an optional prompt into credentials.
///
/// Flags (and their environment variables) win over config values. The
/// token is prompted for only when it is missing, prompting is allowed and
/// stderr is a terminal.
pub fn resolve_credentials(args: &ConnectionArgs, config: &Config) -> Result<Credentials> {
    let organization = args
        .organization
        .clone()
        .or_else(|| config.organization.clone())
        .unwrap_or_default();
    let project = args
        .project
        .clone()
        .or_else(|| config.project.clone())
        .unwrap_or_default();

    let mut token = args.pat.clone().unwrap_or_default();
    if token.trim().is_empty() && !args.no_prompt && Term::stderr().features().is_attended() {
        token = dialoguer::Password::new()
            .with_prompt("Personal access token")
            .allow_empty_password(true)
            .interact()
            .into_diagnostic()?;
    }

    Ok(Credentials::new(organization, project, token))
}

/// Apply connection flags on top of the loaded config
pub fn config_with_connection(args: &ConnectionArgs) -> Config {
    let mut config = Config::load();
    if args.base_url.is_some() {
        config.base_url = args.base_url.clone();
    }
    config
}

/// Write `content` to `path`, reporting where it went
pub fn write_file(path: &Path, content: &str, what: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, content).into_diagnostic()?;
    eprintln!(
        "{} {} written to {}",
        style("✓").green(),
        what,
        style(path.display()).yellow()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credentials_flags_win() {
        let args = ConnectionArgs {
            organization: Some("flag-org".to_string()),
            project: None,
            pat: Some("token".to_string()),
            base_url: None,
            no_prompt: true,
        };
        let config = Config {
            organization: Some("config-org".to_string()),
            project: Some("config-project".to_string()),
            ..Default::default()
        };
        let creds = resolve_credentials(&args, &config).unwrap();
        assert_eq!(creds.organization, "flag-org");
        assert_eq!(creds.project, "config-project");
        assert_eq!(creds.token, "token");
    }

    #[test]
    fn test_resolve_credentials_no_prompt_leaves_token_blank() {
        let args = ConnectionArgs {
            no_prompt: true,
            ..Default::default()
        };
        let creds = resolve_credentials(&args, &Config::default()).unwrap();
        assert!(creds.missing_fields().contains(&"personal access token"));
    }

    #[test]
    fn test_load_and_build_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Custom.TestCaseClassification,Notes\nForm Level,x\n").unwrap();

        let err = load_and_build(&path).unwrap_err();
        assert!(err.to_string().contains("Custom.FormName"));
    }
}
