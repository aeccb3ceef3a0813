//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::devops::{ApiSettings, Overrides, DEFAULT_BASE_URL};
use crate::core::export::ExportOptions;
use crate::core::upload::UploadPolicy;

/// File name of the per-directory config
pub const LOCAL_CONFIG_FILE: &str = "formcase.yaml";

/// formcase configuration with layered hierarchy.
///
/// The personal access token is not part of the file layers; it is only taken from
/// the command line, the environment or an interactive prompt.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Azure DevOps organization
    pub organization: Option<String>,

    /// Azure DevOps project
    pub project: Option<String>,

    /// Area path applied to every uploaded work item
    pub area_path: Option<String>,

    /// Iteration path applied to every uploaded work item
    pub iteration_path: Option<String>,

    /// Assignee written to the export
    pub assigned_to: Option<String>,

    /// Service root (default https://dev.azure.com)
    pub base_url: Option<String>,

    /// Test cases per upload batch
    pub batch_size: Option<usize>,

    /// Pause after each uploaded test case, in milliseconds
    pub settle_delay_ms: Option<u64>,

    /// Pause between batches, in milliseconds
    pub batch_pause_ms: Option<u64>,

    /// Simulated work per test case in dry-run mode, in milliseconds
    pub dry_run_delay_ms: Option<u64>,

    /// Send the classification and form name custom fields
    pub include_custom_fields: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/formcase/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Local config (./formcase.yaml)
        if let Some(local) = Self::read_file(&Self::local_config_path()) {
            config.merge(local);
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "formcase")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path of the config file in the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Parse a YAML config file; unreadable or invalid files are skipped
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                None
            }
        }
    }

    /// Settings from `FORMCASE_*` variables
    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| text(key).and_then(|v| v.trim().parse::<u64>().ok());

        Config {
            organization: text("FORMCASE_ORGANIZATION"),
            project: text("FORMCASE_PROJECT"),
            area_path: text("FORMCASE_AREA_PATH"),
            iteration_path: text("FORMCASE_ITERATION_PATH"),
            assigned_to: text("FORMCASE_ASSIGNED_TO"),
            base_url: text("FORMCASE_BASE_URL"),
            batch_size: number("FORMCASE_BATCH_SIZE").map(|n| n as usize),
            settle_delay_ms: number("FORMCASE_SETTLE_DELAY_MS"),
            batch_pause_ms: number("FORMCASE_BATCH_PAUSE_MS"),
            dry_run_delay_ms: number("FORMCASE_DRY_RUN_DELAY_MS"),
            include_custom_fields: text("FORMCASE_INCLUDE_CUSTOM_FIELDS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            organization,
            project,
            area_path,
            iteration_path,
            assigned_to,
            base_url,
            batch_size,
            settle_delay_ms,
            batch_pause_ms,
            dry_run_delay_ms,
            include_custom_fields
        );
    }

    /// Endpoint settings with configured overrides applied
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ..ApiSettings::default()
        }
    }

    /// Upload pacing with configured overrides applied
    pub fn upload_policy(&self) -> UploadPolicy {
        let mut policy = UploadPolicy::default();
        if let Some(size) = self.batch_size {
            policy.batch_size = size;
        }
        if let Some(ms) = self.settle_delay_ms {
            policy.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.batch_pause_ms {
            policy.batch_pause = Duration::from_millis(ms);
        }
        if let Some(ms) = self.dry_run_delay_ms {
            policy.dry_run_delay = Duration::from_millis(ms);
        }
        if let Some(include) = self.include_custom_fields {
            policy.include_custom_fields = include;
        }
        policy
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            area_path: self.area_path.clone(),
            iteration_path: self.iteration_path.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            assigned_to: self.assigned_to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            organization: Some("base-org".to_string()),
            project: Some("base-project".to_string()),
            ..Default::default()
        };
        base.merge(Config {
            organization: Some("override-org".to_string()),
            batch_size: Some(50),
            ..Default::default()
        });

        assert_eq!(base.organization.as_deref(), Some("override-org"));
        assert_eq!(base.project.as_deref(), Some("base-project"));
        assert_eq!(base.batch_size, Some(50));
    }

    #[test]
    fn test_from_env() {
        let vars: HashMap<&str, &str> = [
            ("FORMCASE_ORGANIZATION", "contoso"),
            ("FORMCASE_PROJECT", " "),
            ("FORMCASE_SETTLE_DELAY_MS", "0"),
            ("FORMCASE_BATCH_SIZE", "not-a-number"),
            ("FORMCASE_INCLUDE_CUSTOM_FIELDS", "false"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.organization.as_deref(), Some("contoso"));
        assert_eq!(config.project, None);
        assert_eq!(config.settle_delay_ms, Some(0));
        assert_eq!(config.batch_size, None);
        assert_eq!(config.include_custom_fields, Some(false));
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = "organization: contoso\nbatch_size: 250\ndry_run_delay_ms: 0\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.organization.as_deref(), Some("contoso"));
        assert_eq!(config.batch_size, Some(250));
        assert_eq!(config.dry_run_delay_ms, Some(0));
    }

    #[test]
    fn test_upload_policy_overrides() {
        let config = Config {
            batch_size: Some(10),
            settle_delay_ms: Some(0),
            include_custom_fields: Some(false),
            ..Default::default()
        };
        let policy = config.upload_policy();
        assert_eq!(policy.batch_size, 10);
        assert_eq!(policy.settle_delay, Duration::ZERO);
        assert_eq!(policy.batch_pause, UploadPolicy::default().batch_pause);
        assert!(!policy.include_custom_fields);
    }

    #[test]
    fn test_api_settings_base_url() {
        assert_eq!(Config::default().api_settings().base_url, DEFAULT_BASE_URL);
        let config = Config {
            base_url: Some("https://tfs.example.org/tfs".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_settings().base_url, "https://tfs.example.org/tfs");
    }
}
