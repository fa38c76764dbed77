use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fieldscope_core::{LabelMap, Namespace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FIELDSCOPE_DIR_NAME: &str = ".fieldscope";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FieldscopeConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub subscriptions: SubscriptionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Opaque presentation options, forwarded into reports as-is.
    #[serde(default)]
    pub display_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubscriptionsConfig {
    #[serde(default)]
    pub labels: LabelMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

pub fn fieldscope_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(FIELDSCOPE_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    fieldscope_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<FieldscopeConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(FieldscopeConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: FieldscopeConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<FieldscopeConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(fieldscope_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = FieldscopeConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

/// Non-fatal problems worth surfacing to the operator.
pub fn validate_config(config: &FieldscopeConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for (sub_id, label) in &config.subscriptions.labels {
        if let Some(previous) = seen.insert(label.as_str(), sub_id.as_str()) {
            warnings.push(ConfigWarning {
                code: "duplicate_label",
                message: format!(
                    "subscriptions '{previous}' and '{sub_id}' share the label '{label}'; ordering falls back to the raw id"
                ),
            });
        }
    }

    for option in &config.report.display_options {
        if let Some(name) = option.strip_prefix("namespace:") {
            if name.parse::<Namespace>().is_err() {
                warnings.push(ConfigWarning {
                    code: "unknown_namespace",
                    message: format!("display option '{option}' names an unknown namespace"),
                });
            }
        }
    }

    warnings
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}

fn normalize_config(mut config: FieldscopeConfig) -> FieldscopeConfig {
    config.report.display_options = config
        .report
        .display_options
        .into_iter()
        .map(|option| option.trim().to_owned())
        .filter(|option| !option.is_empty())
        .collect();

    config.subscriptions.labels = config
        .subscriptions
        .labels
        .into_iter()
        .map(|(sub_id, label)| (sub_id, label.trim().to_owned()))
        .filter(|(_, label)| !label.is_empty())
        .collect();

    let level = config.logging.level.trim();
    if level.is_empty() {
        config.logging.level = default_log_level();
    } else {
        config.logging.level = level.to_owned();
    }

    config
}
