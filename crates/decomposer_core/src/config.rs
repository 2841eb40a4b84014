//! Session configuration.
//!
//! # Responsibility
//! - Hold file names, placeholder text and logging settings used by the
//!   session and its callers.
//! - Apply environment overrides on top of built-in defaults.
//!
//! # Invariants
//! - Defaults never depend on the environment.
//! - Blank override values are ignored.

use crate::logging::default_log_level;

pub const ENV_LOG_LEVEL: &str = "DECOMPOSER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DECOMPOSER_LOG_DIR";
pub const ENV_BLANK_LABEL: &str = "DECOMPOSER_BLANK_LABEL";

const DEFAULT_PROJECT_FILE_NAME: &str = "requirements-project.json";
const DEFAULT_TEXT_EXPORT_FILE_NAME: &str = "requirements-export.txt";
const DEFAULT_TABLE_EXPORT_FILE_NAME: &str = "requirements-export.csv";
const DEFAULT_BLANK_CARD_LABEL: &str = "Новая карточка";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Download name for the saved project document.
    pub project_file_name: String,
    /// Download name for the grouped plain-text export.
    pub text_export_file_name: String,
    /// Download name for the tab-separated export.
    pub table_export_file_name: String,
    /// Placeholder label given to unanchored cards.
    pub blank_card_label: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; logging stays off when `None`.
    pub log_dir: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            project_file_name: DEFAULT_PROJECT_FILE_NAME.to_string(),
            text_export_file_name: DEFAULT_TEXT_EXPORT_FILE_NAME.to_string(),
            table_export_file_name: DEFAULT_TABLE_EXPORT_FILE_NAME.to_string(),
            blank_card_label: DEFAULT_BLANK_CARD_LABEL.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(key)` values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(level) = non_blank(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = non_blank(ENV_LOG_DIR) {
            config.log_dir = Some(dir.trim().to_string());
        }
        if let Some(label) = non_blank(ENV_BLANK_LABEL) {
            config.blank_card_label = label;
        }
        config
    }
}
