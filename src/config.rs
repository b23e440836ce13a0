use std::env;
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::tracker::TrackerKind;
use crate::error::{AppError, AppResult};
use crate::infra::jira::DEFAULT_PARENT_SEARCH_JQL;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_ENV: &str = "TANGLE_CONFIG_DIR";
const JIRA_EMAIL_ENV: &str = "TANGLE_JIRA_EMAIL";
const JIRA_TOKEN_ENV: &str = "TANGLE_JIRA_TOKEN";
const AZURE_TOKEN_ENV: &str = "TANGLE_AZURE_TOKEN";

/// Settings as written to the config file. Every value is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_search_jql: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("dev", "tangle", "tangle")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            AppError::Configuration("could not determine a configuration directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Effective settings for a run: the config file with environment
/// overrides applied.
#[derive(Debug)]
pub struct AppConfig {
    pub jira_email: Option<String>,
    pub jira_token: Option<SecretString>,
    pub azure_token: Option<SecretString>,
    pub acceptance_criteria_field: Option<String>,
    pub parent_search: bool,
    pub parent_search_jql: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(StoredConfig::default(), |_| None)
    }
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::from_sources(stored, |name| env::var(name).ok()))
    }

    pub fn from_sources(stored: StoredConfig, env_lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| env_lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            jira_email: lookup(JIRA_EMAIL_ENV).or(stored.jira_email),
            jira_token: lookup(JIRA_TOKEN_ENV)
                .or(stored.jira_token)
                .map(SecretString::from),
            azure_token: lookup(AZURE_TOKEN_ENV)
                .or(stored.azure_token)
                .map(SecretString::from),
            acceptance_criteria_field: stored.acceptance_criteria_field,
            parent_search: stored.parent_search.unwrap_or(true),
            parent_search_jql: stored
                .parent_search_jql
                .unwrap_or_else(|| DEFAULT_PARENT_SEARCH_JQL.to_string()),
        }
    }

    /// Account name configured for the tracker. Azure tokens need none.
    pub fn user_for(&self, tracker: TrackerKind) -> Option<&str> {
        match tracker {
            TrackerKind::Jira => self.jira_email.as_deref(),
            TrackerKind::Azure => None,
        }
    }

    pub fn token_for(&self, tracker: TrackerKind) -> Option<&SecretString> {
        match tracker {
            TrackerKind::Jira => self.jira_token.as_ref(),
            TrackerKind::Azure => self.azure_token.as_ref(),
        }
    }
}
