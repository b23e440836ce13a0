use clap::{Args, Subcommand};

use crate::cmd::prompt::{PromptAction, prompt_update};
use crate::config::{StoredConfig, config_file_path};
use crate::domain::fields::DEFAULT_JIRA_ACCEPTANCE_FIELD;
use crate::error::AppResult;
use crate::infra::jira::DEFAULT_PARENT_SEARCH_JQL;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring tangle.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt("Jira email", &mut cfg.jira_email, false)?;
    apply_prompt("Jira API token", &mut cfg.jira_token, true)?;
    apply_prompt(
        "Jira acceptance criteria field id (e.g., customfield_10000)",
        &mut cfg.acceptance_criteria_field,
        false,
    )?;
    apply_prompt("Azure DevOps personal access token", &mut cfg.azure_token, true)?;

    let mut parent_search = cfg.parent_search.map(|enabled| enabled.to_string());
    apply_prompt("Search Jira parent links (true/false)", &mut parent_search, false)?;
    cfg.parent_search = parent_search.and_then(|value| parse_flag(&value));

    apply_prompt(
        "Parent link JQL ({key} is replaced)",
        &mut cfg.parent_search_jql,
        false,
    )?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Jira email: {}", display_value(&cfg.jira_email));
    println!("Jira API token: {}", mask_secret(&cfg.jira_token));
    println!(
        "Jira acceptance criteria field: {}",
        cfg.acceptance_criteria_field
            .as_deref()
            .unwrap_or(DEFAULT_JIRA_ACCEPTANCE_FIELD)
    );
    println!("Azure DevOps token: {}", mask_secret(&cfg.azure_token));
    println!(
        "Parent link search: {}",
        if cfg.parent_search.unwrap_or(true) { "enabled" } else { "disabled" }
    );
    println!(
        "Parent link JQL: {}",
        cfg.parent_search_jql
            .as_deref()
            .unwrap_or(DEFAULT_PARENT_SEARCH_JQL)
    );

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt_update(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret(&Some("abcdefghij".to_string())), "abc***hij");
        assert_eq!(mask_secret(&Some("short".to_string())), "***");
        assert_eq!(mask_secret(&None), "<not set>");
    }

    #[test]
    fn parses_flags() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn displays_missing_values() {
        assert_eq!(display_value(&None), "<not set>");
        assert_eq!(display_value(&Some(String::new())), "<not set>");
        assert_eq!(display_value(&Some("x".to_string())), "x");
    }
}
