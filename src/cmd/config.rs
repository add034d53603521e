use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{API_KEY_ENV, DEFAULT_GEMINI_MODEL, StoredConfig, config_file_path};
use crate::error::AppResult;

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

    println!("Configuring groom.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!("{API_KEY_ENV} in the environment takes precedence over the stored key.");
    println!();

    apply_prompt("Gemini API key", &mut cfg.gemini_api_key, true)?;
    apply_prompt(
        &format!("Gemini model (default {DEFAULT_GEMINI_MODEL})"),
        &mut cfg.gemini_model,
        false,
    )?;
    apply_prompt("Gemini API base URL", &mut cfg.gemini_base_url, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    let env_key = std::env::var(API_KEY_ENV).ok();
    println!(
        "Gemini API key: {}",
        describe_api_key(&cfg.gemini_api_key, env_key.as_deref())
    );
    println!("Gemini model: {}", display_value(&cfg.gemini_model));
    println!("Gemini API base URL: {}", display_value(&cfg.gemini_base_url));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(PromptAction::Keep)
    } else if trimmed == "-" {
        Ok(PromptAction::Clear)
    } else {
        Ok(PromptAction::Set(trimmed.to_string()))
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

/// The environment key is what `groom draft` actually sends, so it is shown
/// in place of the stored one whenever it is set.
fn describe_api_key(stored: &Option<String>, env_key: Option<&str>) -> String {
    match env_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => format!(
            "{} (from {API_KEY_ENV}; stored value {} is ignored)",
            mask_secret(&Some(key.to_string())),
            mask_secret(stored)
        ),
        None => mask_secret(stored),
    }
}

fn mask_secret(value: &Option<String>) -> String {
    let Some(token) = value.as_deref().filter(|v| !v.is_empty()) else {
        return "<not set>".to_string();
    };
    let chars = token.chars().collect::<Vec<_>>();
    if chars.len() > 6 {
        let prefix = chars[..3].iter().collect::<String>();
        let suffix = chars[chars.len() - 3..].iter().collect::<String>();
        format!("{prefix}***{suffix}")
    } else {
        "***".to_string()
    }
}

enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
