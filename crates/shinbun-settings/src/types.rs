//! Settings type definitions.
//!
//! Field names are camelCase in JSON. Every group implements [`Default`]
//! and is `#[serde(default)]`, so a partial file only overrides what it names.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

const REDACTED: &str = "[redacted]";

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| REDACTED)
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub slack: SlackSettings,
    pub openai: OpenAiSettings,
    pub database: DatabaseSettings,
    pub channels: ChannelSettings,
    pub sync: SyncSettings,
    pub digest: DigestSettings,
    pub email: EmailSettings,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackSettings {
    pub bot_token: Option<String>,
    pub api_base: String,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: "https://slack.com/api".to_string(),
        }
    }
}

impl fmt::Debug for SlackSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            max_retries: 2,
        }
    }
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// A leading `~/` is expanded against `$HOME`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.shinbun/shinbun.db".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        expand_home(&self.path)
    }
}

/// Which configured channel list a run reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelGroup {
    Default,
    Support,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSettings {
    pub default: Vec<String>,
    pub support: Vec<String>,
}

impl ChannelSettings {
    pub fn group(&self, group: ChannelGroup) -> &[String] {
        match group {
            ChannelGroup::Default => &self.default,
            ChannelGroup::Support => &self.support,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    pub default_lookback_days: u32,
    pub history_window_days: u32,
    pub history_page_size: u32,
    pub directory_page_size: u32,
    pub page_delay_ms: u64,
    pub directory_page_delay_ms: u64,
    pub rate_limit_backoff_ms: u64,
    pub max_rate_limit_retries: u32,
}

/// Upper bound for the lookback and history window settings.
pub const MAX_WINDOW_DAYS: u32 = 3650;

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            default_lookback_days: 7,
            history_window_days: 7,
            history_page_size: 200,
            directory_page_size: 1000,
            page_delay_ms: 1200,
            directory_page_delay_ms: 500,
            rate_limit_backoff_ms: 30_000,
            max_rate_limit_retries: 3,
        }
    }
}

impl SyncSettings {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn directory_page_delay(&self) -> Duration {
        Duration::from_millis(self.directory_page_delay_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigestSettings {
    pub token_budget: usize,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self { token_budget: 3800 }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSettings {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            from: None,
            to: Vec::new(),
        }
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &redact(&self.smtp_password))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// What the process is about to do; decides which settings are mandatory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    ListChannels,
    Digest(ChannelGroup),
}

impl Settings {
    /// Fail fast when a value the run needs is absent.
    pub fn validate_for(&self, mode: RunMode) -> Result<()> {
        require(&self.slack.bot_token, "slack.botToken")?;
        at_most(self.sync.default_lookback_days, MAX_WINDOW_DAYS, "sync.defaultLookbackDays")?;
        at_most(self.sync.history_window_days, MAX_WINDOW_DAYS, "sync.historyWindowDays")?;
        if let RunMode::Digest(group) = mode {
            require(&self.openai.api_key, "openai.apiKey")?;
            let key = match group {
                ChannelGroup::Default => "channels.default",
                ChannelGroup::Support => "channels.support",
            };
            if self.channels.group(group).iter().all(|c| c.trim().is_empty()) {
                return Err(SettingsError::Missing(key.to_string()));
            }
        }
        Ok(())
    }
}

fn require(value: &Option<String>, key: &str) -> Result<()> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(SettingsError::Missing(key.to_string())),
    }
}

fn at_most(value: u32, max: u32, key: &str) -> Result<()> {
    if value > max {
        return Err(SettingsError::OutOfRange {
            key: key.to_string(),
            value: u64::from(value),
            max: u64::from(max),
        });
    }
    Ok(())
}

pub(crate) fn expand_home(path: &str) -> Result<PathBuf> {
    expand_home_with(path, std::env::var("HOME").ok())
}

fn expand_home_with(path: &str, home: Option<String>) -> Result<PathBuf> {
    let Some(rest) = path.strip_prefix("~/") else {
        return Ok(PathBuf::from(path));
    };
    match home.filter(|h| !h.is_empty()) {
        Some(home) => Ok(PathBuf::from(home).join(rest)),
        None => Err(SettingsError::Missing(format!("HOME (needed to expand {path})"))),
    }
}
