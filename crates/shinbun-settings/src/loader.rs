//! Settings loading: compiled-in defaults, then `settings.json`, then the
//! process environment.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{expand_home, Settings};

/// Resolve the path to the settings file (`~/.shinbun/settings.json`).
pub fn settings_path() -> Result<PathBuf> {
    expand_home("~/.shinbun/settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path()?)
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn load_file(path: &Path) -> Result<Settings> {
    let mut doc = serde_json::to_value(Settings::default())?;

    if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        overlay(&mut doc, serde_json::from_str(&content)?);
    } else {
        debug!(?path, "settings file not found, using defaults");
    }

    Ok(serde_json::from_value(doc)?)
}

/// Lay a user document over the defaults. Sections such as `sync` or `email`
/// merge key by key, so a file may set a single field. Lists (channel names,
/// recipients) and scalars replace the default outright; `null` keeps it.
fn overlay(base: &mut Value, user: Value) {
    match (base, user) {
        (Value::Object(section), Value::Object(fields)) => {
            for (key, value) in fields.into_iter().filter(|(_, v)| !v.is_null()) {
                match section.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        let _ = section.insert(key, value);
                    }
                }
            }
        }
        (base, user) => *base = user,
    }
}

/// Apply process environment overrides.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup. Empty values are ignored and
/// invalid numbers are ignored with a warning.
pub fn apply_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = Env(lookup);

    // ── Slack ───────────────────────────────────────────────────────
    if let Some(v) = env.string("SLACK_BOT_TOKEN") {
        settings.slack.bot_token = Some(v);
    }
    if let Some(v) = env.string("SLACK_API_BASE") {
        settings.slack.api_base = v;
    }

    // ── Completion model ────────────────────────────────────────────
    if let Some(v) = env.string("OPENAI_API_KEY") {
        settings.openai.api_key = Some(v);
    }
    if let Some(v) = env.string("OPENAI_BASE_URL") {
        settings.openai.base_url = v;
    }
    if let Some(v) = env.string("OPENAI_MODEL") {
        settings.openai.model = v;
    }

    // ── Channels ────────────────────────────────────────────────────
    if let Some(v) = env.list("DEFAULT_FOCUS_CHANNELS") {
        settings.channels.default = v;
    }
    if let Some(v) = env.list("SUPPORT_FOCUS_CHANNELS") {
        settings.channels.support = v;
    }

    // ── Storage and digest ──────────────────────────────────────────
    if let Some(v) = env.string("SHINBUN_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = env.u64("SHINBUN_TOKEN_BUDGET", 1, 1_000_000) {
        settings.digest.token_budget = v as usize;
    }

    // ── Email ───────────────────────────────────────────────────────
    if let Some(v) = env.string("SMTP_HOST") {
        settings.email.smtp_host = Some(v);
    }
    if let Some(v) = env.u64("SMTP_PORT", 1, 65_535) {
        settings.email.smtp_port = v as u16;
    }
    if let Some(v) = env.string("SMTP_USER") {
        settings.email.smtp_user = Some(v);
    }
    if let Some(v) = env.string("SMTP_PASSWORD") {
        settings.email.smtp_password = Some(v);
    }
    if let Some(v) = env.string("EMAIL_FROM") {
        settings.email.from = Some(v);
    }
    if let Some(v) = env.list("EMAIL_TO") {
        settings.email.to = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma-separated list, dropping blank entries.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.is_empty())
    }

    fn list(&self, name: &str) -> Option<Vec<String>> {
        self.string(name).map(|v| parse_list(&v))
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid numeric env var, ignoring");
        }
        result
    }
}
