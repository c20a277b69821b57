//! # shinbun-settings
//!
//! Layered configuration for the digest tool.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`Settings::default()`])
//! 2. **User file** `~/.shinbun/settings.json`, overlaid field by field
//! 3. **Environment variables** such as `SLACK_BOT_TOKEN` (highest priority)
//!
//! The loaded value is passed explicitly to whatever needs it; there is no
//! process-wide instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::*;
