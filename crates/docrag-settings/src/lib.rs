//! # docrag-settings
//!
//! Layered configuration for the docrag tools.
//!
//! Settings are resolved from three layers (in priority order):
//! 1. **Compiled defaults**: [`DocragSettings::default()`]
//! 2. **User file**: `~/.docrag/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `DOCRAG_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary. There is no global
//! instance: callers load once and pass the value (or pieces of it) down.
//!
//! The API key never appears here; `provider.apiKeyEnv` only names the
//! variable it is read from.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_env_overrides_from, deep_merge, load_file_layer, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::*;
