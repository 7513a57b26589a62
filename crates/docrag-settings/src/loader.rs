//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`DocragSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `DOCRAG_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{DocragSettings, ProviderKind};

/// Resolve the default settings file (`~/.docrag/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".docrag").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<DocragSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<DocragSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<DocragSettings> {
    let defaults = serde_json::to_value(DocragSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut DocragSettings) {
    apply_env_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty values are treated as unset. Values that fail to parse or fall
/// outside their range are ignored with a warning.
pub fn apply_env_overrides_from<F>(settings: &mut DocragSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Provider ────────────────────────────────────────────────────
    if let Some(v) = env.string("DOCRAG_BASE_URL") {
        settings.provider.base_url = v;
    }
    if let Some(v) = env.string("DOCRAG_API_VERSION") {
        settings.provider.api_version = v;
    }
    if let Some(v) = env.string("DOCRAG_PROVIDER") {
        match v.parse::<ProviderKind>() {
            Ok(kind) => settings.provider.kind = kind,
            Err(_) => warn!(key = "DOCRAG_PROVIDER", value = %v, "invalid provider env var, ignoring"),
        }
    }
    if let Some(v) = env.string("DOCRAG_EMBEDDING_MODEL") {
        settings.provider.embedding_model = v;
    }
    if let Some(v) = env.string("DOCRAG_COMPLETION_MODEL") {
        settings.provider.completion_model = v;
    }
    if let Some(v) = env.u64("DOCRAG_TIMEOUT_MS", 100, 600_000) {
        settings.provider.timeout_ms = v;
    }

    // ── Retrieval ───────────────────────────────────────────────────
    if let Some(v) = env.usize("DOCRAG_TOP_K", 1, 1_000) {
        settings.retrieval.top_k = v;
    }
    if let Some(v) = env.string("DOCRAG_DOCUMENTS_DIR") {
        settings.retrieval.documents_dir = v;
    }

    // ── Retry / logging ─────────────────────────────────────────────
    if let Some(v) = env.u32("DOCRAG_MAX_RETRIES", 0, 10) {
        settings.retry.max_retries = v;
    }
    if let Some(v) = env.string("DOCRAG_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, kind: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let val = self.string(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, kind, "invalid env var, ignoring");
        }
        result
    }

    fn u32(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        self.parsed(name, "u32", |v| parse_u32_range(v, min, max))
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, "u64", |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, "usize", |v| parse_usize_range(v, min, max))
    }
}
