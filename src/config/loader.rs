//! TOML configuration loading, env-var overrides, and atomic saves.
//!
//! # Loading order
//! 1. Parse `~/.agentco/config.toml` (or the path in `AGENTCO_CONFIG`)
//! 2. Apply `AGENTCO_*` environment variable overrides
//! 3. Fall back to [`AppConfig::default()`] if the file is missing
//!
//! # Atomic save
//! Writes to `<path>.tmp` → fsync → rename to `<path>` to avoid partial
//! writes corrupting the config file.

use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use super::schema::AppConfig;

// ─── default_config_path ─────────────────────────────────────────────────────

/// Return the default config file path: `~/.agentco/config.toml`.
pub fn default_config_path() -> Result<PathBuf, String> {
    dirs_home()
        .map(|h| h.join(".agentco").join("config.toml"))
        .ok_or_else(|| "could not determine home directory".to_string())
}

fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// ─── load_config ─────────────────────────────────────────────────────────────

/// Load [`AppConfig`] from the given path, falling back to defaults if the
/// file does not exist, then applying environment variable overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, String> {
    let mut config = match fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)
            .map_err(|e| format!("failed to parse config at {path:?}: {e}"))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(format!("failed to read config at {path:?}: {e}")),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load config from the default path, creating the directory if needed.
pub fn load_default_config() -> AppConfig {
    let path = env::var("AGENTCO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            default_config_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
        });

    load_config(&path).unwrap_or_default()
}

// ─── apply_env_overrides ─────────────────────────────────────────────────────

/// Apply `AGENTCO_*` environment variable overrides to `config`.
///
/// Supported overrides:
/// - `AGENTCO_PROVIDER_ID`          → `provider.default_id`
/// - `AGENTCO_PROVIDER_MODEL`       → `provider.default_model`
/// - `AGENTCO_CALL_TIMEOUT_SECS`    → `provider.call_timeout_secs`
/// - `AGENTCO_AGENT_INTERVAL_SECS`  → `runtime.agent_interval_secs`
/// - `AGENTCO_SCHEDULER_TICK_SECS`  → `runtime.scheduler_tick_secs`
/// - `AGENTCO_BUS_HISTORY_CAP`      → `runtime.bus_history_cap`
/// - `AGENTCO_BASE_WEEKLY_POINTS`   → `budget.base_weekly_points`
/// - `AGENTCO_DATABASE_PATH`        → `persistence.database_path`
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = env::var("AGENTCO_PROVIDER_ID") {
        config.provider.default_id = v;
    }
    if let Ok(v) = env::var("AGENTCO_PROVIDER_MODEL") {
        config.provider.default_model = v;
    }
    if let Ok(v) = env::var("AGENTCO_CALL_TIMEOUT_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            config.provider.call_timeout_secs = secs;
        }
    }
    if let Ok(v) = env::var("AGENTCO_AGENT_INTERVAL_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            config.runtime.agent_interval_secs = secs;
        }
    }
    if let Ok(v) = env::var("AGENTCO_SCHEDULER_TICK_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            config.runtime.scheduler_tick_secs = secs;
        }
    }
    if let Ok(v) = env::var("AGENTCO_BUS_HISTORY_CAP") {
        if let Ok(cap) = v.parse::<usize>() {
            config.runtime.bus_history_cap = cap;
        }
    }
    if let Ok(v) = env::var("AGENTCO_BASE_WEEKLY_POINTS") {
        if let Ok(points) = v.parse::<f64>() {
            config.budget.base_weekly_points = points;
        }
    }
    if let Ok(v) = env::var("AGENTCO_DATABASE_PATH") {
        config.persistence.database_path = Some(v);
    }
}

// ─── save_config ─────────────────────────────────────────────────────────────

/// Atomically save `config` to `path`.
///
/// Writes to `<path>.tmp`, syncs to disk, creates a backup of the existing
/// file as `<path>.bak`, then renames the temp file to `<path>`.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| format!("failed to serialise config: {e}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create config dir: {e}"))?;
    }

    let tmp_path = path.with_extension("toml.tmp");

    fs::write(&tmp_path, &content)
        .map_err(|e| format!("failed to write temp config: {e}"))?;

    if path.exists() {
        let bak_path = path.with_extension("toml.bak");
        fs::copy(path, &bak_path)
            .map_err(|e| format!("failed to backup config: {e}"))?;
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| format!("failed to replace config file: {e}"))?;

    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unsafe_code)] // env::set_var / remove_var are unsafe in Rust 2024; tests are single-threaded.
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"
[provider]
default_id = "anthropic"
"#);
        let config = load_config(&path).unwrap();
        assert_eq!(config.provider.default_id, "anthropic");
        assert_eq!(config.provider.max_retries, 3);
        assert_eq!(config.runtime.agent_interval_secs, 2);
    }

    #[test]
    fn load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"
[provider]
default_id = "openai"
default_model = "gpt-4o"
call_timeout_secs = 30
max_retries = 5

[runtime]
agent_interval_secs = 5
scheduler_tick_secs = 20
bus_history_cap = 500

[budget]
base_weekly_points = 2000
default_required_approval_rate = 0.75
"#);
        let config = load_config(&path).unwrap();
        assert_eq!(config.provider.default_model, "gpt-4o");
        assert_eq!(config.provider.max_retries, 5);
        assert_eq!(config.runtime.agent_interval_secs, 5);
        assert_eq!(config.runtime.bus_history_cap, 500);
        assert_eq!(config.budget.base_weekly_points, 2000.0);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut original = AppConfig::default();
        original.provider.default_model = "claude-3-haiku".to_owned();
        original.budget.base_weekly_points = 1234.0;

        save_config(&path, &original).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, original, "config should round-trip through save/load");
    }

    #[test]
    fn save_creates_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        save_config(&path, &AppConfig::default()).unwrap();
        save_config(&path, &AppConfig::default()).unwrap();

        let bak = path.with_extension("toml.bak");
        assert!(bak.exists(), "backup file should exist after second save");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested_path = dir.path().join("a").join("b").join("config.toml");
        save_config(&nested_path, &AppConfig::default()).unwrap();
        assert!(nested_path.exists(), "config should be created in nested dirs");
    }

    #[test]
    fn env_override_provider_id() {
        let key = "AGENTCO_PROVIDER_ID";
        // SAFETY: single-threaded test context; no other threads read this var.
        unsafe { env::set_var(key, "groq"); }
        let config = load_default_config();
        // SAFETY: same as set_var above.
        unsafe { env::remove_var(key); }
        assert_eq!(config.provider.default_id, "groq");
    }

    #[test]
    fn env_override_agent_interval() {
        let key = "AGENTCO_AGENT_INTERVAL_SECS";
        // SAFETY: single-threaded test context; no other threads read this var.
        unsafe { env::set_var(key, "7"); }
        let config = load_default_config();
        // SAFETY: same as set_var above.
        unsafe { env::remove_var(key); }
        assert_eq!(config.runtime.agent_interval_secs, 7);
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "this is not valid toml!!!");
        let result = load_config(&path);
        assert!(result.is_err(), "invalid TOML should return an error");
    }
}
