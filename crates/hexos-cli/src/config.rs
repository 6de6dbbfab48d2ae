//! Reads/writes `~/.hexos/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted operator configuration stored in `~/.hexos/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name the robot uses when talking about itself.
    #[serde(default = "default_robot_name")]
    pub robot_name: String,

    /// Whether to consult the remote reasoner at all.
    #[serde(default)]
    pub remote_enabled: bool,

    /// When `true` a failed remote attempt stops the robot instead of
    /// falling back to local behaviors.
    #[serde(default)]
    pub remote_required: bool,

    /// Base URL of the OpenAI-compatible reasoning endpoint.
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,

    /// Primary remote model.
    #[serde(default = "default_remote_model")]
    pub remote_model: String,

    /// Fallback models, tried in order after the primary.
    #[serde(default)]
    pub fallback_models: Vec<String>,

    /// API key for the remote endpoint (file permissions are restricted to
    /// the owner on save).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Minimum time between full decisions, milliseconds.
    #[serde(default = "default_decision_interval_ms")]
    pub decision_interval_ms: u64,

    /// Sleep between control-loop ticks, milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Gait pause multiplier. 1.0 is real time; 0.0 makes motion sequences
    /// instantaneous for dry runs.
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("robot_name", &self.robot_name)
            .field("remote_enabled", &self.remote_enabled)
            .field("remote_required", &self.remote_required)
            .field("remote_base_url", &self.remote_base_url)
            .field("remote_model", &self.remote_model)
            .field("fallback_models", &self.fallback_models)
            .field(
                "api_key",
                if self.api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("decision_interval_ms", &self.decision_interval_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("time_scale", &self.time_scale)
            .finish()
    }
}

fn default_robot_name() -> String {
    "hexapod".to_string()
}
fn default_remote_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
fn default_remote_model() -> String {
    "mistralai/devstral-small:free".to_string()
}
fn default_decision_interval_ms() -> u64 {
    500
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_time_scale() -> f32 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            robot_name: default_robot_name(),
            remote_enabled: false,
            remote_required: false,
            remote_base_url: default_remote_base_url(),
            remote_model: default_remote_model(),
            fallback_models: Vec::new(),
            api_key: String::new(),
            decision_interval_ms: default_decision_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            time_scale: default_time_scale(),
        }
    }
}

/// Return the path to `~/.hexos/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".hexos").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `HEXOS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HEXOS_API_KEY` | `api_key` |
/// | `HEXOS_MODEL` | `remote_model` |
/// | `HEXOS_REMOTE_URL` | `remote_base_url` |
/// | `HEXOS_REMOTE_REQUIRED` | `remote_required` (`1`/`true`) |
/// | `HEXOS_TIME_SCALE` | `time_scale` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HEXOS_API_KEY") {
        cfg.api_key = v;
        cfg.remote_enabled = true;
    }
    if let Ok(v) = std::env::var("HEXOS_MODEL") {
        cfg.remote_model = v;
    }
    if let Ok(v) = std::env::var("HEXOS_REMOTE_URL") {
        cfg.remote_base_url = v;
    }
    if let Ok(v) = std::env::var("HEXOS_REMOTE_REQUIRED") {
        cfg.remote_required = matches!(v.as_str(), "1" | "true");
    }
    if let Ok(v) = std::env::var("HEXOS_TIME_SCALE")
        && let Ok(scale) = v.parse::<f32>()
    {
        cfg.time_scale = scale.max(0.0);
    }
}

/// Save the config to disk, creating `~/.hexos/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only (rwx------) on Unix; the file can hold an API key.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_redacts_api_key() {
        let mut cfg = Config::default();
        cfg.api_key = "sk-or-super-secret".to_string();
        let debug_str = format!("{:?}", cfg);
        assert!(
            !debug_str.contains("sk-or-super-secret"),
            "api key must not appear in debug output"
        );
        assert!(debug_str.contains("<redacted>"));
    }

    #[test]
    fn config_debug_shows_not_set_for_empty_key() {
        let debug_str = format!("{:?}", Config::default());
        assert!(debug_str.contains("<not set>"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path)
            .expect("file metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.robot_name, "hexapod");
        assert_eq!(loaded.decision_interval_ms, 500);
        assert_eq!(loaded.time_scale, 1.0);
        assert!(!loaded.remote_required);
    }

    #[test]
    fn config_path_points_to_hexos_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".hexos"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn api_key_override_enables_remote() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HEXOS_API_KEY", "sk-or-test") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.api_key, "sk-or-test");
        assert!(cfg.remote_enabled);
        unsafe { std::env::remove_var("HEXOS_API_KEY") };
    }

    #[test]
    fn time_scale_override_rejects_garbage() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HEXOS_TIME_SCALE", "warp-nine") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.time_scale, 1.0);
        unsafe { std::env::remove_var("HEXOS_TIME_SCALE") };
    }

    #[test]
    fn negative_time_scale_clamps_to_zero() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HEXOS_TIME_SCALE", "-2.0") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.time_scale, 0.0);
        unsafe { std::env::remove_var("HEXOS_TIME_SCALE") };
    }
}
