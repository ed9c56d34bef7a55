//! Configuration Vault – reads/writes `~/.skyvox/config.toml`.

use serde::{Deserialize, Serialize};
use skyvox_hal::{DjiAdapter, MavlinkAdapter, MockAdapter, VehicleAdapter};
use skyvox_kernel::PolicyConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Supported vehicle adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Mock,
    Mavlink,
    Dji,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Mock => write!(f, "mock"),
            AdapterKind::Mavlink => write!(f, "mavlink"),
            AdapterKind::Dji => write!(f, "dji"),
        }
    }
}

impl std::str::FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" | "sim" => Ok(AdapterKind::Mock),
            "mavlink" | "ardupilot" | "px4" => Ok(AdapterKind::Mavlink),
            "dji" => Ok(AdapterKind::Dji),
            other => Err(format!("unknown adapter '{other}' (expected mock, mavlink, or dji)")),
        }
    }
}

/// Persisted operator configuration stored in `~/.skyvox/config.toml`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Adapter selected at startup.
    #[serde(default)]
    pub adapter: AdapterKind,

    /// MAVLink endpoint, e.g. `udp:127.0.0.1:14550` or `serial:/dev/ttyACM0:57600`.
    #[serde(default = "default_mavlink_url")]
    pub mavlink_url: String,

    /// DJI SDK app key (stored as plain text; the file is written owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dji_app_key: String,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("adapter", &self.adapter)
            .field("mavlink_url", &self.mavlink_url)
            .field(
                "dji_app_key",
                if self.dji_app_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("policy", &self.policy)
            .finish()
    }
}

fn default_mavlink_url() -> String {
    "udp:127.0.0.1:14550".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::default(),
            mavlink_url: default_mavlink_url(),
            dji_app_key: String::new(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Return the path to `~/.skyvox/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".skyvox").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    resolve(cfg).map(Some)
}

/// Apply env overrides to `cfg`, then validate its `[policy]` table.
pub fn resolve(mut cfg: Config) -> Result<Config, String> {
    apply_env_overrides(&mut cfg);
    cfg.policy
        .validate()
        .map_err(|e| format!("Invalid [policy] table: {}", e))?;
    Ok(cfg)
}

/// Apply `SKYVOX_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SKYVOX_ADAPTER` | `adapter` |
/// | `SKYVOX_MAVLINK_URL` | `mavlink_url` |
/// | `SKYVOX_RATE_LIMIT_MAX` | `policy.rate_limit_max` |
/// | `SKYVOX_CONFIRM_TIMEOUT` | `policy.confirmation_timeout_seconds` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SKYVOX_ADAPTER")
        && let Ok(kind) = v.parse::<AdapterKind>()
    {
        cfg.adapter = kind;
    }
    if let Ok(v) = std::env::var("SKYVOX_MAVLINK_URL") {
        cfg.mavlink_url = v;
    }
    if let Ok(v) = std::env::var("SKYVOX_RATE_LIMIT_MAX")
        && let Ok(max) = v.parse::<usize>()
    {
        cfg.policy.rate_limit_max = max;
    }
    if let Ok(v) = std::env::var("SKYVOX_CONFIRM_TIMEOUT")
        && let Ok(secs) = v.parse::<f64>()
        && secs.is_finite()
        && secs >= 0.0
    {
        cfg.policy.confirmation_timeout_seconds = secs;
    }
}

/// Save the config to disk, creating `~/.skyvox/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only read/write: the file may hold the DJI app key.
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

/// Build an adapter of `kind` from `cfg`.  Protocol adapters start
/// disconnected; the mock starts connected.
///
/// Protocol adapters are wired to an in-memory loopback link; frames they
/// emit are logged at `debug`.
pub fn build_adapter(kind: AdapterKind, cfg: &Config) -> Result<Arc<dyn VehicleAdapter>, String> {
    match kind {
        AdapterKind::Mock => Ok(Arc::new(MockAdapter::new())),
        AdapterKind::Mavlink => {
            let (adapter, _link) =
                MavlinkAdapter::loopback(&cfg.mavlink_url).map_err(|e| e.to_string())?;
            Ok(Arc::new(adapter))
        }
        AdapterKind::Dji => {
            let key = (!cfg.dji_app_key.is_empty()).then(|| cfg.dji_app_key.clone());
            let (adapter, _link) = DjiAdapter::loopback(key);
            Ok(Arc::new(adapter))
        }
    }
}
