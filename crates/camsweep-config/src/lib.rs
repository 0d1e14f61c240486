//! Configuration for camsweep.
//!
//! Layered TOML config (defaults → file → `CAMSWEEP_` environment),
//! dictionary and target-file loading, and translation into the immutable
//! `camsweep_core::AttackConfig` / `ScanConfig` values. CLI flags are
//! applied on top by the binary through [`AttackOverrides`] and
//! [`ScanOverrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use camsweep_core::{
    AttackConfig, CoreError, CredentialDictionary, CredentialSource, RouteDictionary, ScanConfig,
    ScanSpeed,
};

/// Built-in route dictionary.
pub const DEFAULT_ROUTES: &str = include_str!("../dictionaries/routes");
/// Built-in credential dictionary.
pub const DEFAULT_CREDENTIALS: &str = include_str!("../dictionaries/credentials.json");

/// Username used when only a password override is given.
pub const DEFAULT_USERNAME: &str = "admin";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad dictionary {}: {source}", path.display())]
    Dictionary {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Port expressions scanned when `--ports` is not given.
    #[serde(default = "default_ports")]
    pub ports: Vec<String>,

    #[serde(default = "default_scan_speed")]
    pub scan_speed: u8,

    /// Per-probe timeout, humantime syntax (`2s`, `1500ms`).
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Pause between probes of one device, humantime syntax.
    #[serde(default = "default_attack_interval")]
    pub attack_interval: String,

    /// Custom route dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<PathBuf>,

    /// Custom combined credential dictionary (JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<PathBuf>,

    /// Newline-delimited username list, replaces the dictionary's usernames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usernames: Option<PathBuf>,

    /// Newline-delimited password list, replaces the dictionary's passwords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passwords: Option<PathBuf>,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            ports: default_ports(),
            scan_speed: default_scan_speed(),
            timeout: default_timeout(),
            attack_interval: default_attack_interval(),
            routes: None,
            credentials: None,
            usernames: None,
            passwords: None,
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_ports() -> Vec<String> {
    camsweep_core::config::DEFAULT_PORTS
        .iter()
        .map(ToString::to_string)
        .collect()
}
fn default_scan_speed() -> u8 {
    camsweep_core::config::DEFAULT_SCAN_SPEED
}
fn default_timeout() -> String {
    "2s".into()
}
fn default_attack_interval() -> String {
    "0ms".into()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Defaults {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("timeout", &self.timeout)
    }

    pub fn attack_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("attack_interval", &self.attack_interval)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{value}': {e}"),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "camsweep", "camsweep").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("camsweep");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file (missing files are fine) + environment.
///
/// Environment keys are nested with `__`, e.g.
/// `CAMSWEEP_DEFAULTS__SCAN_SPEED=2`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CAMSWEEP_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parents.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_config(cfg)?)?;
    Ok(())
}

pub fn render_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Dictionaries ────────────────────────────────────────────────────

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a route dictionary, or the built-in one when `path` is `None`.
pub fn load_routes(path: Option<&Path>) -> Result<RouteDictionary, ConfigError> {
    let routes = match path {
        Some(path) => RouteDictionary::parse(&read(path)?),
        None => RouteDictionary::parse(DEFAULT_ROUTES),
    };
    if routes.is_empty() {
        return Err(ConfigError::Validation {
            field: "routes".into(),
            reason: "route dictionary is empty".into(),
        });
    }
    debug!(routes = routes.len(), custom = path.is_some(), "route dictionary loaded");
    Ok(routes)
}

/// Load the credential dictionary.
///
/// `json` (or the built-in dictionary) is the base; `usernames` and
/// `passwords` list files replace the corresponding half.
pub fn load_credentials(
    json: Option<&Path>,
    usernames: Option<&Path>,
    passwords: Option<&Path>,
) -> Result<CredentialDictionary, ConfigError> {
    let mut dict = match json {
        Some(path) => CredentialDictionary::from_json(&read(path)?).map_err(|source| {
            ConfigError::Dictionary {
                path: path.to_path_buf(),
                source,
            }
        })?,
        None => CredentialDictionary::from_json(DEFAULT_CREDENTIALS)?,
    };

    if let Some(path) = usernames {
        dict.usernames = load_list(path)?;
    }
    if let Some(path) = passwords {
        dict.passwords = load_list(path)?;
    }
    debug!(
        usernames = dict.usernames.len(),
        passwords = dict.passwords.len(),
        "credential dictionary loaded"
    );
    Ok(dict)
}

fn load_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = read(path)?;
    let list: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    if list.is_empty() {
        return Err(ConfigError::Dictionary {
            path: path.to_path_buf(),
            source: CoreError::Dictionary {
                message: "list is empty".into(),
            },
        });
    }
    Ok(list)
}

// ── Targets ─────────────────────────────────────────────────────────

/// When exactly one target is given and it names an existing file, read
/// the targets from that file, one per line. Otherwise return them as is.
pub fn expand_target_file(targets: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let [single] = targets.as_slice() else {
        return Ok(targets);
    };
    let path = Path::new(single);
    if !path.is_file() {
        return Ok(targets);
    }

    let content = read(path)?;
    let expanded: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();
    debug!(path = %path.display(), targets = expanded.len(), "targets file parsed");
    Ok(expanded)
}

// ── Building core configs ───────────────────────────────────────────

/// Attack-related command-line overrides. `None` means "use config".
#[derive(Debug, Clone, Default)]
pub struct AttackOverrides {
    pub routes: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub usernames: Option<PathBuf>,
    pub passwords: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub timeout: Option<Duration>,
    pub attack_interval: Option<Duration>,
}

/// Build the immutable attack configuration.
///
/// A username or password override replaces the dictionary with one fixed
/// pair; the missing half defaults to `admin` / empty.
pub fn build_attack_config(
    config: &Config,
    overrides: &AttackOverrides,
) -> Result<AttackConfig, ConfigError> {
    let defaults = &config.defaults;

    let routes = load_routes(overrides.routes.as_deref().or(defaults.routes.as_deref()))?;

    let credentials = if overrides.username.is_some() || overrides.password.is_some() {
        CredentialSource::Fixed {
            username: overrides
                .username
                .clone()
                .unwrap_or_else(|| DEFAULT_USERNAME.into()),
            password: overrides
                .password
                .clone()
                .unwrap_or_else(|| SecretString::from(String::new())),
        }
    } else {
        CredentialSource::Dictionary(load_credentials(
            overrides.credentials.as_deref().or(defaults.credentials.as_deref()),
            overrides.usernames.as_deref().or(defaults.usernames.as_deref()),
            overrides.passwords.as_deref().or(defaults.passwords.as_deref()),
        )?)
    };

    let timeout = match overrides.timeout {
        Some(timeout) => timeout,
        None => defaults.timeout()?,
    };
    if timeout.is_zero() {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be greater than zero".into(),
        });
    }
    let attack_interval = match overrides.attack_interval {
        Some(interval) => interval,
        None => defaults.attack_interval()?,
    };

    Ok(AttackConfig::new(routes, credentials)
        .with_timeout(timeout)
        .with_attack_interval(attack_interval))
}

/// Discovery-related command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub ports: Option<Vec<String>>,
    pub scan_speed: Option<u8>,
}

/// Build the discovery configuration, expanding a targets file first.
pub fn build_scan_config(
    config: &Config,
    targets: Vec<String>,
    overrides: &ScanOverrides,
) -> Result<ScanConfig, ConfigError> {
    let targets = expand_target_file(targets)?;
    let ports = overrides
        .ports
        .clone()
        .unwrap_or_else(|| config.defaults.ports.clone());
    let speed = ScanSpeed::new(overrides.scan_speed.unwrap_or(config.defaults.scan_speed))?;

    Ok(ScanConfig::new(targets).with_ports(ports).with_speed(speed))
}
