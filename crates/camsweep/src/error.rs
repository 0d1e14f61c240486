//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use camsweep_config::ConfigError;
use camsweep_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Usage ────────────────────────────────────────────────────────
    #[error("No targets to attack")]
    #[diagnostic(
        code(camsweep::no_targets),
        help(
            "Give at least one target, e.g. camsweep scan -t 192.168.1.0/24\n\
             or camsweep attack 192.168.1.10:554"
        )
    )]
    NoTargets,

    #[error("Invalid target '{target}': {reason}")]
    #[diagnostic(
        code(camsweep::invalid_target),
        help("Targets are IPs, CIDR ranges (10.0.0.0/24), last-octet ranges (10.0.0.1-20) or hostnames.")
    )]
    InvalidTarget { target: String, reason: String },

    #[error("Invalid ports '{spec}': {reason}")]
    #[diagnostic(
        code(camsweep::invalid_ports),
        help("Ports are comma-separated numbers or ranges, e.g. 554,8554-8560")
    )]
    InvalidPorts { spec: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(camsweep::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(camsweep::config),
        help("Check the file with: camsweep config show\nExpected at: {path}")
    )]
    Config { message: String, path: String },

    #[error("Dictionary error: {message}")]
    #[diagnostic(
        code(camsweep::dictionary),
        help("Route files hold one path per line; credential files are JSON with \"usernames\" and \"passwords\" arrays.")
    )]
    Dictionary { message: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(camsweep::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Could not connect to {addr}: {reason}")]
    #[diagnostic(code(camsweep::connection_failed))]
    ConnectionFailed { addr: String, reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(camsweep::timeout),
        help("Increase the timeout with --timeout, e.g. --timeout 5s")
    )]
    Timeout { timeout_ms: u64 },

    #[error("RTSP error: {message}")]
    #[diagnostic(code(camsweep::rtsp))]
    Rtsp { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoTargets
            | Self::InvalidTarget { .. }
            | Self::InvalidPorts { .. }
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Config { .. } | Self::Dictionary { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rtsp { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoTargets => CliError::NoTargets,
            CoreError::InvalidTarget { target, reason } => {
                CliError::InvalidTarget { target, reason }
            }
            CoreError::InvalidPorts { spec, reason } => CliError::InvalidPorts { spec, reason },
            CoreError::InvalidScanSpeed { speed } => CliError::Validation {
                field: "scan-speed".into(),
                reason: format!("{speed} is outside 0-5"),
            },
            CoreError::Dictionary { message } => CliError::Dictionary { message },
            CoreError::ConnectionFailed { addr, reason } => {
                CliError::ConnectionFailed { addr, reason }
            }
            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },
            CoreError::Rtsp { message } => CliError::Rtsp { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Core(core) => core.into(),
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            err @ (ConfigError::Read { .. } | ConfigError::Dictionary { .. }) => {
                CliError::Dictionary {
                    message: err.to_string(),
                }
            }
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: camsweep_config::config_path().display().to_string(),
            },
        }
    }
}
