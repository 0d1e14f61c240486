// ── Core error types ──
//
// Errors surfaced by the engine and discovery layers. A failed probe is
// never one of these: the attack phases swallow probe errors and treat
// them as a failed attempt. What reaches callers here is a usage or input
// problem that stops a scan before it starts.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Usage errors ─────────────────────────────────────────────────
    #[error("No targets to attack")]
    NoTargets,

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Invalid port specification '{spec}': {reason}")]
    InvalidPorts { spec: String, reason: String },

    #[error("Invalid scan speed {speed} (expected 0-5)")]
    InvalidScanSpeed { speed: u8 },

    // ── Dictionary errors ────────────────────────────────────────────
    #[error("Dictionary error: {message}")]
    Dictionary { message: String },

    // ── Transport errors (wrapped, not exposed raw) ──────────────────
    #[error("Cannot connect to {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("RTSP error: {message}")]
    Rtsp { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<camsweep_rtsp::Error> for CoreError {
    fn from(err: camsweep_rtsp::Error) -> Self {
        match err {
            camsweep_rtsp::Error::Connect { addr, source } => CoreError::ConnectionFailed {
                addr,
                reason: source.to_string(),
            },
            camsweep_rtsp::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            camsweep_rtsp::Error::InvalidUrl(e) => CoreError::InvalidTarget {
                target: String::new(),
                reason: e.to_string(),
            },
            camsweep_rtsp::Error::MissingHost { url } => CoreError::InvalidTarget {
                target: url,
                reason: "no host".into(),
            },
            other => CoreError::Rtsp {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Dictionary {
            message: err.to_string(),
        }
    }
}

impl CoreError {
    /// Returns `true` for errors caused by bad user input.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::NoTargets
                | Self::InvalidTarget { .. }
                | Self::InvalidPorts { .. }
                | Self::InvalidScanSpeed { .. }
        )
    }
}
