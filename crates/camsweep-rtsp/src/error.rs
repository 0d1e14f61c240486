use thiserror::Error;

/// Top-level error type for the `camsweep-rtsp` crate.
///
/// Every failure of a single request lands here: URL problems, connection
/// failures, timeouts and malformed replies. Callers in `camsweep-core`
/// treat all of them as "attempt failed, signal unknown".
#[derive(Debug, Error)]
pub enum Error {
    // ── Addressing ──────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL parsed but has no host component.
    #[error("URL has no host: {url}")]
    MissingHost { url: String },

    // ── Transport ───────────────────────────────────────────────────
    /// TCP connect failed (refused, unreachable, DNS failure).
    #[error("Cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The whole exchange did not finish within the session timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Read or write failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection before sending a full response.
    #[error("Connection closed by server")]
    ConnectionClosed,

    // ── Protocol ────────────────────────────────────────────────────
    /// The reply was not an RTSP response.
    #[error("Malformed RTSP response: {message}")]
    MalformedResponse { message: String },

    /// The header block exceeded the read limit.
    #[error("Response header block exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },
}

impl Error {
    /// Returns `true` if the request ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Timeout { .. } | Self::ConnectionClosed | Self::Io(_)
        )
    }

    /// Returns `true` if the server did not speak RTSP at all.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. } | Self::HeaderTooLarge { .. }
        )
    }
}
