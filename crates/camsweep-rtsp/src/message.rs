// RTSP/1.0 request encoding and response-head parsing.

use std::fmt;

use crate::auth::{AuthMethods, DigestChallenge};
use crate::error::Error;

/// The RTSP methods the probe needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Options,
    Describe,
    Setup,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Describe => "DESCRIBE",
            Self::Setup => "SETUP",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Request ──────────────────────────────────────────────────────────

/// An outgoing RTSP request. Never carries a body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    cseq: u32,
    headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>, cseq: u32) -> Self {
        Self {
            method,
            uri: uri.into(),
            cseq,
            headers: Vec::new(),
        }
    }

    /// Append a header. Order is preserved on the wire.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Serialize to wire bytes (CRLF line endings, blank-line terminated).
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} RTSP/1.0\r\n", self.method, self.uri)?;
        write!(f, "CSeq: {}\r\n", self.cseq)?;
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        f.write_str("\r\n")
    }
}

// ── Response ─────────────────────────────────────────────────────────

/// Status line and headers of an RTSP response. The body is never kept.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
}

impl Response {
    /// Parse a response head (status line + headers, without the final
    /// blank line).
    pub fn parse_head(head: &str) -> Result<Self, Error> {
        let mut lines = head.lines();
        let status_line = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| Error::MalformedResponse {
                message: "empty response".into(),
            })?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("RTSP/") {
            return Err(Error::MalformedResponse {
                message: format!("unexpected status line: {status_line}"),
            });
        }

        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| Error::MalformedResponse {
                message: format!("missing status code: {status_line}"),
            })?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let headers = lines
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        Ok(Self {
            status,
            reason,
            headers,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers with the given name (case-insensitive), in wire order.
    pub fn headers_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// The `Server` header, used as a device label during discovery.
    pub fn server(&self) -> Option<&str> {
        self.header("Server").filter(|s| !s.is_empty())
    }

    /// Schemes advertised through `WWW-Authenticate`.
    pub fn auth_methods(&self) -> AuthMethods {
        AuthMethods::from_challenges(self.headers_named("WWW-Authenticate"))
    }

    /// The first Digest challenge the server offered, if any.
    pub fn digest_challenge(&self) -> Option<DigestChallenge> {
        self.headers_named("WWW-Authenticate")
            .find_map(DigestChallenge::parse)
    }
}
