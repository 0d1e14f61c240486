// RTSP authentication: advertised-scheme bitmask, challenge parsing,
// and `Authorization` header generation for Basic and Digest.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64;

use crate::message::Method;

// ── Credentials ──────────────────────────────────────────────────────

/// A borrowed username/password pair for one request.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> Credentials<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// How a request should authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth<'a> {
    /// No `Authorization` header, ever.
    None,
    /// Preemptive Basic auth on the first request.
    Basic(Credentials<'a>),
    /// Send unauthenticated, answer the server's Digest challenge once.
    Digest(Credentials<'a>),
    /// Send unauthenticated, answer whichever challenge the server offers
    /// (Digest preferred over Basic).
    Negotiate(Credentials<'a>),
}

impl Auth<'_> {
    pub(crate) fn credentials(&self) -> Option<Credentials<'_>> {
        match self {
            Self::None => None,
            Self::Basic(c) | Self::Digest(c) | Self::Negotiate(c) => Some(*c),
        }
    }
}

// ── AuthMethods ──────────────────────────────────────────────────────

/// Bitmask of the authentication schemes a server advertised.
///
/// Bit values are stable: `NONE = 0`, `BASIC = 1`, `DIGEST = 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AuthMethods(u8);

impl AuthMethods {
    pub const NONE: Self = Self(0);
    pub const BASIC: Self = Self(1);
    pub const DIGEST: Self = Self(1 << 1);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::BASIC.0 | Self::DIGEST.0))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Build the mask from raw `WWW-Authenticate` header values.
    pub fn from_challenges<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        values
            .into_iter()
            .fold(Self::NONE, |mask, value| mask | Self::from_challenge(value))
    }

    fn from_challenge(value: &str) -> Self {
        let scheme = value.split_whitespace().next().unwrap_or_default();
        if scheme.eq_ignore_ascii_case("basic") {
            Self::BASIC
        } else if scheme.eq_ignore_ascii_case("digest") {
            Self::DIGEST
        } else {
            Self::NONE
        }
    }
}

impl BitOr for AuthMethods {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AuthMethods {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AuthMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::BASIC) {
            names.push("basic");
        }
        if self.contains(Self::DIGEST) {
            names.push("digest");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

// ── Basic ────────────────────────────────────────────────────────────

/// `Authorization` header value for Basic auth.
pub fn basic_authorization(credentials: Credentials<'_>) -> String {
    let token = Base64.encode(format!("{}:{}", credentials.username, credentials.password));
    format!("Basic {token}")
}

// ── Digest ───────────────────────────────────────────────────────────

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub algorithm: Option<String>,
    pub opaque: Option<String>,
}

impl DigestChallenge {
    /// Parse a header value of the form `Digest realm="..", nonce=".."`.
    ///
    /// Returns `None` for non-Digest challenges or when `nonce` is missing.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (scheme, params) = value.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut algorithm = None;
        let mut opaque = None;

        for (key, val) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(val),
                "nonce" => nonce = Some(val),
                "qop" => qop = Some(val),
                "algorithm" => algorithm = Some(val),
                "opaque" => opaque = Some(val),
                _ => {}
            }
        }

        Some(Self {
            realm: realm.unwrap_or_default(),
            nonce: nonce?,
            qop,
            algorithm,
            opaque,
        })
    }

    /// Build the `Authorization` header value answering this challenge.
    ///
    /// Only MD5 is computed; `qop=auth` is honoured when offered.
    pub fn authorization(&self, credentials: Credentials<'_>, method: Method, uri: &str) -> String {
        let ha1 = md5_hex(&format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        let ha2 = md5_hex(&format!("{}:{uri}", method.as_str()));

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\"",
            credentials.username, self.realm, self.nonce
        );

        if self.offers_qop_auth() {
            let nc = "00000001";
            let seed = md5_hex(&format!("{}:{nc}", self.nonce));
            let cnonce = &seed[..16];
            let response = md5_hex(&format!("{ha1}:{}:{nc}:{cnonce}:auth:{ha2}", self.nonce));
            header.push_str(&format!(
                ", response=\"{response}\", qop=auth, nc={nc}, cnonce=\"{cnonce}\""
            ));
        } else {
            let response = md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce));
            header.push_str(&format!(", response=\"{response}\""));
        }

        if let Some(ref algorithm) = self.algorithm {
            header.push_str(&format!(", algorithm={algorithm}"));
        }
        if let Some(ref opaque) = self.opaque {
            header.push_str(&format!(", opaque=\"{opaque}\""));
        }
        header
    }

    fn offers_qop_auth(&self) -> bool {
        self.qop
            .as_deref()
            .is_some_and(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")))
    }
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Split `key=value, key="quoted, value"` pairs, unquoting values.
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some((key, after_eq)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_string();
        let after_eq = after_eq.trim_start();

        let (value, remaining) = if let Some(quoted) = after_eq.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            }
        } else {
            match after_eq.find(',') {
                Some(end) => (after_eq[..end].trim().to_string(), &after_eq[end..]),
                None => (after_eq.trim().to_string(), ""),
            }
        };

        pairs.push((key, value));
        rest = remaining.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}
