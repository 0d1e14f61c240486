//! Minimal async RTSP/1.0 client for probing camera endpoints.
//!
//! This crate only knows how to issue a single request (OPTIONS, DESCRIBE
//! or SETUP) and read back the status line and headers. It is
//! not a streaming client: bodies are read off the wire and discarded.
//!
//! - **[`Session`]**: one per concurrent unit of work. Owns the timeout,
//!   `User-Agent` and `CSeq` counter. Every [`Session::send`] opens its own
//!   TCP connection and answers at most one authentication challenge.
//! - **[`Auth`]**: how a request should authenticate (none, Basic, Digest,
//!   or negotiate from the server's challenge).
//! - **[`AuthMethods`]**: bitmask of schemes a server advertised in its
//!   `WWW-Authenticate` headers.

pub mod auth;
pub mod error;
pub mod message;
pub mod session;

pub use auth::{Auth, AuthMethods, Credentials, DigestChallenge};
pub use error::Error;
pub use message::{Method, Request, Response};
pub use session::{Session, rtsp_url};

/// Status codes the probe layer gives meaning to.
pub mod status {
    pub const OK: u16 = 200;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
}
