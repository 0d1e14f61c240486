//! Attack orchestration engine for RTSP camera assessment.
//!
//! - **[`Attacker`]**: runs route discovery, authentication detection,
//!   credential brute-forcing and accessibility validation across many
//!   devices concurrently, then a second discovery + validation round when
//!   any device is still without routes. Progress is published on a
//!   `tokio::sync::watch` channel ([`Attacker::subscribe`]).
//!
//! - **[`Scanner`]**: network discovery: TCP connect plus an RTSP
//!   `OPTIONS` probe over expanded targets and ports.
//!
//! - **[`Probe`] / [`ProbeFactory`]**: the seam between the engine and
//!   the wire. [`RtspProbeFactory`] is the production implementation.
//!
//! - **Domain model** ([`model`]): [`Device`], [`Route`], [`AuthType`]
//!   and [`Credentials`], serializable for reporting.

pub mod attack;
pub mod config;
pub mod dictionary;
pub mod discovery;
pub mod error;
pub mod model;
pub mod probe;

// ── Primary re-exports ──────────────────────────────────────────────
pub use attack::{AttackState, Attacker, DeviceSet, Phase};
pub use config::{AttackConfig, CredentialSource, ScanConfig, ScanSpeed};
pub use dictionary::{CredentialDictionary, RouteDictionary};
pub use discovery::Scanner;
pub use error::CoreError;
pub use model::{AuthType, Credentials, Device, DeviceKey, Route};
pub use probe::{Probe, ProbeFactory, ProbeRequest, ProbeResponse, RequestKind, RtspProbeFactory};
