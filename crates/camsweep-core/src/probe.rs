// ── Probe seam ──
//
// The attack phases only ever talk to a `Probe`. Production code uses the
// RTSP client; tests script responses in memory.

use std::time::Duration;

use async_trait::async_trait;

use camsweep_rtsp::{Auth, AuthMethods, Method, Session};

use crate::model::{AuthType, Credentials};

/// Transport parameters sent with every validation SETUP.
pub const SETUP_TRANSPORT: &str = "RTP/AVP;unicast;client_port=33332-33333";

/// Which RTSP request a probe issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RequestKind {
    Describe,
    Setup,
}

/// One probe attempt against `rtsp://address:port/path`.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub address: &'a str,
    pub port: u16,
    pub path: &'a str,
    pub credentials: Option<&'a Credentials>,
    pub auth_type: AuthType,
    pub kind: RequestKind,
}

/// What a probe learned: the final status and the schemes the server
/// advertised along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub auth_methods: AuthMethods,
}

impl ProbeResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            auth_methods: AuthMethods::NONE,
        }
    }

    pub fn with_auth_methods(mut self, methods: AuthMethods) -> Self {
        self.auth_methods = methods;
        self
    }
}

/// A probe session, owned by exactly one unit of work.
#[async_trait]
pub trait Probe: Send {
    async fn probe(
        &mut self,
        request: &ProbeRequest<'_>,
    ) -> Result<ProbeResponse, camsweep_rtsp::Error>;
}

/// Hands out a fresh, unshared session per unit of work.
pub trait ProbeFactory: Send + Sync {
    fn session(&self) -> Box<dyn Probe>;
}

// ── RTSP implementation ──────────────────────────────────────────────

/// Builds [`RtspProbe`] sessions with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct RtspProbeFactory {
    timeout: Duration,
}

impl RtspProbeFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ProbeFactory for RtspProbeFactory {
    fn session(&self) -> Box<dyn Probe> {
        Box::new(RtspProbe {
            session: Session::new(self.timeout),
        })
    }
}

/// [`Probe`] backed by the wire-level RTSP client.
#[derive(Debug)]
pub struct RtspProbe {
    session: Session,
}

#[async_trait]
impl Probe for RtspProbe {
    async fn probe(
        &mut self,
        request: &ProbeRequest<'_>,
    ) -> Result<ProbeResponse, camsweep_rtsp::Error> {
        let url = camsweep_rtsp::rtsp_url(request.address, request.port, request.path)?;
        let auth = request_auth(request.credentials, request.auth_type);
        let (method, transport) = match request.kind {
            RequestKind::Describe => (Method::Describe, None),
            RequestKind::Setup => (Method::Setup, Some(SETUP_TRANSPORT)),
        };

        let response = self.session.send(method, &url, auth, transport).await?;
        Ok(ProbeResponse::new(response.status()).with_auth_methods(response.auth_methods()))
    }
}

/// Map a detected scheme onto the client's authentication mode.
///
/// An undetected scheme negotiates from whatever the server challenges.
fn request_auth(credentials: Option<&Credentials>, auth_type: AuthType) -> Auth<'_> {
    let Some(credentials) = credentials else {
        return Auth::None;
    };
    let credentials = credentials.as_rtsp();
    match auth_type {
        AuthType::None => Auth::None,
        AuthType::Basic => Auth::Basic(credentials),
        AuthType::Digest => Auth::Digest(credentials),
        AuthType::Unknown => Auth::Negotiate(credentials),
    }
}
