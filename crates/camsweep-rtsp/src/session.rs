// RTSP request session.
//
// A `Session` is owned by exactly one unit of work. It carries the
// request timeout, the User-Agent and a CSeq counter; each `send()`
// opens a fresh TCP connection, so sessions never share sockets.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};
use url::{Host, Url};

use crate::auth::{Auth, AuthMethods, basic_authorization};
use crate::error::Error;
use crate::message::{Method, Request, Response};
use crate::status;

const DEFAULT_USER_AGENT: &str = concat!("camsweep/", env!("CARGO_PKG_VERSION"));
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Build `rtsp://host:port/path`, bracketing IPv6 literals.
pub fn rtsp_url(host: &str, port: u16, path: &str) -> Result<Url, Error> {
    let host = host.trim_matches(|c| c == '[' || c == ']');
    let path = path.trim_start_matches('/');
    let raw = if host.contains(':') {
        format!("rtsp://[{host}]:{port}/{path}")
    } else {
        format!("rtsp://{host}:{port}/{path}")
    };
    Ok(Url::parse(&raw)?)
}

/// One probe session. Cheap to create; create one per concurrent unit.
#[derive(Debug)]
pub struct Session {
    timeout: Duration,
    user_agent: String,
    cseq: u32,
}

impl Session {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: DEFAULT_USER_AGENT.into(),
            cseq: 0,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one request and return the final response.
    ///
    /// The whole exchange (connect, challenge round-trip, body drain) is
    /// bounded by the session timeout.
    pub async fn send(
        &mut self,
        method: Method,
        url: &Url,
        auth: Auth<'_>,
        transport: Option<&str>,
    ) -> Result<Response, Error> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.timeout, self.exchange(method, url, auth, transport))
            .await
            .map_err(|_| Error::Timeout { timeout_ms })?
    }

    async fn exchange(
        &mut self,
        method: Method,
        url: &Url,
        auth: Auth<'_>,
        transport: Option<&str>,
    ) -> Result<Response, Error> {
        let (host, port) = socket_target(url)?;
        let mut stream = connect(&host, port).await?;

        let preemptive = match auth {
            Auth::Basic(credentials) => Some(basic_authorization(credentials)),
            _ => None,
        };
        let response = self
            .round_trip(&mut stream, method, url, preemptive, transport)
            .await?;

        if response.status() != status::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(answer) = challenge_answer(&response, auth, method, url) else {
            return Ok(response);
        };

        trace!(%url, "answering authentication challenge");
        match self
            .round_trip(&mut stream, method, url, Some(answer.clone()), transport)
            .await
        {
            // Some servers close the socket after a 401; retry on a new one.
            Err(Error::ConnectionClosed | Error::Io(_)) => {
                let mut stream = connect(&host, port).await?;
                self.round_trip(&mut stream, method, url, Some(answer), transport)
                    .await
            }
            other => other,
        }
    }

    async fn round_trip(
        &mut self,
        stream: &mut TcpStream,
        method: Method,
        url: &Url,
        authorization: Option<String>,
        transport: Option<&str>,
    ) -> Result<Response, Error> {
        self.cseq += 1;
        let mut request = Request::new(method, url.as_str(), self.cseq)
            .header("User-Agent", self.user_agent.clone());
        if method == Method::Describe {
            request = request.header("Accept", "application/sdp");
        }
        if let Some(transport) = transport {
            request = request.header("Transport", transport);
        }
        if let Some(authorization) = authorization {
            request = request.header("Authorization", authorization);
        }

        stream.write_all(&request.encode()).await?;
        let response = read_response(stream).await?;
        debug!(
            method = %method,
            %url,
            status = response.status(),
            "RTSP/1.0 >"
        );
        Ok(response)
    }
}

/// Pick the `Authorization` value answering a 401, if we can.
fn challenge_answer(response: &Response, auth: Auth<'_>, method: Method, url: &Url) -> Option<String> {
    let credentials = auth.credentials()?;
    match auth {
        Auth::Digest(_) => response
            .digest_challenge()
            .map(|chal| chal.authorization(credentials, method, url.as_str())),
        Auth::Negotiate(_) => {
            if let Some(chal) = response.digest_challenge() {
                Some(chal.authorization(credentials, method, url.as_str()))
            } else if response.auth_methods().contains(AuthMethods::BASIC) {
                Some(basic_authorization(credentials))
            } else {
                None
            }
        }
        Auth::None | Auth::Basic(_) => None,
    }
}

fn socket_target(url: &Url) -> Result<(String, u16), Error> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => {
            return Err(Error::MissingHost {
                url: url.to_string(),
            });
        }
    };
    Ok((host, url.port().unwrap_or(554)))
}

async fn connect(host: &str, port: u16) -> Result<TcpStream, Error> {
    TcpStream::connect((host, port))
        .await
        .map_err(|source| Error::Connect {
            addr: format!("{host}:{port}"),
            source,
        })
}

/// Read one response head, then drain and discard its body.
async fn read_response(stream: &mut TcpStream) -> Result<Response, Error> {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    let mut consumed = 0usize;
    let too_large = || Error::HeaderTooLarge {
        limit: MAX_HEAD_BYTES,
    };

    loop {
        // Each line may only use what is left of the head budget.
        let budget = MAX_HEAD_BYTES.saturating_sub(consumed);
        if budget == 0 {
            return Err(too_large());
        }
        let mut line = String::new();
        let limit = u64::try_from(budget).unwrap_or(u64::MAX);
        let read = (&mut reader).take(limit).read_line(&mut line).await?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        consumed += read;
        if !line.ends_with('\n') {
            return Err(if read == budget {
                too_large()
            } else {
                Error::ConnectionClosed
            });
        }
        if line == "\r\n" || line == "\n" {
            if head.is_empty() {
                // Tolerate stray blank lines before the status line.
                continue;
            }
            break;
        }
        head.push_str(&line);
    }

    let response = Response::parse_head(&head)?;

    let body = response.content_length();
    if body > 0 {
        let body = u64::try_from(body).unwrap_or(u64::MAX);
        tokio::io::copy(&mut (&mut reader).take(body), &mut tokio::io::sink()).await?;
    }

    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rtsp_url_handles_paths_and_ipv6() {
        assert_eq!(
            rtsp_url("10.0.0.2", 554, "/live.sdp").unwrap().as_str(),
            "rtsp://10.0.0.2:554/live.sdp"
        );
        assert_eq!(
            rtsp_url("10.0.0.2", 8554, "").unwrap().as_str(),
            "rtsp://10.0.0.2:8554/"
        );
        assert_eq!(
            rtsp_url("fe80::1", 554, "ch0").unwrap().as_str(),
            "rtsp://[fe80::1]:554/ch0"
        );
    }

    #[test]
    fn socket_target_strips_brackets() {
        let url = rtsp_url("::1", 8554, "x").unwrap();
        assert_eq!(socket_target(&url).unwrap(), ("::1".to_string(), 8554));
    }

    #[test]
    fn challenge_answer_respects_auth_mode() {
        let head = "RTSP/1.0 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"x\"";
        let resp = Response::parse_head(head).unwrap();
        let url = rtsp_url("h", 554, "p").unwrap();
        let creds = crate::Credentials::new("admin", "admin");

        assert!(challenge_answer(&resp, Auth::None, Method::Describe, &url).is_none());
        assert!(challenge_answer(&resp, Auth::Digest(creds), Method::Describe, &url).is_none());
        assert_eq!(
            challenge_answer(&resp, Auth::Negotiate(creds), Method::Describe, &url).as_deref(),
            Some("Basic YWRtaW46YWRtaW4=")
        );
    }
}
