// Credential attack: walk the dictionary per route until a pair is accepted.

use camsweep_rtsp::status;
use tracing::debug;

use super::fanout::{Pacer, PhaseContext};
use crate::model::{Credentials, Device};
use crate::probe::{Probe, ProbeRequest, RequestKind};

/// A 404 after authenticating means the credentials passed and only the
/// path is wrong.
pub(crate) fn credentials_accepted(status: u16) -> bool {
    matches!(status, status::OK | status::NOT_FOUND)
}

/// Find working credentials for every route of the device.
///
/// The first accepted pair becomes the device's credentials. Later routes
/// try that pair before going through the dictionary.
pub(crate) async fn attack(ctx: PhaseContext, mut device: Device) -> Device {
    let mut probe = ctx.factory.session();
    let mut pacer = ctx.pacer();

    for index in 0..device.routes.len() {
        let known = device.credentials.clone();
        let candidates = known
            .iter()
            .chain(ctx.credentials.iter().filter(|c| Some(*c) != known.as_ref()));

        let mut accepted = None;
        for credentials in candidates {
            if try_pair(&mut *probe, &mut pacer, &device, index, credentials).await {
                accepted = Some(credentials.clone());
                break;
            }
        }

        let Some(credentials) = accepted else {
            continue;
        };
        if let Some(route) = device.routes.get_mut(index) {
            route.credentials_found = true;
        }
        if device.credentials.is_none() {
            device.credentials = Some(credentials);
        }
    }

    device
}

async fn try_pair(
    probe: &mut dyn Probe,
    pacer: &mut Pacer,
    device: &Device,
    index: usize,
    credentials: &Credentials,
) -> bool {
    let Some(route) = device.routes.get(index) else {
        return false;
    };
    pacer.wait().await;

    let request = ProbeRequest {
        address: &device.address,
        port: device.port,
        path: &route.path,
        credentials: Some(credentials),
        auth_type: route.auth_type,
        kind: RequestKind::Describe,
    };
    match probe.probe(&request).await {
        Ok(resp) => {
            let ok = credentials_accepted(resp.status);
            debug!(
                device = %device.key(),
                route = %route.path,
                username = %credentials.username,
                status = resp.status,
                accepted = ok,
                "credential attempt"
            );
            ok
        }
        Err(err) => {
            debug!(device = %device.key(), route = %route.path, error = %err, "credential probe failed");
            false
        }
    }
}
