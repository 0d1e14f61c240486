// Route discovery: DESCRIBE every dictionary path, keep the ones that exist.

use camsweep_rtsp::status;
use tracing::debug;

use super::fanout::PhaseContext;
use crate::model::{Device, Route};
use crate::probe::{ProbeRequest, RequestKind};

/// A 401 or 403 still proves the path exists; only the credentials are wrong.
pub(crate) fn route_exists(status: u16) -> bool {
    matches!(
        status,
        status::OK | status::UNAUTHORIZED | status::FORBIDDEN
    )
}

/// Replace the device's routes with the paths found in this pass.
pub(crate) async fn discover(ctx: PhaseContext, mut device: Device) -> Device {
    let mut probe = ctx.factory.session();
    let mut pacer = ctx.pacer();
    let mut found = Vec::new();

    for path in ctx.config.routes.iter() {
        pacer.wait().await;
        let request = ProbeRequest {
            address: &device.address,
            port: device.port,
            path,
            credentials: device.credentials.as_ref(),
            auth_type: device.auth_type,
            kind: RequestKind::Describe,
        };
        match probe.probe(&request).await {
            Ok(resp) if route_exists(resp.status) => {
                debug!(device = %device.key(), route = path, status = resp.status, "route found");
                found.push(Route::new(path, device.auth_type));
            }
            Ok(resp) => {
                debug!(device = %device.key(), route = path, status = resp.status, "route rejected");
            }
            Err(err) => {
                debug!(device = %device.key(), route = path, error = %err, "route probe failed");
            }
        }
    }

    device.routes = found;
    device
}
