// Authentication detection: one unauthenticated DESCRIBE per device.

use tracing::{debug, warn};

use super::fanout::PhaseContext;
use crate::model::{AuthType, Device};
use crate::probe::{ProbeRequest, RequestKind};

/// Learn the device-wide scheme from its first route (or the root path).
pub(crate) async fn detect(ctx: PhaseContext, mut device: Device) -> Device {
    let mut probe = ctx.factory.session();
    let path = device
        .routes
        .first()
        .map_or_else(String::new, |r| r.path.clone());

    let request = ProbeRequest {
        address: &device.address,
        port: device.port,
        path: &path,
        credentials: None,
        auth_type: AuthType::None,
        kind: RequestKind::Describe,
    };
    let auth_type = match probe.probe(&request).await {
        Ok(resp) => AuthType::from_methods(resp.auth_methods),
        Err(err) => {
            warn!(device = %device.key(), error = %err, "authentication detection failed");
            AuthType::Unknown
        }
    };

    debug!(device = %device.key(), auth = %auth_type, "authentication method detected");
    device.auth_type = auth_type;
    for route in &mut device.routes {
        route.auth_type = auth_type;
    }
    device
}
