// Accessibility validation: SETUP each route with the device credentials.

use camsweep_rtsp::status;
use tracing::debug;

use super::fanout::PhaseContext;
use crate::model::Device;
use crate::probe::{ProbeRequest, RequestKind};

pub(crate) async fn validate(ctx: PhaseContext, mut device: Device) -> Device {
    let mut probe = ctx.factory.session();
    let mut pacer = ctx.pacer();

    for index in 0..device.routes.len() {
        pacer.wait().await;
        let Some(route) = device.routes.get(index) else {
            break;
        };
        let request = ProbeRequest {
            address: &device.address,
            port: device.port,
            path: &route.path,
            credentials: device.credentials.as_ref(),
            auth_type: route.auth_type,
            kind: RequestKind::Setup,
        };
        let available = match probe.probe(&request).await {
            Ok(resp) => resp.status == status::OK,
            Err(err) => {
                debug!(device = %device.key(), route = %route.path, error = %err, "setup probe failed");
                false
            }
        };

        debug!(device = %device.key(), route = %route.path, available, "validated");
        if let Some(route) = device.routes.get_mut(index) {
            route.available = available;
        }
    }

    device
}
