//! Stream thumbnails through an external `ffmpeg`.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use camsweep_core::Device;

/// File name for one frame of `route` on `address:port`.
pub fn image_name(address: &str, port: u16, route: &str) -> String {
    let address = address.replace(['.', ':'], "_");
    let route = route.replace('/', "_");
    format!("{address}_{port}_{route}.jpg")
}

// ── FrameGrabber ─────────────────────────────────────────────────────

/// Runs `ffmpeg` for a single frame, killing it once `limit` passes.
#[derive(Debug, Clone)]
pub struct FrameGrabber {
    program: OsString,
    limit: Duration,
}

impl FrameGrabber {
    pub fn ffmpeg(limit: Duration) -> Self {
        Self {
            program: OsString::from("ffmpeg"),
            limit,
        }
    }

    #[cfg(test)]
    fn with_program(program: impl Into<OsString>, limit: Duration) -> Self {
        Self {
            program: program.into(),
            limit,
        }
    }

    async fn grab(&self, url: &str, file: &Path) -> bool {
        let run = Command::new(&self.program)
            .args(["-loglevel", "fatal", "-y", "-i", url, "-vframes", "1", "-r", "1"])
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();
        // Dropping the timed-out future drops the child, which kills it.
        match tokio::time::timeout(self.limit, run).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(err)) => {
                debug!(error = %err, "cannot run ffmpeg");
                false
            }
            Err(_) => {
                debug!(limit = ?self.limit, "ffmpeg timed out");
                false
            }
        }
    }
}

// ── Capture ──────────────────────────────────────────────────────────

/// Grab one frame of every route with found credentials, one task per
/// device, and record the file name on the route. Failures are logged and
/// leave `image_url` empty.
pub async fn capture_all(devices: Vec<Device>, dir: &Path, grabber: FrameGrabber) -> Vec<Device> {
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %err, "cannot create screenshot directory");
        return devices;
    }

    let dir: Arc<Path> = Arc::from(dir);
    let grabber = Arc::new(grabber);
    let mut tasks = JoinSet::new();
    for (index, device) in devices.iter().enumerate() {
        if device.routes.iter().any(|r| r.credentials_found) {
            let dir = Arc::clone(&dir);
            let grabber = Arc::clone(&grabber);
            let device = device.clone();
            tasks.spawn(async move { (index, capture_device(device, &dir, &grabber).await) });
        }
    }

    let mut devices = devices;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, captured)) => {
                if let Some(slot) = devices.get_mut(index) {
                    *slot = captured;
                }
            }
            Err(err) => warn!(error = %err, "screenshot task failed"),
        }
    }
    devices
}

async fn capture_device(mut device: Device, dir: &Path, grabber: &FrameGrabber) -> Device {
    let mut shots = Vec::new();
    for (index, route) in device.routes.iter().enumerate() {
        if !route.credentials_found {
            continue;
        }
        let url = match device.stream_url(&route.path) {
            Ok(url) => url,
            Err(err) => {
                warn!(device = %device.key(), route = %route.path, error = %err, "cannot build stream URL");
                continue;
            }
        };
        let name = image_name(&device.address, device.port, &route.path);
        let file = dir.join(&name);
        if grabber.grab(url.as_str(), &file).await {
            debug!(device = %device.key(), route = %route.path, file = %file.display(), "screenshot saved");
            shots.push((index, file));
        } else {
            warn!(device = %device.key(), route = %route.path, "screenshot failed");
        }
    }
    for (index, file) in shots {
        if let Some(route) = device.routes.get_mut(index) {
            route.image_url = Some(file.display().to_string());
        }
    }
    device
}
