// ── Network discovery ──
//
// Finds RTSP endpoints: every host × port gets a TCP connect and an
// OPTIONS request. Anything answering with an RTSP status line, whatever
// the code, becomes a device.

mod local;
mod ports;
mod targets;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, trace, warn};

use camsweep_rtsp::{Auth, Method, Session};

use crate::config::ScanConfig;
use crate::error::CoreError;
use crate::model::Device;

pub use local::local_networks;
pub use ports::parse_ports;
pub use targets::{expand_target, expand_targets, parse_endpoint};

/// Scans targets for RTSP servers.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Probe every host × port and return the endpoints that speak RTSP,
    /// in target then port order.
    pub async fn scan(&self) -> Result<Vec<Device>, CoreError> {
        let hosts = expand_targets(&self.config.targets)?;
        if hosts.is_empty() {
            return Err(CoreError::NoTargets);
        }
        let ports = parse_ports(&self.config.ports)?;

        let speed = self.config.speed;
        info!(
            hosts = hosts.len(),
            ports = ports.len(),
            speed = speed.value(),
            "scanning network"
        );

        let timeout = speed.probe_timeout();
        let endpoints = hosts
            .iter()
            .flat_map(|host| ports.iter().map(move |port| (host.clone(), *port)));
        let found = bounded(endpoints, speed.concurrency(), |(host, port)| async move {
            probe_endpoint(&host, port, timeout).await
        })
        .await;

        let devices: Vec<Device> = found.into_iter().map(|(_, device)| device).collect();
        info!(devices = devices.len(), "scan finished");
        Ok(devices)
    }
}

/// Run `unit` over `items` with at most `limit` units in flight and return
/// the `Some` results tagged with their input index, in input order.
///
/// A permit is taken before each unit is created, so a large target list
/// never turns into a large set of parked tasks.
async fn bounded<I, T, F, Fut>(items: I, limit: usize, unit: F) -> Vec<(usize, T)>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Option<T>> + Send + 'static,
    T: Send + 'static,
{
    let limiter = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut found = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
            break;
        };
        let work = unit(item);
        tasks.spawn(async move {
            let hit = work.await;
            drop(permit);
            hit.map(|value| (index, value))
        });
        while let Some(joined) = tasks.try_join_next() {
            collect(joined, &mut found);
        }
    }
    while let Some(joined) = tasks.join_next().await {
        collect(joined, &mut found);
    }

    found.sort_by_key(|(index, _)| *index);
    found
}

fn collect<T>(joined: Result<Option<T>, JoinError>, found: &mut Vec<T>) {
    match joined {
        Ok(Some(hit)) => found.push(hit),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "endpoint probe task failed"),
    }
}

/// Connect and send OPTIONS; `Some` when the reply is RTSP.
async fn probe_endpoint(host: &str, port: u16, timeout: std::time::Duration) -> Option<Device> {
    let url = match camsweep_rtsp::rtsp_url(host, port, "") {
        Ok(url) => url,
        Err(err) => {
            debug!(host, port, error = %err, "cannot build probe URL");
            return None;
        }
    };

    match Session::new(timeout)
        .send(Method::Options, &url, Auth::None, None)
        .await
    {
        Ok(resp) => {
            debug!(host, port, status = resp.status(), server = ?resp.server(), "RTSP endpoint found");
            Some(Device::new(host, port).with_label(resp.server()))
        }
        Err(err) => {
            trace!(host, port, error = %err, "not an RTSP endpoint");
            None
        }
    }
}
