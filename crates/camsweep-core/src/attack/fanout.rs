// ── Per-device fan-out / fan-in ──
//
// Every per-device phase runs one task per device, waits for all of them,
// and merges the results back by `(address, port)`. Completion order never
// matters.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::AttackConfig;
use crate::model::{Credentials, Device, DeviceKey};
use crate::probe::ProbeFactory;

// ── DeviceSet ────────────────────────────────────────────────────────

/// The canonical device collection, keyed by identity.
///
/// Each distinct `(address, port)` is attacked once, but every input
/// position is remembered so [`into_vec`](Self::into_vec) hands back one
/// device per input, in input order.
#[derive(Debug, Clone, Default)]
pub struct DeviceSet {
    devices: IndexMap<DeviceKey, Device>,
    order: Vec<DeviceKey>,
}

impl DeviceSet {
    /// Build from a list. Duplicates of a key share the first entry.
    pub fn from_devices(devices: Vec<Device>) -> Self {
        let mut set = IndexMap::with_capacity(devices.len());
        let mut order = Vec::with_capacity(devices.len());
        for device in devices {
            let key = device.key();
            order.push(key.clone());
            if set.contains_key(&key) {
                debug!(device = %key, "duplicate target shares the first entry");
                continue;
            }
            set.insert(key, device);
        }
        Self {
            devices: set,
            order,
        }
    }

    /// Number of distinct devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, key: &DeviceKey) -> Option<&Device> {
        self.devices.get(key)
    }

    pub fn get_mut(&mut self, key: &DeviceKey) -> Option<&mut Device> {
        self.devices.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Replace the entry with the same key. Unknown keys are ignored; a
    /// phase never introduces devices.
    pub fn replace(&mut self, device: Device) {
        if let Some(slot) = self.devices.get_mut(&device.key()) {
            *slot = device;
        }
    }

    pub fn any_without_routes(&self) -> bool {
        self.devices.values().any(|d| d.routes.is_empty())
    }

    /// One device per input position. Duplicate positions get a copy of
    /// the merged entry.
    pub fn into_vec(self) -> Vec<Device> {
        let Self { mut devices, order } = self;
        let mut out = Vec::with_capacity(order.len());
        for (i, key) in order.iter().enumerate() {
            let last_use = !order[i + 1..].contains(key);
            let device = if last_use {
                devices.swap_remove(key)
            } else {
                devices.get(key).cloned()
            };
            out.extend(device);
        }
        out
    }
}

// ── Phase context ────────────────────────────────────────────────────

/// Shared, read-only inputs handed to every unit of a phase.
#[derive(Clone)]
pub(crate) struct PhaseContext {
    pub config: Arc<AttackConfig>,
    pub credentials: Arc<[Credentials]>,
    pub factory: Arc<dyn ProbeFactory>,
}

impl PhaseContext {
    pub fn pacer(&self) -> Pacer {
        Pacer::new(self.config.attack_interval)
    }
}

/// Spaces consecutive probes of one unit by the attack interval.
///
/// The first call returns immediately; each later call sleeps first.
#[derive(Debug)]
pub(crate) struct Pacer {
    interval: Duration,
    started: bool,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: false,
        }
    }

    pub async fn wait(&mut self) {
        if self.started && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;
    }
}

// ── fan_out ──────────────────────────────────────────────────────────

/// Run `unit` once per device concurrently and merge every result back.
///
/// A unit that panics leaves its device as it was before the phase.
pub(crate) async fn fan_out<F, Fut>(mut set: DeviceSet, unit: F) -> DeviceSet
where
    F: Fn(Device) -> Fut,
    Fut: Future<Output = Device> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for device in set.iter() {
        tasks.spawn(unit(device.clone()));
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(device) => set.replace(device),
            Err(err) => warn!(error = %err, "device task failed, keeping previous state"),
        }
    }

    set
}
