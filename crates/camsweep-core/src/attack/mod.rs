// ── Attack orchestration ──
//
// Drives the per-device phases over the whole device collection:
// route discovery, authentication detection, credential attack and
// validation, then one optional second round of discovery + validation
// for servers that rank 401 above 404.

mod auth;
mod credentials;
mod fanout;
mod routes;
mod validate;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::config::AttackConfig;
use crate::error::CoreError;
use crate::model::Device;
use crate::probe::{ProbeFactory, RtspProbeFactory};

pub use fanout::DeviceSet;
use fanout::{PhaseContext, fan_out};

// ── AttackState ──────────────────────────────────────────────────────

/// Which step the orchestrator is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case")]
pub enum Phase {
    Idle,
    RouteDiscovery,
    AuthDetection,
    CredentialAttack,
    Validation,
    Done,
}

/// Orchestrator progress, observable through [`Attacker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackState {
    pub phase: Phase,
    /// 1 for the main pass, 2 for the retry round.
    pub round: u8,
    pub devices: usize,
}

impl AttackState {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            round: 0,
            devices: 0,
        }
    }
}

// ── Attacker ─────────────────────────────────────────────────────────

/// Runs attacks against discovered devices.
///
/// Cheap to share behind an `Arc`; all per-run state lives in the device
/// collection passed through [`attack()`](Self::attack).
pub struct Attacker {
    ctx: PhaseContext,
    state: watch::Sender<AttackState>,
}

impl Attacker {
    pub fn new(config: AttackConfig, factory: Arc<dyn ProbeFactory>) -> Self {
        let credentials = config.credentials.pairs().into();
        let (state, _) = watch::channel(AttackState::idle());
        Self {
            ctx: PhaseContext {
                config: Arc::new(config),
                credentials,
                factory,
            },
            state,
        }
    }

    /// An attacker probing over RTSP with the configured timeout.
    pub fn rtsp(config: AttackConfig) -> Self {
        let factory = Arc::new(RtspProbeFactory::new(config.timeout));
        Self::new(config, factory)
    }

    pub fn config(&self) -> &AttackConfig {
        &self.ctx.config
    }

    /// Watch orchestrator progress.
    pub fn subscribe(&self) -> watch::Receiver<AttackState> {
        self.state.subscribe()
    }

    /// Run every phase and return the enriched devices, in input order.
    ///
    /// Finding nothing is a result, not an error; the only failure is an
    /// empty target list.
    pub async fn attack(&self, targets: Vec<Device>) -> Result<Vec<Device>, CoreError> {
        if targets.is_empty() {
            return Err(CoreError::NoTargets);
        }

        let mut set = DeviceSet::from_devices(targets);
        info!(
            devices = set.len(),
            routes = self.ctx.config.routes.len(),
            credentials = self.ctx.credentials.len(),
            "starting attack"
        );

        set = self.run_phase(set, Phase::RouteDiscovery, 1, routes::discover).await;
        set = self.run_phase(set, Phase::AuthDetection, 1, auth::detect).await;
        set = self.run_phase(set, Phase::CredentialAttack, 1, credentials::attack).await;
        set = self.run_phase(set, Phase::Validation, 1, validate::validate).await;

        if set.any_without_routes() {
            info!("devices without routes remain, running a second round");
            set = self.rediscover(set).await;
            set = self.run_phase(set, Phase::Validation, 2, validate::validate).await;
        }

        self.publish(Phase::Done, 0, set.len());
        let devices = set.into_vec();
        info!(
            accessed = devices.iter().filter(|d| d.is_accessible()).count(),
            "attack finished"
        );
        Ok(devices)
    }

    // ── Individual phases ────────────────────────────────────────────

    /// Route discovery alone. Each device's routes are replaced by the
    /// paths found in this pass.
    pub async fn discover_routes(&self, devices: Vec<Device>) -> Vec<Device> {
        let set = DeviceSet::from_devices(devices);
        self.run_phase(set, Phase::RouteDiscovery, 1, routes::discover)
            .await
            .into_vec()
    }

    pub async fn detect_auth_methods(&self, devices: Vec<Device>) -> Vec<Device> {
        let set = DeviceSet::from_devices(devices);
        self.run_phase(set, Phase::AuthDetection, 1, auth::detect)
            .await
            .into_vec()
    }

    pub async fn attack_credentials(&self, devices: Vec<Device>) -> Vec<Device> {
        let set = DeviceSet::from_devices(devices);
        self.run_phase(set, Phase::CredentialAttack, 1, credentials::attack)
            .await
            .into_vec()
    }

    pub async fn validate(&self, devices: Vec<Device>) -> Vec<Device> {
        let set = DeviceSet::from_devices(devices);
        self.run_phase(set, Phase::Validation, 1, validate::validate)
            .await
            .into_vec()
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Second-round discovery over every device, merged into known routes.
    async fn rediscover(&self, mut set: DeviceSet) -> DeviceSet {
        let found = self
            .run_phase(set.clone(), Phase::RouteDiscovery, 2, routes::discover)
            .await;
        for device in found.into_vec() {
            if let Some(existing) = set.get_mut(&device.key()) {
                existing.merge_routes(device.routes);
            }
        }
        set
    }

    async fn run_phase<F, Fut>(&self, set: DeviceSet, phase: Phase, round: u8, unit: F) -> DeviceSet
    where
        F: Fn(PhaseContext, Device) -> Fut,
        Fut: Future<Output = Device> + Send + 'static,
    {
        self.publish(phase, round, set.len());
        info!(%phase, round, devices = set.len(), "phase started");
        let ctx = &self.ctx;
        fan_out(set, |device| unit(ctx.clone(), device)).await
    }

    fn publish(&self, phase: Phase, round: u8, devices: usize) {
        self.state.send_replace(AttackState {
            phase,
            round,
            devices,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names_are_readable() {
        assert_eq!(Phase::RouteDiscovery.to_string(), "Route Discovery");
        assert_eq!(Phase::CredentialAttack.to_string(), "Credential Attack");
    }
}
