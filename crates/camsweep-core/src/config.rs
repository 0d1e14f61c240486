// ── Runtime scan configuration ──
//
// Immutable value objects describing one scan. They carry dictionaries
// and tuning but never touch disk; the configuration crate builds them
// and hands them in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::dictionary::{CredentialDictionary, RouteDictionary};
use crate::error::CoreError;
use crate::model::Credentials;

pub const DEFAULT_PORTS: [u16; 3] = [554, 5554, 8554];
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_SCAN_SPEED: u8 = 4;

/// Where credential candidates come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Every username × password pair of a dictionary.
    Dictionary(CredentialDictionary),
    /// A single externally supplied pair replacing the dictionary.
    Fixed {
        username: String,
        password: SecretString,
    },
}

impl CredentialSource {
    /// Candidate pairs in attempt order.
    pub fn pairs(&self) -> Vec<Credentials> {
        match self {
            Self::Dictionary(dict) => dict.pairs().collect(),
            Self::Fixed { username, password } => {
                vec![Credentials::new(username.clone(), password.expose_secret())]
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Dictionary(dict) => dict.len(),
            Self::Fixed { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the attack engine needs for one run.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    pub routes: RouteDictionary,
    pub credentials: CredentialSource,
    /// Bound on each probe (connect, request and reply).
    pub timeout: Duration,
    /// Pause between consecutive probes of one device.
    pub attack_interval: Duration,
}

impl AttackConfig {
    pub fn new(routes: RouteDictionary, credentials: CredentialSource) -> Self {
        Self {
            routes,
            credentials,
            timeout: DEFAULT_TIMEOUT,
            attack_interval: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attack_interval(mut self, interval: Duration) -> Self {
        self.attack_interval = interval;
        self
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// Discovery aggressiveness, 0 (paranoid) to 5 (insane).
///
/// Higher speeds scan more endpoints at once and give up on silent ones
/// sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanSpeed(u8);

impl ScanSpeed {
    pub const MAX: u8 = 5;

    pub fn new(speed: u8) -> Result<Self, CoreError> {
        if speed > Self::MAX {
            return Err(CoreError::InvalidScanSpeed { speed });
        }
        Ok(Self(speed))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Endpoints probed at the same time.
    pub fn concurrency(self) -> usize {
        match self.0 {
            0 => 1,
            1 => 4,
            2 => 16,
            3 => 64,
            4 => 256,
            _ => 1024,
        }
    }

    /// Bound on the connect + OPTIONS exchange for one endpoint.
    pub fn probe_timeout(self) -> Duration {
        match self.0 {
            0 => Duration::from_secs(5),
            1 => Duration::from_secs(3),
            2 => Duration::from_secs(2),
            3 => Duration::from_millis(1250),
            4 => Duration::from_millis(750),
            _ => Duration::from_millis(300),
        }
    }
}

impl Default for ScanSpeed {
    fn default() -> Self {
        Self(DEFAULT_SCAN_SPEED)
    }
}

/// Inputs to network discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Raw target expressions: addresses, CIDR blocks, ranges, hostnames.
    pub targets: Vec<String>,
    /// Raw port expressions such as `554,8554-8560`.
    pub ports: Vec<String>,
    pub speed: ScanSpeed,
}

impl ScanConfig {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            ports: DEFAULT_PORTS.iter().map(ToString::to_string).collect(),
            speed: ScanSpeed::default(),
        }
    }

    pub fn with_ports(mut self, ports: Vec<String>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_speed(mut self, speed: ScanSpeed) -> Self {
        self.speed = speed;
        self
    }
}
