//! Command handlers.

pub mod attack;
pub mod config_cmd;
pub mod scan;

use clap::ValueEnum;
use secrecy::SecretString;

use camsweep_config::{AttackOverrides, Config};
use camsweep_core::{Attacker, Device};

use crate::cli::{AttackOpts, ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::progress::Progress;
use crate::screenshot::{self, FrameGrabber};

// ── Shared context ──────────────────────────────────────────────────

/// Output settings resolved from flags, then the config file.
#[derive(Debug, Clone, Copy)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl OutputOpts {
    pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let format = match global.output {
            Some(format) => format,
            None => parse_enum("output", &cfg.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_enum::<ColorMode>("color", &cfg.defaults.color)?,
        };
        Ok(Self {
            format,
            color: output::should_color(color),
            quiet: global.quiet,
        })
    }
}

fn parse_enum<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

impl From<&AttackOpts> for AttackOverrides {
    fn from(opts: &AttackOpts) -> Self {
        Self {
            routes: opts.custom_routes.clone(),
            credentials: opts.custom_credentials.clone(),
            usernames: opts.usernames.clone(),
            passwords: opts.passwords.clone(),
            username: opts.username.clone(),
            password: opts.password.clone().map(SecretString::from),
            timeout: opts.timeout,
            attack_interval: opts.attack_interval,
        }
    }
}

// ── Attack pipeline ─────────────────────────────────────────────────

/// One frame may take a few request timeouts: connect, DESCRIBE, SETUP, PLAY.
const FRAME_LIMIT_FACTOR: u32 = 5;

/// Attack `devices`, take screenshots if asked, print results and summary.
pub async fn attack_and_report(
    devices: Vec<Device>,
    opts: &AttackOpts,
    cfg: &Config,
    display: OutputOpts,
) -> Result<(), CliError> {
    let config = camsweep_config::build_attack_config(cfg, &AttackOverrides::from(opts))?;
    let frame_limit = config.timeout.saturating_mul(FRAME_LIMIT_FACTOR);

    let attacker = Attacker::rtsp(config);
    let mut progress = Progress::new(display.quiet);
    progress.follow(attacker.subscribe());
    let result = attacker.attack(devices).await;
    progress.finish();
    let mut devices = result?;

    if let Some(ref dir) = opts.screenshots {
        let grabber = FrameGrabber::ffmpeg(frame_limit);
        devices = screenshot::capture_all(devices, dir, grabber).await;
    }

    report(&devices, display);
    Ok(())
}

pub fn report(devices: &[Device], display: OutputOpts) {
    let rendered = output::render_devices(display.format, devices, display.color);
    output::print_output(&rendered, display.quiet);
    output::print_status(&output::summary(devices), display.quiet, display.color);
}
