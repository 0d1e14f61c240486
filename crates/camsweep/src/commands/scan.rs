//! `camsweep scan`: discovery, then attack.

use tracing::info;

use camsweep_config::{Config, ScanOverrides};
use camsweep_core::Scanner;
use camsweep_core::discovery::local_networks;

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::progress::Progress;

use super::OutputOpts;

pub async fn handle(args: ScanArgs, cfg: &Config, display: OutputOpts) -> Result<(), CliError> {
    let overrides = ScanOverrides {
        ports: args.ports,
        scan_speed: args.scan_speed,
    };
    let targets = if args.targets.is_empty() {
        let networks = local_networks();
        if networks.is_empty() {
            return Err(CliError::NoTargets);
        }
        info!(networks = ?networks, "no targets given, scanning local networks");
        networks
    } else {
        args.targets
    };
    let scan_config = camsweep_config::build_scan_config(cfg, targets, &overrides)?;

    let progress = Progress::new(display.quiet);
    progress.message(format!(
        "Scanning {} target(s) at speed {}",
        scan_config.targets.len(),
        scan_config.speed.value()
    ));
    let result = Scanner::new(scan_config).scan().await;
    progress.finish();
    let devices = result?;

    if devices.is_empty() {
        super::report(&devices, display);
        return Ok(());
    }
    super::attack_and_report(devices, &args.attack, cfg, display).await
}
