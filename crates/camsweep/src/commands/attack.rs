//! `camsweep attack`: attack endpoints given on the command line.

use camsweep_config::Config;
use camsweep_core::discovery::parse_endpoint;

use crate::cli::AttackArgs;
use crate::error::CliError;

use super::OutputOpts;

pub async fn handle(args: AttackArgs, cfg: &Config, display: OutputOpts) -> Result<(), CliError> {
    let endpoints = camsweep_config::expand_target_file(args.endpoints)?;
    let devices = endpoints
        .iter()
        .map(|spec| parse_endpoint(spec, args.default_port))
        .collect::<Result<Vec<_>, _>>()?;

    super::attack_and_report(devices, &args.attack, cfg, display).await
}
