//! Config subcommand handlers.

use std::path::Path;

use camsweep_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::OutputOpts;

pub fn handle(
    args: ConfigArgs,
    path: &Path,
    cfg: &Config,
    display: OutputOpts,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), display.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let rendered = match display.format {
                OutputFormat::Json => serde_json::to_string_pretty(cfg).map_err(json_err)?,
                OutputFormat::JsonCompact => serde_json::to_string(cfg).map_err(json_err)?,
                OutputFormat::Yaml => serde_yaml::to_string(cfg).map_err(|e| {
                    CliError::Validation {
                        field: "output".into(),
                        reason: e.to_string(),
                    }
                })?,
                OutputFormat::Table | OutputFormat::Plain => config::render_config(cfg)?,
            };
            output::print_output(rendered.trim_end(), display.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config(&Config::default(), path)?;
            output::print_status(
                &format!("Wrote default configuration to {}", path.display()),
                display.quiet,
                display.color,
            );
            Ok(())
        }
    }
}

fn json_err(err: serde_json::Error) -> CliError {
    CliError::Validation {
        field: "output".into(),
        reason: err.to_string(),
    }
}
