//! Clap derive structures for the `camsweep` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// camsweep -- RTSP camera discovery and access auditing
#[derive(Debug, Parser)]
#[command(
    name = "camsweep",
    version,
    about = "Discover RTSP cameras and audit their routes and credentials",
    long_about = "Finds RTSP servers on the given targets, guesses their stream routes,\n\
        detects the authentication they use, tries dictionary credentials and\n\
        checks which streams can actually be set up.\n\n\
        Only run it against equipment you are authorized to test.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', env = "CAMSWEEP_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Debug logging (same as -vv)
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Config file to use instead of the platform default
    #[arg(long, env = "CAMSWEEP_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalOpts {
    /// Effective verbosity: `--debug` counts as `-vv`.
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one stream URL per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover RTSP servers on targets, then attack them
    #[command(alias = "s")]
    Scan(ScanArgs),

    /// Attack known RTSP endpoints directly (host or host:port)
    #[command(alias = "a")]
    Attack(AttackArgs),

    /// Inspect and initialize the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Attack options (shared) ──────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AttackOpts {
    /// Route dictionary, one path per line
    #[arg(long, short = 'r', value_name = "FILE")]
    pub custom_routes: Option<PathBuf>,

    /// Credential dictionary, JSON {"usernames": [...], "passwords": [...]}
    #[arg(long, short = 'c', value_name = "FILE")]
    pub custom_credentials: Option<PathBuf>,

    /// Username list file, one per line
    #[arg(long, value_name = "FILE")]
    pub usernames: Option<PathBuf>,

    /// Password list file, one per line
    #[arg(long, value_name = "FILE")]
    pub passwords: Option<PathBuf>,

    /// Try only this username (password defaults to empty)
    #[arg(long, short = 'u', env = "CAMSWEEP_USERNAME")]
    pub username: Option<String>,

    /// Try only this password (username defaults to admin)
    #[arg(long, short = 'P', env = "CAMSWEEP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Per-request timeout (e.g. 2s, 1500ms)
    #[arg(long, short = 'T', value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Pause between probes of one device (e.g. 500ms)
    #[arg(long, short = 'I', value_parser = humantime::parse_duration)]
    pub attack_interval: Option<Duration>,

    /// Grab one frame of every accessed stream into this directory (needs ffmpeg)
    #[arg(long, value_name = "DIR")]
    pub screenshots: Option<PathBuf>,
}

// ── Scan ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Targets: IPs, CIDR ranges, last-octet ranges, hostnames, or one file.
    /// Defaults to the networks of the local interfaces.
    #[arg(long, short = 't', num_args = 1.., value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Ports to scan (e.g. 554,8554-8560)
    #[arg(long, short = 'p', num_args = 1..)]
    pub ports: Option<Vec<String>>,

    /// Scan speed 0 (slowest, quietest) to 5 (fastest)
    #[arg(long, short = 's', value_parser = clap::value_parser!(u8).range(0..=5))]
    pub scan_speed: Option<u8>,

    #[command(flatten)]
    pub attack: AttackOpts,
}

// ── Attack ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AttackArgs {
    /// Endpoints as host or host:port (IPv6 as [addr]:port)
    #[arg(required = true, num_args = 1..)]
    pub endpoints: Vec<String>,

    /// Port used for endpoints given without one
    #[arg(long, default_value_t = 554)]
    pub default_port: u16,

    #[command(flatten)]
    pub attack: AttackOpts,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (defaults, file and environment)
    Show,

    /// Write a config file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
