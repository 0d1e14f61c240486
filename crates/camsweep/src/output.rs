//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! stream URL per accessed route.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use camsweep_core::{Device, Route};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Credentials")]
    credentials: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Screenshot")]
    screenshot: String,
}

fn yes_no(flag: bool, color: bool) -> String {
    match (flag, color) {
        (true, true) => "yes".green().to_string(),
        (false, true) => "no".red().to_string(),
        (true, false) => "yes".into(),
        (false, false) => "no".into(),
    }
}

fn credentials_cell(device: &Device, route: &Route) -> String {
    match (&device.credentials, route.credentials_found) {
        (Some(creds), true) => format!("{}:{}", creds.username, creds.password),
        _ => "-".into(),
    }
}

fn rows(devices: &[Device], color: bool) -> Vec<RouteRow> {
    devices
        .iter()
        .flat_map(|device| {
            let endpoint = device.key().to_string();
            let label = device.label.clone().unwrap_or_default();
            if device.routes.is_empty() {
                return vec![RouteRow {
                    device: endpoint,
                    label,
                    route: "-".into(),
                    auth: device.auth_type.to_string(),
                    credentials: "-".into(),
                    available: yes_no(false, color),
                    screenshot: String::new(),
                }];
            }
            device
                .routes
                .iter()
                .map(|route| RouteRow {
                    device: endpoint.clone(),
                    label: label.clone(),
                    route: format!("/{}", route.path),
                    auth: route.auth_type.to_string(),
                    credentials: credentials_cell(device, route),
                    available: yes_no(route.available, color),
                    screenshot: route.image_url.clone().unwrap_or_default(),
                })
                .collect()
        })
        .collect()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the attack results in the chosen format.
pub fn render_devices(format: OutputFormat, devices: &[Device], color: bool) -> String {
    match format {
        OutputFormat::Table if devices.is_empty() => String::new(),
        OutputFormat::Table => Table::new(rows(devices, color))
            .with(Style::rounded())
            .to_string(),
        OutputFormat::Json => render_json(devices, false),
        OutputFormat::JsonCompact => render_json(devices, true),
        OutputFormat::Yaml => render_yaml(devices),
        OutputFormat::Plain => plain_urls(devices).join("\n"),
    }
}

/// Stream URLs of every available route, credentials embedded.
fn plain_urls(devices: &[Device]) -> Vec<String> {
    devices
        .iter()
        .flat_map(|device| {
            device
                .routes
                .iter()
                .filter(|route| route.available)
                .filter_map(move |route| device.stream_url(&route.path).ok())
                .map(String::from)
        })
        .collect()
}

/// One-line outcome of the whole run.
pub fn summary(devices: &[Device]) -> String {
    let accessed = devices.iter().filter(|d| d.is_accessible()).count();
    match (devices.len(), accessed) {
        (0, _) => "No streams were found. Make sure the targets are reachable and \
                   the right ports are scanned."
            .into(),
        (_, 0) => "Streams were found but none were accessed. They are most likely \
                   configured with secure credentials; try custom dictionaries."
            .into(),
        (_, 1) => "Successful attack: one device was accessed".into(),
        (_, n) => format!("Successful attack: {n} devices were accessed"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a human-facing status line to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool, color: bool) {
    if quiet {
        return;
    }
    let mut stderr = io::stderr().lock();
    if color {
        let _ = writeln!(stderr, "{}", message.bold());
    } else {
        let _ = writeln!(stderr, "{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}
