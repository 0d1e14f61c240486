// Target and endpoint expressions.
//
//   10.0.0.5            single address (IPv4 or IPv6)
//   172.16.100.0/24     IPv4 CIDR block, network/broadcast excluded up to /30
//   172.16.100.10-20    last-octet range, inclusive
//   cam.local           hostname, resolved when connecting

use std::net::{IpAddr, Ipv4Addr};

use indexmap::IndexSet;

use crate::error::CoreError;
use crate::model::Device;

/// Smallest CIDR prefix accepted; larger blocks are almost always a typo.
const MIN_PREFIX: u8 = 16;

/// Expand target expressions into host strings, dropping duplicates.
pub fn expand_targets<S: AsRef<str>>(specs: &[S]) -> Result<Vec<String>, CoreError> {
    let mut hosts = IndexSet::new();
    for spec in specs {
        let spec = spec.as_ref().trim();
        if spec.is_empty() {
            continue;
        }
        hosts.extend(expand_target(spec)?);
    }
    Ok(hosts.into_iter().collect())
}

/// Expand one target expression.
pub fn expand_target(spec: &str) -> Result<Vec<String>, CoreError> {
    let spec = spec.trim();
    let invalid = |reason: &str| CoreError::InvalidTarget {
        target: spec.to_string(),
        reason: reason.to_string(),
    };

    if let Some((base, prefix)) = spec.split_once('/') {
        let base: Ipv4Addr = base.parse().map_err(|_| invalid("CIDR base must be IPv4"))?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid("bad prefix length"))?;
        if prefix > 32 {
            return Err(invalid("prefix length must be 0-32"));
        }
        if prefix < MIN_PREFIX {
            return Err(invalid("block larger than /16"));
        }
        return Ok(cidr_hosts(base, prefix));
    }

    let bare = spec.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(vec![ip.to_string()]);
    }

    if let Some((network, first, last)) = split_range(spec) {
        let network: Ipv4Addr = format!("{network}.0")
            .parse()
            .map_err(|_| invalid("range base must be three IPv4 octets"))?;
        let first: u8 = first.parse().map_err(|_| invalid("bad range start"))?;
        let last: u8 = last.parse().map_err(|_| invalid("bad range end"))?;
        if first > last {
            return Err(invalid("range start exceeds range end"));
        }
        let [a, b, c, _] = network.octets();
        return Ok((first..=last)
            .map(|d| Ipv4Addr::new(a, b, c, d).to_string())
            .collect());
    }

    if is_hostname(spec) {
        return Ok(vec![spec.to_string()]);
    }
    Err(invalid("not an address, CIDR block, range or hostname"))
}

/// `a.b.c.X-Y` split into `("a.b.c", "X", "Y")` when X and Y are numeric.
fn split_range(spec: &str) -> Option<(&str, &str, &str)> {
    let (network, range) = spec.rsplit_once('.')?;
    let (first, last) = range.split_once('-')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (numeric(first) && numeric(last)).then_some((network, first, last))
}

fn cidr_hosts(base: Ipv4Addr, prefix: u8) -> Vec<String> {
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    };
    let network = u32::from(base) & mask;
    let broadcast = network | !mask;
    let (start, end) = if prefix <= 30 {
        (network + 1, broadcast - 1)
    } else {
        (network, broadcast)
    };
    (start..=end)
        .map(|ip| Ipv4Addr::from(ip).to_string())
        .collect()
}

fn is_hostname(spec: &str) -> bool {
    !spec.is_empty()
        && spec.len() <= 253
        && !spec.starts_with(['-', '.'])
        && spec
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Parse `host[:port]` (or `[v6]:port`) into a fresh device.
pub fn parse_endpoint(spec: &str, default_port: u16) -> Result<Device, CoreError> {
    let spec = spec.trim();
    let invalid = |reason: &str| CoreError::InvalidTarget {
        target: spec.to_string(),
        reason: reason.to_string(),
    };
    let parse_port = |port: &str| -> Result<u16, CoreError> {
        match port.parse::<u16>() {
            Ok(0) | Err(_) => Err(invalid("bad port")),
            Ok(port) => Ok(port),
        }
    };

    let (host, port) = if let Some(rest) = spec.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| invalid("unclosed '['"))?;
        match after.strip_prefix(':') {
            Some(port) => (host, parse_port(port)?),
            None if after.is_empty() => (host, default_port),
            None => return Err(invalid("unexpected text after ']'")),
        }
    } else if spec.matches(':').count() > 1 {
        // Bare IPv6 literal, no port.
        (spec, default_port)
    } else if let Some((host, port)) = spec.split_once(':') {
        (host, parse_port(port)?)
    } else {
        (spec, default_port)
    };

    if host.is_empty() {
        return Err(invalid("empty host"));
    }
    if host.parse::<IpAddr>().is_err() && !is_hostname(host) {
        return Err(invalid("not an address or hostname"));
    }
    Ok(Device::new(host, port))
}
