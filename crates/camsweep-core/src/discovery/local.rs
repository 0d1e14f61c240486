// Local network detection, used when a scan is started without targets.

use std::net::Ipv4Addr;

use if_addrs::IfAddr;
use tracing::{debug, warn};

/// Blocks wider than this are narrowed to the /24 around the address.
const WIDEST_LOCAL_PREFIX: u32 = 16;

/// CIDR blocks of every up, non-loopback IPv4 interface, deduplicated.
pub fn local_networks() -> Vec<String> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            warn!(error = %err, "cannot list network interfaces");
            return Vec::new();
        }
    };

    let mut networks = Vec::new();
    for iface in interfaces {
        if iface.is_loopback() {
            continue;
        }
        let IfAddr::V4(v4) = iface.addr else {
            continue;
        };
        match network_cidr(v4.ip, v4.netmask) {
            Some(cidr) if !networks.contains(&cidr) => {
                debug!(interface = %iface.name, network = %cidr, "local network");
                networks.push(cidr);
            }
            Some(_) => {}
            None => debug!(interface = %iface.name, ip = %v4.ip, "interface skipped"),
        }
    }
    networks
}

/// The network an interface address sits in, as `a.b.c.d/prefix`.
///
/// `None` for loopback, link-local and unspecified addresses and for
/// non-contiguous masks.
pub(crate) fn network_cidr(ip: Ipv4Addr, netmask: Ipv4Addr) -> Option<String> {
    if ip.is_loopback() || ip.is_link_local() || ip.is_unspecified() {
        return None;
    }
    let mask = u32::from(netmask);
    let prefix = mask.leading_ones();
    if mask.count_ones() != prefix || prefix == 0 {
        return None;
    }
    if prefix == 32 {
        return Some(format!("{ip}/32"));
    }

    let prefix = if prefix < WIDEST_LOCAL_PREFIX { 24 } else { prefix };
    let network = u32::from(ip) & (u32::MAX << (32 - prefix));
    Some(format!("{}/{prefix}", Ipv4Addr::from(network)))
}
