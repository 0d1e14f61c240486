// Port expressions: `554`, `8554-8560`, comma-separated, any mix.

use indexmap::IndexSet;

use crate::error::CoreError;

/// Expand port expressions, dropping duplicates and keeping first-seen order.
pub fn parse_ports<S: AsRef<str>>(specs: &[S]) -> Result<Vec<u16>, CoreError> {
    let mut ports = IndexSet::new();
    for spec in specs {
        for item in spec.as_ref().split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let invalid = |reason: &str| CoreError::InvalidPorts {
                spec: item.to_string(),
                reason: reason.to_string(),
            };
            match item.split_once('-') {
                Some((first, last)) => {
                    let first = port_number(first).ok_or_else(|| invalid("bad range start"))?;
                    let last = port_number(last).ok_or_else(|| invalid("bad range end"))?;
                    if first > last {
                        return Err(invalid("range start exceeds range end"));
                    }
                    ports.extend(first..=last);
                }
                None => {
                    ports.insert(port_number(item).ok_or_else(|| invalid("not a port (1-65535)"))?);
                }
            }
        }
    }

    if ports.is_empty() {
        return Err(CoreError::InvalidPorts {
            spec: String::new(),
            reason: "no ports given".into(),
        });
    }
    Ok(ports.into_iter().collect())
}

fn port_number(s: &str) -> Option<u16> {
    s.trim().parse::<u16>().ok().filter(|p| *p != 0)
}
