// ── Domain model ──
//
// Devices are created by discovery with no routes, enriched by each
// attack phase, and handed to reporting. Nothing here performs I/O.

pub mod auth_type;
pub mod device;

pub use auth_type::AuthType;
pub use device::{Credentials, Device, DeviceKey, Route, normalize_path};
