// ── Authentication scheme ──

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use camsweep_rtsp::AuthMethods;

/// Authentication scheme a device (and each of its routes) requires.
///
/// Serialized as its stable integer code: `NONE = 0`, `BASIC = 1`,
/// `DIGEST = 2`, `UNKNOWN = -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthType {
    None,
    Basic,
    Digest,
    /// Detection has not run yet, or its probe failed.
    #[default]
    Unknown,
}

impl AuthType {
    pub const fn code(self) -> i8 {
        match self {
            Self::None => 0,
            Self::Basic => 1,
            Self::Digest => 2,
            Self::Unknown => -1,
        }
    }

    pub const fn from_code(code: i8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Basic,
            2 => Self::Digest,
            _ => Self::Unknown,
        }
    }

    /// Collapse an advertised-scheme bitmask into one scheme.
    ///
    /// First match in ascending order wins: an empty mask means no
    /// authentication, Basic beats Digest when both are offered.
    pub fn from_methods(methods: AuthMethods) -> Self {
        if methods.is_empty() {
            Self::None
        } else if methods.contains(AuthMethods::BASIC) {
            Self::Basic
        } else {
            Self::Digest
        }
    }
}

impl Serialize for AuthType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for AuthType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i8::deserialize(deserializer).map(Self::from_code)
    }
}
