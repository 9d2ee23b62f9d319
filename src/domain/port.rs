use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies the gateway integration that owns a transaction.
///
/// Stored raw on every transaction so that records created by a gateway that
/// has since been retired still deserialize; whether an identifier is
/// currently supported is decided by the [`PortRegistry`](crate::application::registry::PortRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub u8);

impl PortId {
    pub const MELLAT: Self = Self(1);
    pub const SADAD: Self = Self(2);
    pub const ZARINPAL: Self = Self(3);

    /// The built-in gateways, in declaration order.
    pub const BUILTIN: [Self; 3] = [Self::MELLAT, Self::SADAD, Self::ZARINPAL];

    /// Upper-case gateway name, if this is a built-in identifier.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::MELLAT => Some("MELLAT"),
            Self::SADAD => Some("SADAD"),
            Self::ZARINPAL => Some("ZARINPAL"),
            _ => None,
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "UNKNOWN({})", self.0),
        }
    }
}

/// Accepts either a gateway name (case-insensitive) or its numeric identifier.
///
/// Numeric identifiers are not checked against the supported set here.
impl FromStr for PortId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(raw) = trimmed.parse::<u8>() {
            return Ok(Self(raw));
        }
        Self::BUILTIN
            .into_iter()
            .find(|port| {
                port.name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| PaymentError::ValidationError(format!("Unknown port name: {}", s)))
    }
}
