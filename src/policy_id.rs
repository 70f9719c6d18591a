use serde::{Deserialize, Serialize};
use std::fmt;

/// Token identity.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord)]
pub enum PolicyId {
    /// ADA as denominated in Lovelace (1 ADA = 1_000_000 Lovelace)
    Lovelace,
    /// Native token with hex policy id and optional asset name
    NativeToken(String, Option<String>),
}

impl PolicyId {
    /// Constructor for Lovelace policy id
    pub fn ada() -> PolicyId {
        PolicyId::Lovelace
    }

    /// Constructor for native token policy id
    pub fn native_token(id: &str, asset: &Option<String>) -> PolicyId {
        PolicyId::NativeToken(id.to_string(), asset.to_owned())
    }

    /// Hex policy id; empty for Lovelace
    pub fn id(&self) -> String {
        match self {
            PolicyId::Lovelace => String::new(),
            PolicyId::NativeToken(id, _) => id.clone(),
        }
    }

    /// Getter for asset name
    pub fn asset_name(&self) -> Option<String> {
        match self {
            PolicyId::Lovelace => None,
            PolicyId::NativeToken(_, asset_name) => asset_name.to_owned(),
        }
    }

    /// Whether this is the chain's native currency
    pub fn is_lovelace(&self) -> bool {
        matches!(self, PolicyId::Lovelace)
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyId::Lovelace => write!(f, "lovelace"),
            PolicyId::NativeToken(id, None) => write!(f, "{id}"),
            PolicyId::NativeToken(id, Some(asset)) => write!(f, "{id}.{asset}"),
        }
    }
}
