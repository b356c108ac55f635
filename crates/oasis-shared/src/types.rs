use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

// Server-assigned identity of a cached record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProtocolError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Owning customer, always passed explicitly by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProtocolError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every class of record the app caches locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Appointment,
    Purchase,
    Notification,
    ShippingAddress,
    SkinAnalysis,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Appointment,
        RecordKind::Purchase,
        RecordKind::Notification,
        RecordKind::ShippingAddress,
        RecordKind::SkinAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::Purchase => "purchase",
            Self::Notification => "notification",
            Self::ShippingAddress => "shipping_address",
            Self::SkinAnalysis => "skin_analysis",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
        assert!("spa_voucher".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        let json = serde_json::to_string(&RecordKind::ShippingAddress).unwrap();
        assert_eq!(json, "\"shipping_address\"");
    }

    #[test]
    fn test_deserialize_rejects_blank_ids() {
        assert!(serde_json::from_str::<RecordId>("\"  \"").is_err());
        assert!(serde_json::from_str::<CustomerId>("\"\"").is_err());

        let id: RecordId = serde_json::from_str("\"A1\"").unwrap();
        assert_eq!(id.as_str(), "A1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"A1\"");
    }

    #[test]
    fn test_blank_ids_rejected() {
        assert!(RecordId::new("  ").is_err());
        assert!(CustomerId::new("").is_err());
        assert_eq!(RecordId::new("A1").unwrap().as_str(), "A1");
    }
}
