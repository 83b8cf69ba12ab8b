//! Unique identifier types for engine entities
//!
//! Order and account IDs use UUID v7 for time-sortable ordering, enabling
//! efficient chronological queries when orders are persisted downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an order
///
/// Uses UUID v7 for time-based sorting. Orders can be efficiently
/// queried in chronological order using the embedded timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new OrderId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trading account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument identifier (tradable symbol)
///
/// A non-empty ticker (e.g., "AAPL", "EURUSD"). The engine keys every
/// price process and pending order on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Create a new InstrumentId from a string
    ///
    /// # Panics
    /// Panics if the symbol is empty or contains whitespace
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(
            !s.is_empty() && !s.chars().any(char::is_whitespace),
            "InstrumentId must be a non-empty symbol without whitespace"
        );
        Self(s)
    }

    /// Try to create an InstrumentId, returning None if invalid
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_creation() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_account_id_creation() {
        let id1 = AccountId::new();
        let id2 = AccountId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_instrument_id_creation() {
        let instrument = InstrumentId::new("AAPL");
        assert_eq!(instrument.as_str(), "AAPL");
    }

    #[test]
    fn test_instrument_id_try_new() {
        assert!(InstrumentId::try_new("EURUSD").is_some());
        assert!(InstrumentId::try_new("").is_none());
        assert!(InstrumentId::try_new("BAD SYMBOL").is_none());
    }

    #[test]
    #[should_panic(expected = "InstrumentId must be a non-empty symbol")]
    fn test_instrument_id_invalid() {
        InstrumentId::new("");
    }

    #[test]
    fn test_instrument_id_serialization() {
        let instrument = InstrumentId::new("TSLA");
        let json = serde_json::to_string(&instrument).unwrap();
        assert_eq!(json, "\"TSLA\"");

        let deserialized: InstrumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(instrument, deserialized);
    }
}
