//! Callback payloads emitted by the engine
//!
//! Both events are delivered synchronously to a single registered
//! subscriber and never stored; downstream caching, persistence, and
//! message-bus publishing belong to the subscriber.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, InstrumentId, OrderId};
use types::order::Side;

/// Fresh quote for one instrument, pushed once per instrument per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub instrument_id: InstrumentId,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume: u64,
}

/// A pending order resolved by the ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFillEvent {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub quantity: u64,
    pub price: Decimal,
    /// True when the fill covers less than the order's full quantity
    pub partial: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_event_serialization() {
        let event = OrderFillEvent {
            order_id: OrderId::new(),
            account_id: AccountId::new(),
            instrument_id: InstrumentId::new("AAPL"),
            side: Side::BUY,
            quantity: 10,
            price: Decimal::new(10125, 2),
            partial: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: OrderFillEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_quote_update_serialization() {
        let update = QuoteUpdate {
            instrument_id: InstrumentId::new("EURUSD"),
            bid: Decimal::new(10848, 4),
            ask: Decimal::new(10852, 4),
            last: Decimal::new(10850, 4),
            volume: 5_000_000,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("EURUSD"));
        let back: QuoteUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, back);
    }
}
