//! Market quote snapshot
//!
//! A `Quote` is derived from live instrument state on every read; the
//! simulator never caches one.

use crate::ids::InstrumentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time bid/ask snapshot for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub instrument_id: InstrumentId,
    /// Best price a buyer is quoted to sell at
    pub bid: Decimal,
    /// Best price a seller is quoted to buy at
    pub ask: Decimal,
    /// Last simulated trade price (the raw process value)
    pub last: Decimal,
    /// Simulated daily volume in lots
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Midpoint between bid and ask
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }

    /// Absolute bid/ask spread
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}
