//! Order request and result types
//!
//! An `OrderRequest` is what the surrounding platform hands the engine;
//! an `OrderResult` is the broker's decision for it. All domain outcomes
//! travel through `OrderResult.status`, never through error types.

use crate::errors::OrderError;
use crate::ids::{AccountId, InstrumentId, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (hits the ask)
    BUY,
    /// Sell order (hits the bid)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute at the current quote
    MARKET,
    /// Execute only at the limit price or better
    LIMIT,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Queued in the pending book awaiting a future tick
    Pending,
    /// Completely executed (terminal)
    Filled,
    /// Executed for less than the requested quantity
    PartiallyFilled,
    /// Removed from the pending book before execution (terminal)
    Cancelled,
    /// Refused by the broker (terminal)
    Rejected,
}

impl OrderStatus {
    /// True for statuses that carry an execution
    pub fn is_success(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::PartiallyFilled)
    }

    /// True for statuses with no further transitions
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

/// A single order submitted to the engine
///
/// Quantity is a whole number of lots. `limit_price` is meaningful only
/// for LIMIT orders and ignored for MARKET orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: u64,
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    /// Create a market order request
    pub fn market(
        account_id: AccountId,
        instrument_id: InstrumentId,
        side: Side,
        quantity: u64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            account_id,
            instrument_id,
            side,
            order_type: OrderType::MARKET,
            quantity,
            limit_price: None,
        }
    }

    /// Create a limit order request
    pub fn limit(
        account_id: AccountId,
        instrument_id: InstrumentId,
        side: Side,
        quantity: u64,
        limit_price: Decimal,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            account_id,
            instrument_id,
            side,
            order_type: OrderType::LIMIT,
            quantity,
            limit_price: Some(limit_price),
        }
    }

    /// Structural validation of the request
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }
        if self.order_type == OrderType::LIMIT {
            match self.limit_price {
                Some(p) if p > Decimal::ZERO => {}
                _ => return Err(OrderError::InvalidLimitPrice),
            }
        }
        Ok(())
    }
}

/// The broker's decision for a single order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Execution price; zero when nothing executed
    pub executed_price: Decimal,
    /// Executed lots; zero when nothing executed
    pub executed_quantity: u64,
    /// Human-readable description of which decision branch fired
    pub message: String,
}

impl OrderResult {
    /// A complete fill at `price`
    pub fn filled(
        order_id: OrderId,
        price: Decimal,
        quantity: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            status: OrderStatus::Filled,
            executed_price: price,
            executed_quantity: quantity,
            message: message.into(),
        }
    }

    /// A partial fill at `price` for `quantity` lots
    pub fn partially_filled(
        order_id: OrderId,
        price: Decimal,
        quantity: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            status: OrderStatus::PartiallyFilled,
            executed_price: price,
            executed_quantity: quantity,
            message: message.into(),
        }
    }

    /// Queued in the pending book
    pub fn pending(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            order_id,
            status: OrderStatus::Pending,
            executed_price: Decimal::ZERO,
            executed_quantity: 0,
            message: message.into(),
        }
    }

    /// Cancelled before execution
    pub fn cancelled(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            order_id,
            status: OrderStatus::Cancelled,
            executed_price: Decimal::ZERO,
            executed_quantity: 0,
            message: message.into(),
        }
    }

    /// Refused by the broker
    pub fn rejected(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            order_id,
            status: OrderStatus::Rejected,
            executed_price: Decimal::ZERO,
            executed_quantity: 0,
            message: message.into(),
        }
    }

    /// True when the order executed (fully or partially)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True when no further transitions are possible
    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }
}
