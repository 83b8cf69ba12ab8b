//! Error types for order validation
//!
//! Structural problems with a request surface here; everything the broker
//! *decides* (rejection, queuing, fills) is an `OrderStatus`, not an error.

use thiserror::Error;

/// Structural validation failures for an order request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("quantity must be a positive number of lots")]
    ZeroQuantity,

    #[error("limit order requires a positive limit price")]
    InvalidLimitPrice,
}
