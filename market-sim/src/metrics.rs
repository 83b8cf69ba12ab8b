//! Decision counters for the order processor
//!
//! Tracks how many orders took each branch of the fill state machine.
//! Snapshots are cheap copies for export or assertion in tests.

use serde::{Deserialize, Serialize};
use types::order::OrderStatus;

/// Aggregated order-decision metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimMetrics {
    /// Orders handed to `process_order`
    pub orders_received: u64,
    /// Synchronous complete fills
    pub filled: u64,
    /// Synchronous partial fills
    pub partially_filled: u64,
    /// Rejections (scenario-forced, probabilistic, validation, unknown instrument)
    pub rejected: u64,
    /// Orders parked in the pending book
    pub queued: u64,
    /// Pending orders cancelled before resolution
    pub cancelled: u64,
    /// Pending orders resolved by the ticker
    pub pending_resolved: u64,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one `process_order` call.
    pub fn record_decision(&mut self, status: OrderStatus) {
        self.orders_received += 1;
        match status {
            OrderStatus::Filled => self.filled += 1,
            OrderStatus::PartiallyFilled => self.partially_filled += 1,
            OrderStatus::Rejected => self.rejected += 1,
            OrderStatus::Pending => self.queued += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Export the counters as JSON for external consumption.
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Build a one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Orders: {} | Filled: {} | Partial: {} | Rejected: {} | Queued: {} | Resolved: {} | Cancelled: {}",
            self.orders_received,
            self.filled,
            self.partially_filled,
            self.rejected,
            self.queued,
            self.pending_resolved,
            self.cancelled,
        )
    }
}
