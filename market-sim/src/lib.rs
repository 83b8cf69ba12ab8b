//! Market & Broker Simulation Engine
//!
//! Replaces a real exchange connection for the trading-education platform:
//! generates evolving bid/ask quotes per instrument and decides, for each
//! incoming order, whether it fills, partially fills, queues, or is
//! rejected, under caller-controlled stress scenarios.
//!
//! # Modules
//! - `simulator` — Per-instrument stochastic price process and quotes
//! - `scenario` — Market behavior configuration and named presets
//! - `processor` — Order fill state machine and pending-order book
//! - `ticker` — Background thread driving ticks and pending resolution
//! - `events` — Quote-update and order-fill callback payloads
//! - `metrics` — Decision counters

pub mod events;
pub mod metrics;
pub mod processor;
pub mod scenario;
pub mod simulator;
pub mod ticker;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
