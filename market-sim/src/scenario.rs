//! Market scenario configuration
//!
//! A `MarketScenario` describes how one instrument should behave: spread,
//! volatility, liquidity, and which fill algorithm the broker applies.
//! Scenarios are caller-owned values re-supplied on every call; the engine
//! never stores one per instrument.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default delay applied by the `delayed` preset.
const DEFAULT_FILL_DELAY: Duration = Duration::from_secs(5);

/// Errors raised when resolving scenario configuration from strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("unknown scenario preset: {0}")]
    UnknownPreset(String),

    #[error("unknown fill behavior: {0}")]
    UnknownFillBehavior(String),
}

/// Which of the five order-resolution algorithms applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillBehavior {
    /// Fill the whole quantity at the quoted price, no questions asked
    Immediate,
    /// Market orders fill with size-dependent slippage; limit orders rest
    /// until the book crosses
    Realistic,
    /// Fill a configured fraction of the requested quantity
    Partial,
    /// Market orders queue for a fixed delay; limit orders rest as usual
    Delayed,
    /// Refuse every order
    AlwaysReject,
}

impl fmt::Display for FillBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FillBehavior::Immediate => "immediate",
            FillBehavior::Realistic => "realistic",
            FillBehavior::Partial => "partial",
            FillBehavior::Delayed => "delayed",
            FillBehavior::AlwaysReject => "always-reject",
        };
        write!(f, "{label}")
    }
}

impl FromStr for FillBehavior {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "immediate" => Ok(FillBehavior::Immediate),
            "realistic" => Ok(FillBehavior::Realistic),
            "partial" => Ok(FillBehavior::Partial),
            "delayed" => Ok(FillBehavior::Delayed),
            "always-reject" => Ok(FillBehavior::AlwaysReject),
            _ => Err(ScenarioError::UnknownFillBehavior(s.to_string())),
        }
    }
}

/// Immutable per-instrument market behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScenario {
    /// Reference price the scenario was written for
    pub base_price: Decimal,
    /// Bid/ask spread as a fraction of price, in [0, 1)
    pub bid_ask_spread: Decimal,
    /// Per-tick standard deviation of returns, >= 0
    pub volatility: f64,
    /// Available liquidity in lots; large orders against it incur slippage
    pub available_liquidity: u64,
    /// Slippage scale as a fraction of base price
    pub slippage_percent: Decimal,
    /// Which fill algorithm the broker applies
    pub fill_behavior: FillBehavior,
    /// Queue time for market orders under `Delayed`
    pub fill_delay: Duration,
    /// Fraction of quantity executed under `Partial`, in (0, 1]
    pub partial_fill_ratio: Decimal,
    /// Probability any order is refused outright, in [0, 1]
    pub reject_probability: f64,
    /// Message attached to scenario-forced rejections
    pub reject_reason: Option<String>,
}

impl Default for MarketScenario {
    fn default() -> Self {
        Self {
            base_price: Decimal::from(100),
            bid_ask_spread: Decimal::new(1, 3),  // 0.1%
            volatility: 0.002,
            available_liquidity: 10_000,
            slippage_percent: Decimal::new(1, 3), // 0.1%
            fill_behavior: FillBehavior::Realistic,
            fill_delay: Duration::ZERO,
            partial_fill_ratio: Decimal::new(5, 1), // 0.5
            reject_probability: 0.0,
            reject_reason: None,
        }
    }
}

impl MarketScenario {
    /// Everything fills instantly at the quote; volatility is off so results
    /// are bit-identical across repeated calls.
    pub fn immediate(base_price: Decimal) -> Self {
        Self {
            base_price,
            volatility: 0.0,
            fill_behavior: FillBehavior::Immediate,
            ..Self::default()
        }
    }

    /// Default behavior: slippage on large market orders, resting limits.
    pub fn realistic(base_price: Decimal) -> Self {
        Self {
            base_price,
            ..Self::default()
        }
    }

    /// Every order executes for half the requested quantity.
    pub fn partial(base_price: Decimal) -> Self {
        Self {
            base_price,
            fill_behavior: FillBehavior::Partial,
            ..Self::default()
        }
    }

    /// Market orders queue for `delay` before filling.
    pub fn delayed(base_price: Decimal, delay: Duration) -> Self {
        Self {
            base_price,
            fill_behavior: FillBehavior::Delayed,
            fill_delay: delay,
            ..Self::default()
        }
    }

    /// Every order is refused with the given reason.
    pub fn always_reject(reason: impl Into<String>) -> Self {
        Self {
            fill_behavior: FillBehavior::AlwaysReject,
            reject_probability: 1.0,
            reject_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Thin book: almost any market order is large enough to slip.
    pub fn low_liquidity(base_price: Decimal) -> Self {
        Self {
            base_price,
            available_liquidity: 100,
            slippage_percent: Decimal::new(1, 2), // 1%
            ..Self::default()
        }
    }

    /// Stress configuration: violent price process and a wide spread.
    pub fn high_volatility(base_price: Decimal) -> Self {
        Self {
            base_price,
            volatility: 0.05,
            bid_ask_spread: Decimal::new(5, 3), // 0.5%
            ..Self::default()
        }
    }

    /// Resolve a named preset from a configuration string.
    pub fn from_preset(name: &str, base_price: Decimal) -> Result<Self, ScenarioError> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "immediate" => Ok(Self::immediate(base_price)),
            "realistic" => Ok(Self::realistic(base_price)),
            "partial" => Ok(Self::partial(base_price)),
            "delayed" => Ok(Self::delayed(base_price, DEFAULT_FILL_DELAY)),
            "always-reject" => Ok(Self::always_reject("Order rejected")),
            "low-liquidity" => Ok(Self::low_liquidity(base_price)),
            "high-volatility" => Ok(Self::high_volatility(base_price)),
            _ => Err(ScenarioError::UnknownPreset(name.to_string())),
        }
    }

    /// Set per-tick volatility; negative values clamp to zero.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility.max(0.0);
        self
    }

    /// Set the spread fraction; negative values clamp to zero.
    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.bid_ask_spread = spread.max(Decimal::ZERO);
        self
    }

    /// Set the slippage scale.
    pub fn with_slippage(mut self, slippage_percent: Decimal) -> Self {
        self.slippage_percent = slippage_percent.max(Decimal::ZERO);
        self
    }

    /// Set the partial-fill fraction, clamped into [0, 1].
    pub fn with_partial_ratio(mut self, ratio: Decimal) -> Self {
        self.partial_fill_ratio = ratio.clamp(Decimal::ZERO, Decimal::ONE);
        self
    }

    /// Set the market-order queue delay for `Delayed` mode.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.fill_delay = delay;
        self
    }

    /// Set the available liquidity in lots.
    pub fn with_liquidity(mut self, lots: u64) -> Self {
        self.available_liquidity = lots;
        self
    }

    /// Set the rejection probability, clamped into [0, 1].
    pub fn with_reject_probability(mut self, probability: f64) -> Self {
        self.reject_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Set the message attached to scenario-forced rejections.
    pub fn with_reject_reason(mut self, reason: impl Into<String>) -> Self {
        self.reject_reason = Some(reason.into());
        self
    }
}
