//! Order fill decision engine and pending-order book
//!
//! `process_order` decides the fate of one order synchronously: the
//! scenario's rejection gate runs first, then request validation, then the
//! quote lookup, then the fill-mode dispatch. Orders that cannot resolve
//! synchronously land in the pending book, which `process_pending_orders`
//! re-evaluates against fresh quotes on every tick.
//!
//! Every outcome is an `OrderResult`; nothing here returns an error type.

use crate::events::OrderFillEvent;
use crate::metrics::SimMetrics;
use crate::scenario::{FillBehavior, MarketScenario};
use crate::simulator::{PriceSimulator, PRICE_FLOOR};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use types::errors::OrderError;
use types::ids::OrderId;
use types::order::{OrderRequest, OrderResult, OrderType, Side};
use types::quote::Quote;

/// Message used when a scenario rejects without giving a reason.
const DEFAULT_REJECT_MESSAGE: &str = "Order rejected by broker";

/// Fraction of available liquidity a market order may consume before
/// slippage applies (0.1).
const SLIPPAGE_FREE_FRACTION: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Subscriber for fills resolved out of the pending book.
pub type FillCallback = Arc<dyn Fn(&OrderFillEvent) + Send + Sync>;

/// An order whose resolution was deferred to a future tick.
///
/// Never mutated in place: resolution removes it and emits a fill event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub request: OrderRequest,
    pub created_at: DateTime<Utc>,
    /// Earliest fill time; only consulted for delayed market orders
    pub fill_after: DateTime<Utc>,
    /// True for MARKET orders queued under `Delayed` mode
    pub is_delayed_market: bool,
}

/// Decides order outcomes against the simulator's quotes and owns the
/// pending-order book.
pub struct OrderProcessor {
    simulator: Arc<PriceSimulator>,
    pending: Mutex<HashMap<OrderId, PendingOrder>>,
    fill_callback: Mutex<Option<FillCallback>>,
    rng: Mutex<ChaCha8Rng>,
    metrics: Mutex<SimMetrics>,
}

/// Execution price for a taker: buyers pay the ask, sellers get the bid.
fn execution_price(quote: &Quote, side: Side) -> Decimal {
    match side {
        Side::BUY => quote.ask,
        Side::SELL => quote.bid,
    }
}

impl OrderProcessor {
    /// Create a processor with an entropy-seeded rejection RNG.
    pub fn new(simulator: Arc<PriceSimulator>) -> Self {
        Self {
            simulator,
            pending: Mutex::new(HashMap::new()),
            fill_callback: Mutex::new(None),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
            metrics: Mutex::new(SimMetrics::new()),
        }
    }

    /// Create a processor with a deterministic seed for reproducible runs.
    pub fn with_seed(simulator: Arc<PriceSimulator>, seed: u64) -> Self {
        Self {
            simulator,
            pending: Mutex::new(HashMap::new()),
            fill_callback: Mutex::new(None),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            metrics: Mutex::new(SimMetrics::new()),
        }
    }

    /// Register the subscriber notified when pending orders resolve,
    /// replacing any previous one.
    pub fn set_fill_callback(&self, callback: impl Fn(&OrderFillEvent) + Send + Sync + 'static) {
        *self.fill_callback.lock() = Some(Arc::new(callback));
    }

    /// Decide the fate of one order under the given scenario.
    pub fn process_order(
        &self,
        request: &OrderRequest,
        scenario: &MarketScenario,
    ) -> OrderResult {
        let result = self.decide(request, scenario);
        self.metrics.lock().record_decision(result.status);
        debug!(
            order = %request.order_id,
            instrument = %request.instrument_id,
            status = ?result.status,
            message = %result.message,
            "order processed"
        );
        result
    }

    fn decide(&self, request: &OrderRequest, scenario: &MarketScenario) -> OrderResult {
        // Rejection gate: AlwaysReject forces it, otherwise one uniform draw
        // against the configured probability.
        let forced = matches!(scenario.fill_behavior, FillBehavior::AlwaysReject);
        if forced
            || scenario.reject_probability >= 1.0
            || self.rng.lock().gen::<f64>() < scenario.reject_probability
        {
            let message = scenario
                .reject_reason
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECT_MESSAGE.to_string());
            return OrderResult::rejected(request.order_id, message);
        }

        if let Err(err) = request.validate() {
            return OrderResult::rejected(request.order_id, err.to_string());
        }

        let quote = match self.simulator.get_quote(&request.instrument_id) {
            Some(q) => q,
            None => return OrderResult::rejected(request.order_id, "Instrument not found"),
        };

        match scenario.fill_behavior {
            FillBehavior::Immediate => self.fill_immediate(request, &quote),
            FillBehavior::Realistic => match request.order_type {
                OrderType::MARKET => self.fill_market_realistic(request, scenario, &quote),
                OrderType::LIMIT => self.fill_or_queue_limit(request, &quote),
            },
            FillBehavior::Partial => self.fill_partial(request, scenario, &quote),
            FillBehavior::Delayed => match request.order_type {
                // Crossing limit orders fill now; resting ones queue on
                // price, ignoring the delay.
                OrderType::LIMIT => self.fill_or_queue_limit(request, &quote),
                OrderType::MARKET => self.queue_delayed_market(request, scenario),
            },
            // Handled by the rejection gate above.
            FillBehavior::AlwaysReject => unreachable!("AlwaysReject is resolved by the gate"),
        }
    }

    fn fill_immediate(&self, request: &OrderRequest, quote: &Quote) -> OrderResult {
        let price = execution_price(quote, request.side);
        OrderResult::filled(
            request.order_id,
            price,
            request.quantity,
            format!("Filled {} lots at {}", request.quantity, price),
        )
    }

    fn fill_market_realistic(
        &self,
        request: &OrderRequest,
        scenario: &MarketScenario,
        quote: &Quote,
    ) -> OrderResult {
        let base = execution_price(quote, request.side);
        let quantity = Decimal::from(request.quantity);
        let liquidity = Decimal::from(scenario.available_liquidity.max(1));

        if quantity > liquidity * SLIPPAGE_FREE_FRACTION {
            let slippage = scenario.base_price * scenario.slippage_percent * (quantity / liquidity);
            let price = match request.side {
                Side::BUY => base + slippage,
                Side::SELL => (base - slippage).max(PRICE_FLOOR),
            };
            return OrderResult::filled(
                request.order_id,
                price,
                request.quantity,
                format!(
                    "Filled {} lots at {} including {} slippage",
                    request.quantity, price, slippage
                ),
            );
        }

        OrderResult::filled(
            request.order_id,
            base,
            request.quantity,
            format!("Filled {} lots at {}", request.quantity, base),
        )
    }

    fn fill_partial(
        &self,
        request: &OrderRequest,
        scenario: &MarketScenario,
        quote: &Quote,
    ) -> OrderResult {
        let ratio = scenario
            .partial_fill_ratio
            .clamp(Decimal::ZERO, Decimal::ONE);
        let executed = (Decimal::from(request.quantity) * ratio)
            .floor()
            .to_u64()
            .unwrap_or(0)
            .max(1)
            .min(request.quantity);
        let price = execution_price(quote, request.side);

        if executed < request.quantity {
            OrderResult::partially_filled(
                request.order_id,
                price,
                executed,
                format!(
                    "Partially filled {} of {} lots at {}",
                    executed, request.quantity, price
                ),
            )
        } else {
            OrderResult::filled(
                request.order_id,
                price,
                executed,
                format!("Filled {} lots at {}", executed, price),
            )
        }
    }

    fn fill_or_queue_limit(&self, request: &OrderRequest, quote: &Quote) -> OrderResult {
        let limit = match request.limit_price {
            Some(p) => p,
            None => {
                return OrderResult::rejected(
                    request.order_id,
                    OrderError::InvalidLimitPrice.to_string(),
                )
            }
        };

        let crossing_price = match request.side {
            Side::BUY if quote.ask <= limit => Some(quote.ask),
            Side::SELL if quote.bid >= limit => Some(quote.bid),
            _ => None,
        };

        if let Some(price) = crossing_price {
            return OrderResult::filled(
                request.order_id,
                price,
                request.quantity,
                format!(
                    "Limit crossed, filled {} lots at {}",
                    request.quantity, price
                ),
            );
        }

        let now = Utc::now();
        self.enqueue(PendingOrder {
            request: request.clone(),
            created_at: now,
            fill_after: now,
            is_delayed_market: false,
        });
        OrderResult::pending(
            request.order_id,
            format!("Limit order queued at {limit}"),
        )
    }

    fn queue_delayed_market(
        &self,
        request: &OrderRequest,
        scenario: &MarketScenario,
    ) -> OrderResult {
        let now = Utc::now();
        let delay =
            chrono::Duration::from_std(scenario.fill_delay).unwrap_or_else(|_| chrono::Duration::zero());
        self.enqueue(PendingOrder {
            request: request.clone(),
            created_at: now,
            fill_after: now + delay,
            is_delayed_market: true,
        });
        OrderResult::pending(request.order_id, "Market order queued for delayed fill")
    }

    fn enqueue(&self, order: PendingOrder) {
        debug!(
            order = %order.request.order_id,
            instrument = %order.request.instrument_id,
            delayed_market = order.is_delayed_market,
            "order queued"
        );
        self.pending.lock().insert(order.request.order_id, order);
    }

    /// Re-evaluate every pending order against fresh quotes.
    ///
    /// Delayed market orders fill once their deadline passes; limit orders
    /// fill once the book crosses. Each resolved order is reported through
    /// the fill callback before it is removed from the book. The scenario
    /// parameter mirrors `process_order` for callers driving both; resolution
    /// prices come straight from the quote.
    pub fn process_pending_orders(&self, _scenario: &MarketScenario) {
        let snapshot: Vec<PendingOrder> = self.pending.lock().values().cloned().collect();
        if snapshot.is_empty() {
            return;
        }

        let now = Utc::now();
        let mut fills: Vec<OrderFillEvent> = Vec::new();

        for order in snapshot {
            let quote = match self.simulator.get_quote(&order.request.instrument_id) {
                Some(q) => q,
                None => continue,
            };

            let fill_price = if order.is_delayed_market {
                if now >= order.fill_after {
                    Some(execution_price(&quote, order.request.side))
                } else {
                    None
                }
            } else {
                match (order.request.side, order.request.limit_price) {
                    (Side::BUY, Some(limit)) if quote.ask <= limit => Some(quote.ask),
                    (Side::SELL, Some(limit)) if quote.bid >= limit => Some(quote.bid),
                    _ => None,
                }
            };

            if let Some(price) = fill_price {
                fills.push(OrderFillEvent {
                    order_id: order.request.order_id,
                    account_id: order.request.account_id,
                    instrument_id: order.request.instrument_id.clone(),
                    side: order.request.side,
                    quantity: order.request.quantity,
                    price,
                    partial: false,
                });
            }
        }

        if fills.is_empty() {
            return;
        }

        let callback = self.fill_callback.lock().clone();
        for event in fills {
            info!(
                order = %event.order_id,
                instrument = %event.instrument_id,
                price = %event.price,
                "pending order filled"
            );
            if let Some(cb) = &callback {
                cb(&event);
            }
            // Removal only after the callback has seen the fill.
            self.pending.lock().remove(&event.order_id);
            self.metrics.lock().pending_resolved += 1;
        }
    }

    /// Remove an order from the pending book.
    ///
    /// Returns false for unknown or already-resolved orders; synchronous
    /// results (Filled/Rejected) are not cancellable here.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let removed = self.pending.lock().remove(&order_id).is_some();
        if removed {
            self.metrics.lock().cancelled += 1;
            info!(order = %order_id, "pending order cancelled");
        }
        removed
    }

    /// Snapshot of the pending book.
    pub fn get_pending_orders(&self) -> Vec<PendingOrder> {
        self.pending.lock().values().cloned().collect()
    }

    /// Number of orders awaiting resolution.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drop every pending order without emitting fills.
    pub fn clear_pending(&self) {
        self.pending.lock().clear();
    }

    /// Snapshot of the decision counters.
    pub fn metrics(&self) -> SimMetrics {
        self.metrics.lock().clone()
    }
}
