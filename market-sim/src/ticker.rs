//! Background tick loop
//!
//! Owns the wall-clock cadence that drives the engine: each iteration
//! advances every watched instrument's price, pushes fresh quotes to the
//! registered subscriber, and resolves the pending-order book.
//!
//! The watched set, callback, and scenario are snapshotted under the
//! ticker's lock before the body runs, so the lock is never held across a
//! call into the simulator, the processor, or a callback.

use crate::events::QuoteUpdate;
use crate::processor::OrderProcessor;
use crate::scenario::MarketScenario;
use crate::simulator::PriceSimulator;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use types::ids::InstrumentId;

/// Subscriber for per-instrument quote updates.
pub type QuoteCallback = Arc<dyn Fn(&QuoteUpdate) + Send + Sync>;

struct TickerState {
    instruments: Vec<InstrumentId>,
    quote_callback: Option<QuoteCallback>,
    scenario: MarketScenario,
}

struct TickerShared {
    running: AtomicBool,
    state: Mutex<TickerState>,
}

/// Drives price evolution and pending-order resolution on a fixed interval.
///
/// Owns a live worker thread once started; share it by reference, it is
/// deliberately not `Clone`.
pub struct BackgroundTicker {
    simulator: Arc<PriceSimulator>,
    processor: Arc<OrderProcessor>,
    shared: Arc<TickerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// One loop body: tick every watched instrument, publish quotes, resolve
/// the pending book. Runs with no ticker lock held.
fn run_tick(simulator: &PriceSimulator, processor: &OrderProcessor, shared: &TickerShared) {
    let (instruments, callback, scenario) = {
        let state = shared.state.lock();
        (
            state.instruments.clone(),
            state.quote_callback.clone(),
            state.scenario.clone(),
        )
    };

    for id in &instruments {
        simulator.tick(id);
        if let Some(quote) = simulator.get_quote(id) {
            if let Some(cb) = &callback {
                cb(&QuoteUpdate {
                    instrument_id: id.clone(),
                    bid: quote.bid,
                    ask: quote.ask,
                    last: quote.last,
                    volume: quote.volume,
                });
            }
        }
    }

    processor.process_pending_orders(&scenario);
}

impl BackgroundTicker {
    /// Create a stopped ticker over the given simulator and processor.
    pub fn new(simulator: Arc<PriceSimulator>, processor: Arc<OrderProcessor>) -> Self {
        Self {
            simulator,
            processor,
            shared: Arc::new(TickerShared {
                running: AtomicBool::new(false),
                state: Mutex::new(TickerState {
                    instruments: Vec::new(),
                    quote_callback: None,
                    scenario: MarketScenario::realistic(Decimal::from(100)),
                }),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Add an instrument to the watched set; duplicates are ignored.
    pub fn add_instrument(&self, id: InstrumentId) {
        let mut state = self.shared.state.lock();
        if !state.instruments.contains(&id) {
            state.instruments.push(id);
        }
    }

    /// Stop watching an instrument. Returns false if it was not watched.
    pub fn remove_instrument(&self, id: &InstrumentId) -> bool {
        let mut state = self.shared.state.lock();
        match state.instruments.iter().position(|watched| watched == id) {
            Some(index) => {
                state.instruments.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of watched instruments.
    pub fn instrument_count(&self) -> usize {
        self.shared.state.lock().instruments.len()
    }

    /// Register the quote subscriber, replacing any previous one.
    pub fn set_quote_callback(&self, callback: impl Fn(&QuoteUpdate) + Send + Sync + 'static) {
        self.shared.state.lock().quote_callback = Some(Arc::new(callback));
    }

    /// Replace the scenario handed to `process_pending_orders` each tick.
    pub fn set_scenario(&self, scenario: MarketScenario) {
        self.shared.state.lock().scenario = scenario;
    }

    /// Spawn the worker loop. A second call while running is a no-op.
    ///
    /// The sleep is drift-compensated: each iteration sleeps the interval
    /// minus the time the tick body took, clamped at zero.
    pub fn start(&self, interval: Duration) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            warn!("ticker already running");
            return;
        }

        info!(interval_ms = interval.as_millis() as u64, "ticker started");

        let simulator = Arc::clone(&self.simulator);
        let processor = Arc::clone(&self.processor);
        let shared = Arc::clone(&self.shared);

        let handle = thread::spawn(move || {
            while shared.running.load(Ordering::SeqCst) {
                let started = Instant::now();
                run_tick(&simulator, &processor, &shared);
                if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                    thread::sleep(remaining);
                }
            }
        });

        *self.worker.lock() = Some(handle);
    }

    /// Signal the worker to exit and join it. Idempotent; once this
    /// returns, no further callbacks fire.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
            info!("ticker stopped");
        }
    }

    /// Whether the worker loop is live.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Run exactly one loop body synchronously on the calling thread.
    ///
    /// Lets tests drive the engine without timing flakiness.
    pub fn manual_tick(&self) {
        run_tick(&self.simulator, &self.processor, &self.shared);
    }
}

impl Drop for BackgroundTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::{OrderRequest, Side};

    fn aapl() -> InstrumentId {
        InstrumentId::new("AAPL")
    }

    fn fixture() -> (Arc<PriceSimulator>, Arc<OrderProcessor>, BackgroundTicker) {
        let sim = Arc::new(PriceSimulator::with_seed(42));
        sim.init_instrument(aapl(), Decimal::from(100), Decimal::new(1, 2), 0.01);
        let processor = Arc::new(OrderProcessor::with_seed(Arc::clone(&sim), 42));
        let ticker = BackgroundTicker::new(Arc::clone(&sim), Arc::clone(&processor));
        ticker.add_instrument(aapl());
        (sim, processor, ticker)
    }

    #[test]
    fn test_add_remove_instrument() {
        let (_sim, _processor, ticker) = fixture();
        assert_eq!(ticker.instrument_count(), 1);

        // Duplicates are ignored.
        ticker.add_instrument(aapl());
        assert_eq!(ticker.instrument_count(), 1);

        assert!(ticker.remove_instrument(&aapl()));
        assert!(!ticker.remove_instrument(&aapl()));
        assert_eq!(ticker.instrument_count(), 0);
    }

    #[test]
    fn test_manual_tick_publishes_quotes() {
        let (_sim, _processor, ticker) = fixture();

        let updates: Arc<Mutex<Vec<QuoteUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        ticker.set_quote_callback(move |update| sink.lock().push(update.clone()));

        ticker.manual_tick();
        ticker.manual_tick();

        let seen = updates.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].instrument_id, aapl());
        assert!(seen[0].bid <= seen[0].last && seen[0].last <= seen[0].ask);
    }

    #[test]
    fn test_manual_tick_resolves_pending_orders() {
        let (sim, processor, ticker) = fixture();
        sim.set_volatility(&aapl(), 0.0);

        let scenario = MarketScenario::realistic(Decimal::from(100));
        ticker.set_scenario(scenario.clone());

        let request =
            OrderRequest::limit(AccountId::new(), aapl(), Side::BUY, 5, Decimal::from(95));
        processor.process_order(&request, &scenario);
        assert_eq!(processor.pending_count(), 1);

        ticker.manual_tick();
        assert_eq!(processor.pending_count(), 1);

        sim.set_price(&aapl(), Decimal::from(90));
        ticker.manual_tick();
        assert_eq!(processor.pending_count(), 0);
    }

    #[test]
    fn test_callback_replacement() {
        let (_sim, _processor, ticker) = fixture();

        let first: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let second: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));

        let sink = Arc::clone(&first);
        ticker.set_quote_callback(move |_| *sink.lock() += 1);
        ticker.manual_tick();

        let sink = Arc::clone(&second);
        ticker.set_quote_callback(move |_| *sink.lock() += 1);
        ticker.manual_tick();

        assert_eq!(*first.lock(), 1);
        assert_eq!(*second.lock(), 1);
    }

    #[test]
    fn test_start_and_stop() {
        let (_sim, _processor, ticker) = fixture();

        let count: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        ticker.set_quote_callback(move |_| *sink.lock() += 1);

        ticker.start(Duration::from_millis(5));
        assert!(ticker.is_running());
        thread::sleep(Duration::from_millis(100));
        ticker.stop();
        assert!(!ticker.is_running());

        let ticks = *count.lock();
        assert!(ticks > 0, "worker should have ticked at least once");

        // No callbacks after stop returns.
        thread::sleep(Duration::from_millis(30));
        assert_eq!(*count.lock(), ticks);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_sim, _processor, ticker) = fixture();
        ticker.start(Duration::from_millis(5));
        ticker.stop();
        ticker.stop();
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_double_start_is_noop() {
        let (_sim, _processor, ticker) = fixture();
        ticker.start(Duration::from_millis(5));
        ticker.start(Duration::from_millis(5));
        ticker.stop();
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_restart_after_stop() {
        let (_sim, _processor, ticker) = fixture();
        ticker.start(Duration::from_millis(5));
        ticker.stop();
        ticker.start(Duration::from_millis(5));
        assert!(ticker.is_running());
        ticker.stop();
    }
}
