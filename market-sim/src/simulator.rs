//! Stochastic price simulator
//!
//! Owns one price process per registered instrument and derives bid/ask
//! quotes on demand. The process is a simple multiplicative random walk:
//! each tick draws a Gaussian return with the instrument's per-tick
//! volatility and applies it to the current price, floored at 0.01.
//!
//! All methods take the internal lock for the duration of the call, so the
//! simulator is safe to share between the ticker thread and order-processing
//! callers.

use crate::scenario::MarketScenario;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};
use types::ids::InstrumentId;
use types::quote::Quote;

/// Hard floor applied after every price mutation (0.01).
pub const PRICE_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Daily volume assigned to newly registered instruments.
const DEFAULT_DAILY_VOLUME: u64 = 1_000_000;

/// Decimal places kept after a stochastic tick.
const PRICE_DP: u32 = 4;

/// Per-instrument state of the price process.
#[derive(Debug, Clone)]
struct InstrumentState {
    current_price: Decimal,
    spread_fraction: Decimal,
    volatility_per_tick: f64,
    daily_volume: u64,
    last_update: DateTime<Utc>,
}

struct SimulatorInner {
    instruments: HashMap<InstrumentId, InstrumentState>,
    rng: ChaCha8Rng,
}

/// Thread-safe per-instrument price process.
pub struct PriceSimulator {
    inner: Mutex<SimulatorInner>,
}

impl PriceSimulator {
    /// Create a simulator with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SimulatorInner {
                instruments: HashMap::new(),
                rng: ChaCha8Rng::from_entropy(),
            }),
        }
    }

    /// Create a simulator with a deterministic seed for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Mutex::new(SimulatorInner {
                instruments: HashMap::new(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
        }
    }

    /// Register an instrument, overwriting any existing registration.
    ///
    /// Negative spread and volatility are clamped to zero; the base price
    /// is floored like every other price mutation.
    pub fn init_instrument(
        &self,
        id: InstrumentId,
        base_price: Decimal,
        spread: Decimal,
        volatility: f64,
    ) {
        let state = InstrumentState {
            current_price: base_price.max(PRICE_FLOOR),
            spread_fraction: spread.max(Decimal::ZERO),
            volatility_per_tick: volatility.max(0.0),
            daily_volume: DEFAULT_DAILY_VOLUME,
            last_update: Utc::now(),
        };
        info!(
            instrument = %id,
            price = %state.current_price,
            spread = %state.spread_fraction,
            volatility = state.volatility_per_tick,
            "instrument registered"
        );
        self.inner.lock().instruments.insert(id, state);
    }

    /// Register an instrument using a scenario's market parameters.
    pub fn init_from_scenario(&self, id: InstrumentId, scenario: &MarketScenario) {
        self.init_instrument(
            id,
            scenario.base_price,
            scenario.bid_ask_spread,
            scenario.volatility,
        );
    }

    /// Advance the instrument's price one step and return the new price.
    ///
    /// Returns `Decimal::ZERO` as a sentinel if the instrument is unknown.
    pub fn tick(&self, id: &InstrumentId) -> Decimal {
        let inner = &mut *self.inner.lock();
        let SimulatorInner { instruments, rng } = inner;

        let state = match instruments.get_mut(id) {
            Some(s) => s,
            None => return Decimal::ZERO,
        };

        let z = if state.volatility_per_tick > 0.0 {
            match Normal::new(0.0, state.volatility_per_tick) {
                Ok(normal) => normal.sample(rng),
                Err(_) => 0.0,
            }
        } else {
            0.0
        };

        let factor = Decimal::from_f64(1.0 + z).unwrap_or(Decimal::ONE);
        state.current_price = (state.current_price * factor)
            .round_dp(PRICE_DP)
            .max(PRICE_FLOOR);
        state.last_update = Utc::now();

        debug!(instrument = %id, price = %state.current_price, "tick");
        state.current_price
    }

    /// Derive the current quote, or `None` if the instrument is unknown.
    ///
    /// The quote is computed from live state on every call; nothing is
    /// cached.
    pub fn get_quote(&self, id: &InstrumentId) -> Option<Quote> {
        let inner = self.inner.lock();
        let state = inner.instruments.get(id)?;

        let half_spread = state.spread_fraction / Decimal::from(2);
        Some(Quote {
            instrument_id: id.clone(),
            bid: state.current_price * (Decimal::ONE - half_spread),
            ask: state.current_price * (Decimal::ONE + half_spread),
            last: state.current_price,
            volume: state.daily_volume,
            timestamp: state.last_update,
        })
    }

    /// Deterministic override: set the price outright.
    pub fn set_price(&self, id: &InstrumentId, price: Decimal) -> bool {
        self.mutate(id, |state| {
            state.current_price = price.max(PRICE_FLOOR);
        })
    }

    /// Deterministic override: shift the price by an absolute amount.
    pub fn move_price(&self, id: &InstrumentId, delta: Decimal) -> bool {
        self.mutate(id, |state| {
            state.current_price = (state.current_price + delta).max(PRICE_FLOOR);
        })
    }

    /// Deterministic override: shift the price by a percentage
    /// (`move_price_percent(id, -5)` drops it 5%).
    pub fn move_price_percent(&self, id: &InstrumentId, percent: Decimal) -> bool {
        self.mutate(id, |state| {
            let factor = Decimal::ONE + percent / Decimal::from(100);
            state.current_price = (state.current_price * factor).max(PRICE_FLOOR);
        })
    }

    /// Replace the per-tick volatility; negative values clamp to zero.
    pub fn set_volatility(&self, id: &InstrumentId, volatility: f64) -> bool {
        self.mutate(id, |state| {
            state.volatility_per_tick = volatility.max(0.0);
        })
    }

    /// Replace the spread fraction; negative values clamp to zero.
    pub fn set_spread(&self, id: &InstrumentId, spread: Decimal) -> bool {
        self.mutate(id, |state| {
            state.spread_fraction = spread.max(Decimal::ZERO);
        })
    }

    /// Replace the simulated daily volume.
    pub fn set_volume(&self, id: &InstrumentId, volume: u64) -> bool {
        self.mutate(id, |state| {
            state.daily_volume = volume;
        })
    }

    /// Drop an instrument. Returns false if it was not registered.
    pub fn remove_instrument(&self, id: &InstrumentId) -> bool {
        let removed = self.inner.lock().instruments.remove(id).is_some();
        if removed {
            info!(instrument = %id, "instrument removed");
        }
        removed
    }

    /// Drop all instruments.
    pub fn clear(&self) {
        self.inner.lock().instruments.clear();
    }

    /// Number of registered instruments.
    pub fn instrument_count(&self) -> usize {
        self.inner.lock().instruments.len()
    }

    /// Whether an instrument is registered.
    pub fn has_instrument(&self, id: &InstrumentId) -> bool {
        self.inner.lock().instruments.contains_key(id)
    }

    fn mutate(&self, id: &InstrumentId, f: impl FnOnce(&mut InstrumentState)) -> bool {
        match self.inner.lock().instruments.get_mut(id) {
            Some(state) => {
                f(state);
                state.last_update = Utc::now();
                true
            }
            None => false,
        }
    }
}

impl Default for PriceSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn aapl() -> InstrumentId {
        InstrumentId::new("AAPL")
    }

    fn seeded_sim() -> PriceSimulator {
        let sim = PriceSimulator::with_seed(42);
        sim.init_instrument(aapl(), Decimal::from(100), Decimal::new(1, 3), 0.01);
        sim
    }

    #[test]
    fn test_init_and_quote() {
        let sim = seeded_sim();
        let q = sim.get_quote(&aapl()).unwrap();
        assert_eq!(q.last, Decimal::from(100));
        assert!(q.bid < q.last);
        assert!(q.ask > q.last);
    }

    #[test]
    fn test_init_is_idempotent_overwrite() {
        let sim = seeded_sim();
        sim.init_instrument(aapl(), Decimal::from(250), Decimal::new(2, 3), 0.02);
        assert_eq!(sim.instrument_count(), 1);
        let q = sim.get_quote(&aapl()).unwrap();
        assert_eq!(q.last, Decimal::from(250));
    }

    #[test]
    fn test_init_from_scenario() {
        let sim = PriceSimulator::with_seed(5);
        let scenario = MarketScenario::immediate(Decimal::from(250));
        sim.init_from_scenario(aapl(), &scenario);

        let q = sim.get_quote(&aapl()).unwrap();
        assert_eq!(q.last, Decimal::from(250));
        // The immediate preset turns volatility off, so the path is flat.
        assert_eq!(sim.tick(&aapl()), Decimal::from(250));
    }

    #[test]
    fn test_tick_unknown_returns_zero_sentinel() {
        let sim = PriceSimulator::with_seed(1);
        assert_eq!(sim.tick(&InstrumentId::new("GHOST")), Decimal::ZERO);
    }

    #[test]
    fn test_quote_unknown_is_none() {
        let sim = PriceSimulator::with_seed(1);
        assert!(sim.get_quote(&InstrumentId::new("GHOST")).is_none());
    }

    #[test]
    fn test_tick_moves_price_and_respects_floor() {
        let sim = seeded_sim();
        for _ in 0..1_000 {
            let price = sim.tick(&aapl());
            assert!(price >= PRICE_FLOOR);
        }
    }

    #[test]
    fn test_zero_volatility_tick_is_flat() {
        let sim = PriceSimulator::with_seed(7);
        sim.init_instrument(aapl(), Decimal::from(100), Decimal::ZERO, 0.0);
        for _ in 0..10 {
            assert_eq!(sim.tick(&aapl()), Decimal::from(100));
        }
    }

    #[test]
    fn test_same_seed_same_path() {
        let a = seeded_sim();
        let b = seeded_sim();
        for _ in 0..100 {
            assert_eq!(a.tick(&aapl()), b.tick(&aapl()));
        }
    }

    #[test]
    fn test_set_price_applies_floor() {
        let sim = seeded_sim();
        sim.set_price(&aapl(), Decimal::from(-5));
        assert_eq!(sim.get_quote(&aapl()).unwrap().last, PRICE_FLOOR);
    }

    #[test]
    fn test_move_price() {
        let sim = seeded_sim();
        assert!(sim.move_price(&aapl(), Decimal::from(-40)));
        assert_eq!(sim.get_quote(&aapl()).unwrap().last, Decimal::from(60));
        // A move past the floor clamps instead of going negative.
        assert!(sim.move_price(&aapl(), Decimal::from(-1000)));
        assert_eq!(sim.get_quote(&aapl()).unwrap().last, PRICE_FLOOR);
    }

    #[test]
    fn test_move_price_percent() {
        let sim = seeded_sim();
        sim.move_price_percent(&aapl(), Decimal::from(-5));
        assert_eq!(sim.get_quote(&aapl()).unwrap().last, Decimal::from(95));
    }

    #[test]
    fn test_override_unknown_instrument_is_false() {
        let sim = PriceSimulator::with_seed(1);
        let ghost = InstrumentId::new("GHOST");
        assert!(!sim.set_price(&ghost, Decimal::from(10)));
        assert!(!sim.move_price(&ghost, Decimal::ONE));
        assert!(!sim.set_volatility(&ghost, 0.5));
    }

    #[test]
    fn test_negative_volatility_and_spread_clamp() {
        let sim = seeded_sim();
        sim.set_volatility(&aapl(), -1.0);
        sim.set_spread(&aapl(), Decimal::from(-1));
        // Clamped volatility means a flat path; clamped spread collapses
        // bid and ask onto the last price.
        let before = sim.get_quote(&aapl()).unwrap().last;
        assert_eq!(sim.tick(&aapl()), before);
        let q = sim.get_quote(&aapl()).unwrap();
        assert_eq!(q.bid, q.last);
        assert_eq!(q.ask, q.last);
    }

    #[test]
    fn test_spread_scales_linearly() {
        let sim = seeded_sim();
        sim.set_spread(&aapl(), Decimal::new(1, 2)); // 1%
        let narrow = sim.get_quote(&aapl()).unwrap().spread();
        sim.set_spread(&aapl(), Decimal::new(2, 2)); // 2%
        let wide = sim.get_quote(&aapl()).unwrap().spread();
        assert_eq!(wide, narrow * Decimal::from(2));
    }

    #[test]
    fn test_remove_and_clear() {
        let sim = seeded_sim();
        sim.init_instrument(InstrumentId::new("TSLA"), Decimal::from(200), Decimal::ZERO, 0.0);
        assert!(sim.remove_instrument(&aapl()));
        assert!(!sim.remove_instrument(&aapl()));
        assert_eq!(sim.instrument_count(), 1);
        sim.clear();
        assert_eq!(sim.instrument_count(), 0);
    }

    #[test]
    fn test_set_volume_reflected_in_quote() {
        let sim = seeded_sim();
        sim.set_volume(&aapl(), 42);
        assert_eq!(sim.get_quote(&aapl()).unwrap().volume, 42);
    }

    proptest! {
        #[test]
        fn prop_price_floor_holds(
            seed in 0u64..1_000,
            base in 1u32..10_000,
            ops in proptest::collection::vec(0u8..4, 1..50),
            delta in -500i32..500,
        ) {
            let sim = PriceSimulator::with_seed(seed);
            let id = InstrumentId::new("PROP");
            sim.init_instrument(id.clone(), Decimal::from(base), Decimal::new(1, 3), 0.05);

            for op in ops {
                match op {
                    0 => { sim.tick(&id); }
                    1 => { sim.move_price(&id, Decimal::from(delta)); }
                    2 => { sim.move_price_percent(&id, Decimal::from(delta % 100)); }
                    _ => { sim.set_price(&id, Decimal::from(delta)); }
                }
                let last = sim.get_quote(&id).unwrap().last;
                prop_assert!(last >= PRICE_FLOOR);
            }
        }

        #[test]
        fn prop_quote_ordering(
            base in 1u32..100_000,
            spread_bps in 0u32..9_999,
        ) {
            let sim = PriceSimulator::with_seed(0);
            let id = InstrumentId::new("PROP");
            let spread = Decimal::from(spread_bps) / Decimal::from(10_000);
            sim.init_instrument(id.clone(), Decimal::from(base), spread, 0.0);

            let q = sim.get_quote(&id).unwrap();
            prop_assert!(q.bid <= q.last);
            prop_assert!(q.last <= q.ask);
        }
    }
}
