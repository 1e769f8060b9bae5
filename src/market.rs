// src/market.rs
use crate::models::{Quote, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Prices never drop below this floor.
pub const PRICE_FLOOR: f64 = 1.0;
/// Per-step delta bound; each step draws from [-MAX_STEP, MAX_STEP).
pub const MAX_STEP: f64 = 5.0;

pub type PriceTable = BTreeMap<Symbol, f64>;

/// A price table tagged with the step that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    /// Number of `advance` calls made before this table was taken.
    pub tick: u64,
    pub prices: PriceTable,
}

impl PriceSnapshot {
    pub fn price(&self, symbol: Symbol) -> Option<f64> {
        self.prices.get(&symbol).copied()
    }
}

fn seed_range(symbol: Symbol) -> (f64, f64) {
    match symbol {
        Symbol::Goog => (120.0, 220.0),
        Symbol::Tsla => (200.0, 300.0),
        Symbol::Amzn => (150.0, 250.0),
        Symbol::Meta => (300.0, 400.0),
        Symbol::Nvda => (550.0, 650.0),
    }
}

/// Random walk over the fixed symbol set, stepped once per read.
pub struct PriceGenerator {
    prices: PriceTable,
    /// Prices last reported by the market view, keyed per symbol.
    last_quoted: BTreeMap<Symbol, f64>,
    tick: u64,
    rng: StdRng,
}

impl PriceGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let prices = Symbol::ALL
            .into_iter()
            .map(|symbol| {
                let (low, high) = seed_range(symbol);
                (symbol, rng.gen_range(low..high))
            })
            .collect();
        PriceGenerator {
            prices,
            last_quoted: BTreeMap::new(),
            tick: 0,
            rng,
        }
    }

    /// Steps every symbol by a uniform delta, clamped at the floor.
    pub fn advance(&mut self) -> PriceTable {
        for price in self.prices.values_mut() {
            let delta = self.rng.gen_range(-MAX_STEP..MAX_STEP);
            *price = (*price + delta).max(PRICE_FLOOR);
        }
        self.tick += 1;
        self.prices.clone()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            tick: self.tick,
            prices: self.read(),
        }
    }

    pub fn read(&self) -> PriceTable {
        self.prices.clone()
    }

    /// Advances once and quotes every symbol against the previous market poll.
    pub fn market_quotes(&mut self, timestamp: i64) -> Vec<Quote> {
        let prices = self.advance();
        prices
            .into_iter()
            .map(|(symbol, price)| {
                let baseline = self.last_quoted.insert(symbol, price).unwrap_or(price);
                Quote::new(symbol, price, baseline, timestamp)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn set_price(&mut self, symbol: Symbol, price: f64) {
        self.prices.insert(symbol, price);
    }
}
