// src/ledger.rs
use crate::market::{PriceSnapshot, PRICE_FLOOR};
use crate::models::{Quote, Subscription, Symbol};
use std::collections::HashMap;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Per-user subscriptions, each carrying the price seen at the last poll.
pub struct SubscriptionLedger {
    by_user: HashMap<String, Vec<Subscription>>,
    history_capacity: usize,
}

impl SubscriptionLedger {
    pub fn new(history_capacity: usize) -> Self {
        SubscriptionLedger {
            by_user: HashMap::new(),
            history_capacity: history_capacity.max(1),
        }
    }

    pub fn list_for_user(&self, user_id: &str) -> Vec<Subscription> {
        self.by_user.get(user_id).cloned().unwrap_or_default()
    }

    pub fn count_for_user(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map_or(0, Vec::len)
    }

    /// Returns false if the user already holds `symbol`.
    pub fn add(&mut self, user_id: &str, symbol: Symbol, prices: &PriceSnapshot) -> bool {
        let subs = self.by_user.entry(user_id.to_string()).or_default();
        if subs.iter().any(|s| s.symbol == symbol) {
            return false;
        }
        let price = prices.price(symbol).unwrap_or(PRICE_FLOOR);
        subs.push(Subscription::new(
            symbol,
            price,
            prices.tick,
            self.history_capacity,
        ));
        true
    }

    pub fn remove(&mut self, user_id: &str, symbol: Symbol) -> bool {
        let Some(subs) = self.by_user.get_mut(user_id) else {
            return false;
        };
        match subs.iter().position(|s| s.symbol == symbol) {
            Some(index) => {
                subs.remove(index);
                true
            }
            None => false,
        }
    }

    /// Quotes each subscription against its last observed price, then moves
    /// that baseline to the current price. Consecutive polls therefore report
    /// the delta since the previous poll.
    ///
    /// A snapshot older than the one a subscription last saw leaves that
    /// subscription's price and history where they are.
    pub fn refresh_view(
        &mut self,
        user_id: &str,
        prices: &PriceSnapshot,
        timestamp: i64,
    ) -> Vec<Quote> {
        let capacity = self.history_capacity;
        let Some(subs) = self.by_user.get_mut(user_id) else {
            return Vec::new();
        };
        subs.iter_mut()
            .map(|sub| {
                if prices.tick >= sub.observed_tick {
                    if let Some(price) = prices.price(sub.symbol) {
                        sub.record(price, prices.tick, capacity);
                    }
                }
                let price = sub.current_price;
                let quote = Quote::new(sub.symbol, price, sub.last_observed_price, timestamp);
                sub.last_observed_price = price;
                quote
            })
            .collect()
    }
}

impl Default for SubscriptionLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Per-user watched symbols. Membership only.
#[derive(Default)]
pub struct WatchlistLedger {
    by_user: HashMap<String, Vec<Symbol>>,
}

impl WatchlistLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, user_id: &str) -> Vec<Symbol> {
        self.by_user.get(user_id).cloned().unwrap_or_default()
    }

    pub fn add(&mut self, user_id: &str, symbol: Symbol) -> bool {
        let symbols = self.by_user.entry(user_id.to_string()).or_default();
        if symbols.contains(&symbol) {
            return false;
        }
        symbols.push(symbol);
        true
    }

    pub fn remove(&mut self, user_id: &str, symbol: Symbol) -> bool {
        let Some(symbols) = self.by_user.get_mut(user_id) else {
            return false;
        };
        match symbols.iter().position(|s| *s == symbol) {
            Some(index) => {
                symbols.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tick: u64, entries: &[(Symbol, f64)]) -> PriceSnapshot {
        PriceSnapshot {
            tick,
            prices: entries.iter().copied().collect(),
        }
    }

    fn at(price: f64) -> PriceSnapshot {
        snapshot(0, &Symbol::ALL.map(|symbol| (symbol, price)))
    }

    #[test]
    fn test_add_detects_duplicates() {
        let mut ledger = SubscriptionLedger::default();
        assert!(ledger.add("u1", Symbol::Goog, &at(150.0)));
        assert!(!ledger.add("u1", Symbol::Goog, &at(151.0)));
        let subs = ledger.list_for_user("u1");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].current_price, 150.0);
        assert_eq!(subs[0].last_observed_price, 150.0);
        assert_eq!(subs[0].history.len(), 1);
    }

    #[test]
    fn test_list_unknown_user_is_empty() {
        let ledger = SubscriptionLedger::default();
        assert!(ledger.list_for_user("nobody").is_empty());
        assert_eq!(ledger.count_for_user("nobody"), 0);
    }

    #[test]
    fn test_count_for_user() {
        let mut ledger = SubscriptionLedger::default();
        ledger.add("u1", Symbol::Goog, &at(150.0));
        ledger.add("u1", Symbol::Tsla, &at(150.0));
        ledger.add("u2", Symbol::Tsla, &at(150.0));
        assert_eq!(ledger.count_for_user("u1"), 2);
        assert_eq!(ledger.count_for_user("u2"), 1);
    }

    #[test]
    fn test_remove_after_add() {
        let mut ledger = SubscriptionLedger::default();
        ledger.add("u1", Symbol::Goog, &at(150.0));
        ledger.add("u1", Symbol::Tsla, &at(250.0));

        assert!(ledger.remove("u1", Symbol::Goog));
        let symbols: Vec<Symbol> = ledger.list_for_user("u1").iter().map(|s| s.symbol).collect();
        assert_eq!(symbols, vec![Symbol::Tsla]);

        assert!(!ledger.remove("u1", Symbol::Goog));
        assert!(!ledger.remove("u2", Symbol::Tsla));
        assert_eq!(ledger.list_for_user("u1").len(), 1);
    }

    #[test]
    fn test_subscription_lifecycle() {
        let mut ledger = SubscriptionLedger::default();
        assert!(ledger.add("u1", Symbol::Goog, &at(150.0)));
        assert_eq!(ledger.list_for_user("u1").len(), 1);
        assert!(!ledger.add("u1", Symbol::Goog, &at(150.0)));
        assert_eq!(ledger.list_for_user("u1").len(), 1);
        assert!(ledger.remove("u1", Symbol::Goog));
        assert_eq!(ledger.list_for_user("u1").len(), 0);
        assert!(!ledger.remove("u1", Symbol::Goog));
    }

    #[test]
    fn test_refresh_view_resets_baseline() {
        let mut ledger = SubscriptionLedger::default();
        ledger.add("u1", Symbol::Goog, &at(100.0));

        let moved = snapshot(1, &[(Symbol::Goog, 110.0)]);
        let first = ledger.refresh_view("u1", &moved, 1);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].price, 110.0);
        assert_eq!(first[0].change, 10.0);
        assert_eq!(first[0].change_percent, 10.0);

        let second = ledger.refresh_view("u1", &moved, 2);
        assert_eq!(second[0].change, 0.0);
        assert_eq!(second[0].change_percent, 0.0);
        assert_eq!(second[0].timestamp, 2);
    }

    #[test]
    fn test_refresh_view_ignores_stale_snapshot() {
        let mut ledger = SubscriptionLedger::default();
        ledger.add("u1", Symbol::Goog, &at(100.0));

        let older = snapshot(1, &[(Symbol::Goog, 104.0)]);
        let newer = snapshot(2, &[(Symbol::Goog, 108.0)]);
        ledger.refresh_view("u1", &newer, 1);

        let late = ledger.refresh_view("u1", &older, 2);
        assert_eq!(late[0].price, 108.0);
        assert_eq!(late[0].change, 0.0);

        let sub = &ledger.list_for_user("u1")[0];
        assert_eq!(sub.current_price, 108.0);
        assert_eq!(sub.last_observed_price, 108.0);
        assert_eq!(sub.observed_tick, 2);
        assert_eq!(sub.history.back(), Some(&108.0));
        assert_eq!(sub.history.len(), 2);
    }

    #[test]
    fn test_refresh_view_zero_baseline() {
        let mut ledger = SubscriptionLedger::default();
        ledger.add("u1", Symbol::Nvda, &at(0.0));
        let view = ledger.refresh_view("u1", &snapshot(1, &[(Symbol::Nvda, 5.0)]), 1);
        assert_eq!(view[0].change, 5.0);
        assert_eq!(view[0].change_percent, 0.0);
    }

    #[test]
    fn test_refresh_view_bounds_history() {
        let mut ledger = SubscriptionLedger::new(4);
        ledger.add("u1", Symbol::Amzn, &at(200.0));
        for step in 1..=10u64 {
            let prices = snapshot(step, &[(Symbol::Amzn, 200.0 + step as f64)]);
            ledger.refresh_view("u1", &prices, step as i64);
        }
        let sub = &ledger.list_for_user("u1")[0];
        assert_eq!(sub.history.len(), 4);
        assert_eq!(sub.history.back(), Some(&210.0));
    }

    #[test]
    fn test_refresh_view_unknown_user() {
        let mut ledger = SubscriptionLedger::default();
        assert!(ledger.refresh_view("ghost", &snapshot(0, &[]), 0).is_empty());
    }

    #[test]
    fn test_watchlist_add_remove() {
        let mut ledger = WatchlistLedger::new();
        assert!(ledger.list("a").is_empty());
        assert!(ledger.add("a", Symbol::Meta));
        assert!(!ledger.add("a", Symbol::Meta));
        assert_eq!(ledger.list("a"), vec![Symbol::Meta]);
        assert!(ledger.remove("a", Symbol::Meta));
        assert!(!ledger.remove("a", Symbol::Meta));
        assert!(ledger.list("a").is_empty());
    }

    #[test]
    fn test_watchlists_are_isolated_per_user() {
        let mut ledger = WatchlistLedger::new();
        ledger.add("a", Symbol::Goog);
        ledger.add("b", Symbol::Goog);
        ledger.add("b", Symbol::Tsla);

        assert!(ledger.remove("a", Symbol::Goog));
        assert!(!ledger.remove("a", Symbol::Tsla));
        assert_eq!(ledger.list("b"), vec![Symbol::Goog, Symbol::Tsla]);
    }
}
