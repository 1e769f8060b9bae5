// src/store.rs
use crate::config::Config;
use crate::ledger::{SubscriptionLedger, WatchlistLedger};
use crate::market::{PriceGenerator, PriceSnapshot};
use crate::models::{Quote, Subscription, Symbol, UserAccount};
use crate::users::UserDirectory;
use chrono::Utc;
use parking_lot::Mutex;

/// Process-wide state shared by every handler.
///
/// Each ledger sits behind its own lock, and every method takes exactly one
/// of them for the whole of its read-modify-write.
pub struct Store {
    market: Mutex<PriceGenerator>,
    subscriptions: Mutex<SubscriptionLedger>,
    watchlists: Mutex<WatchlistLedger>,
    users: Mutex<UserDirectory>,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Store {
            market: Mutex::new(PriceGenerator::new(config.seed)),
            subscriptions: Mutex::new(SubscriptionLedger::new(config.history_capacity)),
            watchlists: Mutex::new(WatchlistLedger::new()),
            users: Mutex::new(UserDirectory::new()),
        }
    }

    /// Steps the walk and returns the table it produced, tagged with its tick.
    pub fn advance_prices(&self) -> PriceSnapshot {
        let mut market = self.market.lock();
        let prices = market.advance();
        PriceSnapshot {
            tick: market.tick(),
            prices,
        }
    }

    pub fn prices(&self) -> PriceSnapshot {
        self.market.lock().snapshot()
    }

    pub fn market_quotes(&self) -> Vec<Quote> {
        self.market.lock().market_quotes(Utc::now().timestamp_millis())
    }

    pub fn subscriptions(&self, user_id: &str) -> Vec<Subscription> {
        self.subscriptions.lock().list_for_user(user_id)
    }

    pub fn subscription_count(&self, user_id: &str) -> usize {
        self.subscriptions.lock().count_for_user(user_id)
    }

    pub fn subscribe(&self, user_id: &str, symbol: Symbol) -> bool {
        let prices = self.prices();
        self.subscriptions.lock().add(user_id, symbol, &prices)
    }

    pub fn unsubscribe(&self, user_id: &str, symbol: Symbol) -> bool {
        self.subscriptions.lock().remove(user_id, symbol)
    }

    pub fn refresh_subscriptions(&self, user_id: &str, prices: &PriceSnapshot) -> Vec<Quote> {
        self.subscriptions
            .lock()
            .refresh_view(user_id, prices, Utc::now().timestamp_millis())
    }

    pub fn watchlist(&self, user_id: &str) -> Vec<Symbol> {
        self.watchlists.lock().list(user_id)
    }

    pub fn watch(&self, user_id: &str, symbol: Symbol) -> bool {
        self.watchlists.lock().add(user_id, symbol)
    }

    pub fn unwatch(&self, user_id: &str, symbol: Symbol) -> bool {
        self.watchlists.lock().remove(user_id, symbol)
    }

    pub fn create_user(&self, email: &str, password: &str) -> Option<UserAccount> {
        self.users.lock().create(email, password)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Option<UserAccount> {
        self.users.lock().authenticate(email, password)
    }
}
