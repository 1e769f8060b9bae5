// src/api.rs
use crate::auth::create_token;
use crate::error::{handle_rejection, ApiError};
use crate::models::{
    key_field, present, text_field, Credentials, Symbol, SymbolRequest, UserAccount, UserQuery,
    UserView, WatchlistQuote,
};
use crate::store::Store;
use log::{debug, info, warn};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

#[derive(Serialize)]
struct AuthResponse {
    user: UserView,
    token: String,
}

impl AuthResponse {
    fn new(account: &UserAccount) -> Self {
        AuthResponse {
            user: UserView::from(account),
            token: create_token(account.id),
        }
    }
}

pub fn routes(store: Arc<Store>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(json_body(ApiError::Internal))
        .and_then(login_handler);

    let signup = warp::path!("api" / "auth" / "signup")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(json_body(ApiError::Internal))
        .and_then(signup_handler);

    let market = warp::path!("api" / "market")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(market_handler);

    let stocks = warp::path!("api" / "stocks")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and(warp::query::<UserQuery>())
        .and_then(stocks_handler);

    let subscribe = warp::path!("api" / "subscribe")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(json_body(ApiError::Internal))
        .and_then(subscribe_handler);

    let unsubscribe = warp::path!("api" / "unsubscribe")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(json_body(ApiError::Internal))
        .and_then(unsubscribe_handler);

    let get_watchlist = warp::path!("api" / "watchlist")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and(warp::query::<UserQuery>())
        .and_then(get_watchlist_handler);

    let add_watchlist = warp::path!("api" / "watchlist")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(json_body(ApiError::WatchlistInternal(
            "Failed to add to watchlist".to_string(),
        )))
        .and_then(add_watchlist_handler);

    let remove_watchlist = warp::path!("api" / "watchlist")
        .and(warp::delete())
        .and(with_store(store))
        .and(json_body(ApiError::WatchlistInternal(
            "Failed to remove from watchlist".to_string(),
        )))
        .and_then(remove_watchlist_handler);

    login
        .or(signup)
        .or(market)
        .or(stocks)
        .or(subscribe)
        .or(unsubscribe)
        .or(get_watchlist)
        .or(add_watchlist)
        .or(remove_watchlist)
        .recover(handle_rejection)
        .with(warp::log("stock_dashboard::api"))
}

fn with_store(
    store: Arc<Store>,
) -> impl Filter<Extract = (Arc<Store>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// Decodes a JSON body, rejecting with `on_malformed` when it does not parse.
fn json_body<T>(on_malformed: ApiError) -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send + 'static,
{
    warp::body::bytes().and_then(move |body: Bytes| {
        let on_malformed = on_malformed.clone();
        async move {
            serde_json::from_slice::<T>(&body).map_err(|e| {
                warn!("Malformed request body: {}", e);
                warp::reject::custom(on_malformed)
            })
        }
    })
}

fn require_credentials(credentials: Credentials) -> Result<(String, String), Rejection> {
    match (text_field(credentials.email), text_field(credentials.password)) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(warp::reject::custom(ApiError::bad_request(
            "Email and password required",
        ))),
    }
}

async fn login_handler(
    store: Arc<Store>,
    credentials: Credentials,
) -> Result<impl Reply, Rejection> {
    let (email, password) = require_credentials(credentials)?;
    match store.authenticate(&email, &password) {
        Some(account) => {
            info!("User {} logged in.", account.id);
            Ok(warp::reply::json(&AuthResponse::new(&account)))
        }
        None => {
            warn!("Failed login for {}", email);
            Err(warp::reject::custom(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            )))
        }
    }
}

async fn signup_handler(
    store: Arc<Store>,
    credentials: Credentials,
) -> Result<impl Reply, Rejection> {
    let (email, password) = require_credentials(credentials)?;
    match store.create_user(&email, &password) {
        Some(account) => {
            info!("Created user {} for {}.", account.id, account.email);
            Ok(warp::reply::json(&AuthResponse::new(&account)))
        }
        None => {
            warn!("Signup rejected, {} already registered", email);
            Err(warp::reject::custom(ApiError::bad_request(
                "User already exists",
            )))
        }
    }
}

async fn market_handler(store: Arc<Store>) -> Result<impl Reply, Rejection> {
    let stocks = store.market_quotes();
    debug!("Market poll returned {} quotes", stocks.len());
    Ok(warp::reply::json(&json!({ "stocks": stocks })))
}

async fn stocks_handler(store: Arc<Store>, query: UserQuery) -> Result<impl Reply, Rejection> {
    let user_id = present(query.user_id)
        .ok_or_else(|| warp::reject::custom(ApiError::bad_request("User ID required")))?;
    let prices = store.advance_prices();
    let subscriptions = store.refresh_subscriptions(&user_id, &prices);
    debug!(
        "Subscriptions poll for {} returned {} entries",
        user_id,
        subscriptions.len()
    );
    Ok(warp::reply::json(&json!({ "subscriptions": subscriptions })))
}

async fn subscribe_handler(
    store: Arc<Store>,
    request: SymbolRequest,
) -> Result<impl Reply, Rejection> {
    let symbol = key_field(request.symbol)
        .and_then(|symbol| symbol.parse::<Symbol>().ok())
        .ok_or_else(|| warp::reject::custom(ApiError::bad_request("Invalid stock symbol")))?;
    let user_id = key_field(request.user_id)
        .ok_or_else(|| warp::reject::custom(ApiError::bad_request("User ID required")))?;

    if !store.subscribe(&user_id, symbol) {
        info!("User {} already subscribed to {}", user_id, symbol);
        return Err(warp::reject::custom(ApiError::bad_request(
            "Already subscribed to this stock",
        )));
    }
    info!(
        "User {} subscribed to {} ({} total).",
        user_id,
        symbol,
        store.subscription_count(&user_id)
    );
    Ok(warp::reply::json(&json!({ "message": "Subscribed successfully" })))
}

async fn unsubscribe_handler(
    store: Arc<Store>,
    request: SymbolRequest,
) -> Result<impl Reply, Rejection> {
    let (user_id, symbol) = match (key_field(request.user_id), key_field(request.symbol)) {
        (Some(user_id), Some(symbol)) => (user_id, symbol),
        _ => {
            return Err(warp::reject::custom(ApiError::bad_request(
                "User ID and symbol required",
            )))
        }
    };

    let removed = symbol
        .parse::<Symbol>()
        .map(|symbol| store.unsubscribe(&user_id, symbol))
        .unwrap_or(false);
    if !removed {
        info!("User {} holds no subscription to {}", user_id, symbol);
        return Err(warp::reject::custom(ApiError::NotFound(
            "Stock not found in subscriptions".to_string(),
        )));
    }
    info!("User {} unsubscribed from {}.", user_id, symbol);
    Ok(warp::reply::json(&json!({ "message": "Unsubscribed successfully" })))
}

/// Watchlist change fields are drawn fresh on every read and are not derived
/// from the price walk.
fn watchlist_quotes(symbols: Vec<Symbol>, store: &Store) -> Vec<WatchlistQuote> {
    let prices = store.advance_prices();
    let mut rng = rand::thread_rng();
    symbols
        .into_iter()
        .map(|symbol| WatchlistQuote {
            symbol,
            price: prices.price(symbol).unwrap_or_default(),
            change: rng.gen_range(-2.5..2.5),
            change_percent: rng.gen_range(-1.0..1.0),
        })
        .collect()
}

async fn get_watchlist_handler(
    store: Arc<Store>,
    query: UserQuery,
) -> Result<impl Reply, Rejection> {
    let user_id = present(query.user_id).ok_or_else(|| {
        warp::reject::custom(ApiError::Watchlist("User ID required".to_string()))
    })?;
    let watchlist = watchlist_quotes(store.watchlist(&user_id), &store);
    debug!("Watchlist poll for {} returned {} entries", user_id, watchlist.len());
    Ok(warp::reply::json(&json!({ "watchlist": watchlist })))
}

fn watchlist_target(request: SymbolRequest) -> Result<(String, Symbol), Rejection> {
    let (user_id, symbol) = match (key_field(request.user_id), key_field(request.symbol)) {
        (Some(user_id), Some(symbol)) => (user_id, symbol),
        _ => {
            return Err(warp::reject::custom(ApiError::Watchlist(
                "User ID and symbol required".to_string(),
            )))
        }
    };
    let symbol = symbol.parse::<Symbol>().map_err(|e| {
        warn!("Watchlist request from {}: {}", user_id, e);
        warp::reject::custom(ApiError::Watchlist("Invalid stock symbol".to_string()))
    })?;
    Ok((user_id, symbol))
}

async fn add_watchlist_handler(
    store: Arc<Store>,
    request: SymbolRequest,
) -> Result<impl Reply, Rejection> {
    let (user_id, symbol) = watchlist_target(request)?;
    if !store.watch(&user_id, symbol) {
        return Err(warp::reject::custom(ApiError::Watchlist(
            "Already in watchlist".to_string(),
        )));
    }
    info!("User {} added {} to watchlist.", user_id, symbol);
    Ok(warp::reply::json(
        &json!({ "success": true, "message": "Added to watchlist" }),
    ))
}

async fn remove_watchlist_handler(
    store: Arc<Store>,
    request: SymbolRequest,
) -> Result<impl Reply, Rejection> {
    let (user_id, symbol) = watchlist_target(request)?;
    if !store.unwatch(&user_id, symbol) {
        return Err(warp::reject::custom(ApiError::Watchlist(
            "Not in watchlist".to_string(),
        )));
    }
    info!("User {} removed {} from watchlist.", user_id, symbol);
    Ok(warp::reply::json(
        &json!({ "success": true, "message": "Removed from watchlist" }),
    ))
}
