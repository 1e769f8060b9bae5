// src/error.rs
use log::error;
use serde_json::json;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Rejection, Reply};

/// Every failure a handler can surface to the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input (400, `message`).
    #[error("{0}")]
    BadRequest(String),
    /// Rejected credentials (401, `message`).
    #[error("{0}")]
    Unauthorized(String),
    /// Nothing to act on (404, `message`).
    #[error("{0}")]
    NotFound(String),
    /// Watchlist routes report under an `error` key rather than `message`.
    #[error("{0}")]
    Watchlist(String),
    #[error("{0}")]
    WatchlistInternal(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Watchlist(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::WatchlistInternal(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ApiError::Watchlist(_) | ApiError::WatchlistInternal(_) => "error",
            _ => "message",
        }
    }

    pub fn into_reply(self) -> warp::reply::WithStatus<warp::reply::Json> {
        let mut body = serde_json::Map::new();
        body.insert(self.key().to_string(), self.to_string().into());
        warp::reply::with_status(warp::reply::json(&body), self.status())
    }
}

impl Reject for ApiError {}

/// Renders any rejection as a JSON body with the matching status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        return Ok(api_error.clone().into_reply());
    }

    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "message": message })),
        status,
    ))
}
