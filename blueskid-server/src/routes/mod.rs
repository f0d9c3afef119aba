//! HTTP routes for the ledger service

mod assertions;
mod bids;
mod queries;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use blueskid_core::{Bid, Pid};

use crate::error::ServerError;
use crate::state::AppState;

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/grant-assertions", post(assertions::grant_assertions))
        .route("/claim-assertion", post(assertions::claim_assertion))
        .route("/unclaim-assertion", post(assertions::unclaim_assertion))
        .route("/claim-bid", post(bids::claim_bid))
        .route("/grant-bid", post(bids::grant_bid))
        .route("/unclaim-bid", post(bids::unclaim_bid))
        .route("/get-pid-group", get(queries::get_pid_group))
        .route("/get-pids-for-bid", get(queries::get_pids_for_bid))
        .route("/get-bids-for-pid", get(queries::get_bids_for_pid))
        .route("/ledger", get(queries::get_ledger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A required request value that must be present and non-empty
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ServerError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("missing parameter '{}'", name)))
}

fn required_bid(value: Option<&str>, name: &str) -> Result<Bid, ServerError> {
    Bid::parse_hex(required(value, name)?).map_err(|e| invalid(name, e))
}

fn required_pid(value: Option<&str>, name: &str) -> Result<Pid, ServerError> {
    Pid::parse(required(value, name)?).map_err(|e| invalid(name, e))
}

fn invalid(name: &str, err: impl std::fmt::Display) -> ServerError {
    ServerError::BadRequest(format!("invalid parameter '{}': {}", name, err))
}
