//! Ledger update endpoints
//!
//! Each request names the post(s) holding an assertion. The posts are fetched
//! and checked first; the ledger is only touched once everything verified.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use blueskid_core::assertion::{Opcode, SIGNED_FIELDS, UNSIGNED_FIELDS};
use blueskid_core::{grant, Bid, Pid};

use super::required;
use crate::error::ServerError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BidRequest {
    pub post: Option<String>,
}

#[derive(Serialize)]
pub struct BidResponse {
    #[serde(rename = "BID")]
    pub bid: Bid,
    #[serde(rename = "PID")]
    pub pid: Pid,
}

/// POST /claim-bid
pub async fn claim_bid(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> Result<Json<BidResponse>, ServerError> {
    let Json(req) = payload?;
    let post_url = required(req.post.as_deref(), "Post")?;

    let (bid, pid) = fetch_bid_assertion(&state, post_url, Opcode::Claim).await?;
    state.ledger.apply_claim(bid, &pid, post_url)?;

    Ok(Json(BidResponse { bid, pid }))
}

/// POST /unclaim-bid
pub async fn unclaim_bid(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> Result<Json<BidResponse>, ServerError> {
    let Json(req) = payload?;
    let post_url = required(req.post.as_deref(), "Post")?;

    let (bid, pid) = fetch_bid_assertion(&state, post_url, Opcode::Unclaim).await?;
    state.ledger.apply_unclaim(bid, &pid, post_url)?;

    Ok(Json(BidResponse { bid, pid }))
}

async fn fetch_bid_assertion(
    state: &AppState,
    post_url: &str,
    opcode: Opcode,
) -> Result<(Bid, Pid), ServerError> {
    let fetched = state
        .adapters
        .fetch_assertion(post_url, UNSIGNED_FIELDS)
        .await?;
    let bid = grant::check_bid_assertion(&fetched.fields, opcode)?;
    Ok((bid, fetched.poster))
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GrantRequest {
    pub grant_post: Option<String>,
    pub accept_post: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GrantResponse {
    #[serde(rename = "BID")]
    pub bid: Bid,
    pub granter: Pid,
    pub accepter: Pid,
}

/// POST /grant-bid
pub async fn grant_bid(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GrantRequest>, JsonRejection>,
) -> Result<Json<GrantResponse>, ServerError> {
    let Json(req) = payload?;
    let grant_url = required(req.grant_post.as_deref(), "GrantPost")?;
    let accept_url = required(req.accept_post.as_deref(), "AcceptPost")?;

    let (grant_half, accept_half) = tokio::join!(
        state.adapters.fetch_assertion(grant_url, SIGNED_FIELDS),
        state.adapters.fetch_assertion(accept_url, SIGNED_FIELDS),
    );
    let (grant_half, accept_half) = (grant_half?, accept_half?);

    let verified = grant::verify_pair(
        &grant_half.fields,
        &grant_half.poster,
        &accept_half.fields,
        &accept_half.poster,
    )?;
    state.ledger.apply_grant(
        verified.bid,
        &grant_half.poster,
        &accept_half.poster,
        &verified.key,
        [grant_url, accept_url],
    )?;

    Ok(Json(GrantResponse {
        bid: verified.bid,
        granter: grant_half.poster,
        accepter: accept_half.poster,
    }))
}
