//! Assertion generation endpoints
//!
//! These only produce text for users to post; nothing is recorded.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::{Deserialize, Serialize};

use blueskid_core::grant;

use super::{required_bid, required_pid};
use crate::error::ServerError;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GrantAssertionsRequest {
    #[serde(rename = "BID")]
    pub bid: Option<String>,
    pub granter: Option<String>,
    pub accepter: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GrantAssertionsResponse {
    pub grant_assertion: String,
    pub accept_assertion: String,
}

/// POST /grant-assertions
pub async fn grant_assertions(
    payload: Result<Json<GrantAssertionsRequest>, JsonRejection>,
) -> Result<Json<GrantAssertionsResponse>, ServerError> {
    let Json(req) = payload?;
    let bid = required_bid(req.bid.as_deref(), "BID")?;
    let granter = required_pid(req.granter.as_deref(), "Granter")?;
    let accepter = required_pid(req.accepter.as_deref(), "Accepter")?;
    if granter == accepter {
        return Err(ServerError::BadRequest(
            "Granter and Accepter must differ".to_string(),
        ));
    }

    let pair = grant::generate_pair(bid, &granter, &accepter)?;
    Ok(Json(GrantAssertionsResponse {
        grant_assertion: pair.grant,
        accept_assertion: pair.accept,
    }))
}

#[derive(Deserialize)]
pub struct BidAssertionRequest {
    #[serde(rename = "BID")]
    pub bid: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BidAssertionResponse {
    pub assertion: String,
}

/// POST /claim-assertion
pub async fn claim_assertion(
    payload: Result<Json<BidAssertionRequest>, JsonRejection>,
) -> Result<Json<BidAssertionResponse>, ServerError> {
    let Json(req) = payload?;
    let bid = required_bid(req.bid.as_deref(), "BID")?;
    Ok(Json(BidAssertionResponse {
        assertion: grant::build_claim(bid),
    }))
}

/// POST /unclaim-assertion
pub async fn unclaim_assertion(
    payload: Result<Json<BidAssertionRequest>, JsonRejection>,
) -> Result<Json<BidAssertionResponse>, ServerError> {
    let Json(req) = payload?;
    let bid = required_bid(req.bid.as_deref(), "BID")?;
    Ok(Json(BidAssertionResponse {
        assertion: grant::build_unclaim(bid),
    }))
}

