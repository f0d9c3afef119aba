//! Read-only ledger queries

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use blueskid_core::{Bid, LedgerRecord, Pid};

use super::{required, required_bid};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PidQuery {
    pub pid: Option<String>,
}

#[derive(Deserialize)]
pub struct BidQuery {
    pub bid: Option<String>,
}

#[derive(Serialize)]
pub struct PidGroupResponse {
    #[serde(rename = "PIDGroup")]
    pub pid_group: Vec<String>,
}

#[derive(Serialize)]
pub struct PidsResponse {
    #[serde(rename = "PIDs")]
    pub pids: Vec<Pid>,
}

#[derive(Serialize)]
pub struct BidsResponse {
    #[serde(rename = "BIDs")]
    pub bids: Vec<Bid>,
}

#[derive(Serialize)]
pub struct LedgerResponse {
    #[serde(rename = "Records")]
    pub records: Vec<LedgerRecord>,
}

/// GET /get-pid-group?pid=
pub async fn get_pid_group(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PidQuery>, QueryRejection>,
) -> Result<Json<PidGroupResponse>, ServerError> {
    let Query(query) = query?;
    let pid = required(query.pid.as_deref(), "pid")?;
    let pid_group = match Pid::parse(pid) {
        Ok(pid) => state
            .ledger
            .group_of(&pid)
            .iter()
            .map(|p| p.as_str().to_string())
            .collect(),
        Err(_) => vec![pid.to_string()],
    };
    Ok(Json(PidGroupResponse { pid_group }))
}

/// GET /get-pids-for-bid?bid=
pub async fn get_pids_for_bid(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BidQuery>, QueryRejection>,
) -> Result<Json<PidsResponse>, ServerError> {
    let Query(query) = query?;
    let bid = required_bid(query.bid.as_deref(), "bid")?;
    Ok(Json(PidsResponse {
        pids: state.ledger.owners_of(bid).into_iter().collect(),
    }))
}

/// GET /get-bids-for-pid?pid=
pub async fn get_bids_for_pid(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PidQuery>, QueryRejection>,
) -> Result<Json<BidsResponse>, ServerError> {
    let Query(query) = query?;
    let pid = required(query.pid.as_deref(), "pid")?;
    // Only well-formed PIDs ever reach the ledger
    let bids = match Pid::parse(pid) {
        Ok(pid) => state.ledger.bids_of(&pid).into_iter().collect(),
        Err(_) => Vec::new(),
    };
    Ok(Json(BidsResponse { bids }))
}

/// GET /ledger
pub async fn get_ledger(State(state): State<Arc<AppState>>) -> Json<LedgerResponse> {
    Json(LedgerResponse {
        records: state.ledger.records(),
    })
}
