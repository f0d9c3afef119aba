//! Identity ledger
//!
//! Append-only log of claim, grant and unclaim records, together with the
//! ownership indices derived from it. Everything lives in memory; a restart
//! loses all history.
//!
//! A BID can be claimed once in its lifetime. Unclaiming removes the owner but
//! never frees the BID, so an emptied BID stays burned.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::error::LedgerConflict;
use crate::{Bid, Pid, PublicKey, Result};

/// Type of ledger record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Claim,
    Grant,
    Unclaim,
}

/// An applied ownership change
///
/// - Claim: `pids = [claimer]`, `post_urls = [claim post]`
/// - Grant: `pids = [granter, accepter]`, `post_urls = [grant post, accept post]`
/// - Unclaim: `pids = [unclaimer]`, `post_urls = [unclaim post]`
///
/// Only grants carry a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    #[serde(rename = "RecType")]
    kind: RecordKind,
    #[serde(rename = "BID")]
    bid: Bid,
    #[serde(rename = "PIDs")]
    pids: Vec<Pid>,
    #[serde(rename = "PostURLs")]
    post_urls: Vec<String>,
    #[serde(rename = "Key", skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl LedgerRecord {
    pub fn claim(bid: Bid, claimer: Pid, post_url: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Claim,
            bid,
            pids: vec![claimer],
            post_urls: vec![post_url.into()],
            key: None,
        }
    }

    /// `key` is the encoded public key that signed the grant/accept pair
    pub fn grant(
        bid: Bid,
        granter: Pid,
        accepter: Pid,
        key: impl Into<String>,
        post_urls: [String; 2],
    ) -> Self {
        Self {
            kind: RecordKind::Grant,
            bid,
            pids: vec![granter, accepter],
            post_urls: post_urls.into(),
            key: Some(key.into()),
        }
    }

    pub fn unclaim(bid: Bid, unclaimer: Pid, post_url: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Unclaim,
            bid,
            pids: vec![unclaimer],
            post_urls: vec![post_url.into()],
            key: None,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn bid(&self) -> Bid {
        self.bid
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn post_urls(&self) -> &[String] {
        &self.post_urls
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Claimer, granter or unclaimer
    pub fn subject(&self) -> &Pid {
        &self.pids[0]
    }

    /// Receiving PID of a grant
    pub fn accepter(&self) -> Option<&Pid> {
        match self.kind {
            RecordKind::Grant => self.pids.get(1),
            RecordKind::Claim | RecordKind::Unclaim => None,
        }
    }
}

/// Ownership indices derived from the records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indices {
    /// Current owners per BID; a key present with an empty set is a burned BID
    pub owners_of: BTreeMap<Bid, BTreeSet<Pid>>,
    /// Inverse of `owners_of`, without empty entries
    pub bids_of: BTreeMap<Pid, BTreeSet<Bid>>,
    /// Every key that appeared in an applied grant
    pub used_keys: BTreeSet<String>,
}

/// Records plus indices, without locking
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    records: Vec<LedgerRecord>,
    indices: Indices,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state by applying `records` in order to an empty ledger
    pub fn replay<'a, I>(records: I) -> std::result::Result<Self, LedgerConflict>
    where
        I: IntoIterator<Item = &'a LedgerRecord>,
    {
        let mut state = Self::new();
        for record in records {
            state.apply(record.clone())?;
        }
        Ok(state)
    }

    /// Check `record` against current state without changing anything
    pub fn check(&self, record: &LedgerRecord) -> std::result::Result<(), LedgerConflict> {
        let owners = self.indices.owners_of.get(&record.bid);
        match record.kind {
            RecordKind::Claim => {
                if owners.is_some() {
                    return Err(LedgerConflict::AlreadyClaimed(record.bid));
                }
            }
            RecordKind::Grant | RecordKind::Unclaim => {
                let owners = owners.ok_or(LedgerConflict::UnknownBid(record.bid))?;
                if !owners.contains(record.subject()) {
                    return Err(LedgerConflict::NotOwner {
                        bid: record.bid,
                        pid: record.subject().clone(),
                    });
                }
                if let Some(key) = &record.key {
                    if self.indices.used_keys.contains(key) {
                        return Err(LedgerConflict::KeyReused);
                    }
                }
            }
        }
        Ok(())
    }

    /// Check and append `record`; nothing changes when the check fails
    pub fn apply(&mut self, record: LedgerRecord) -> std::result::Result<(), LedgerConflict> {
        self.check(&record)?;

        let indices = &mut self.indices;
        match record.kind {
            RecordKind::Claim => {
                let claimer = record.subject().clone();
                indices
                    .owners_of
                    .insert(record.bid, BTreeSet::from([claimer.clone()]));
                indices.bids_of.entry(claimer).or_default().insert(record.bid);
            }
            RecordKind::Grant => {
                if let Some(accepter) = record.accepter() {
                    indices
                        .owners_of
                        .entry(record.bid)
                        .or_default()
                        .insert(accepter.clone());
                    indices
                        .bids_of
                        .entry(accepter.clone())
                        .or_default()
                        .insert(record.bid);
                }
                if let Some(key) = &record.key {
                    indices.used_keys.insert(key.clone());
                }
            }
            RecordKind::Unclaim => {
                let unclaimer = record.subject();
                if let Some(owners) = indices.owners_of.get_mut(&record.bid) {
                    owners.remove(unclaimer);
                }
                if let Some(bids) = indices.bids_of.get_mut(unclaimer) {
                    bids.remove(&record.bid);
                    if bids.is_empty() {
                        indices.bids_of.remove(unclaimer);
                    }
                }
            }
        }

        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn owners_of(&self, bid: Bid) -> BTreeSet<Pid> {
        self.indices.owners_of.get(&bid).cloned().unwrap_or_default()
    }

    pub fn bids_of(&self, pid: &Pid) -> BTreeSet<Bid> {
        self.indices.bids_of.get(pid).cloned().unwrap_or_default()
    }

    /// `pid` plus every co-owner of any BID `pid` owns (one hop only)
    pub fn group_of(&self, pid: &Pid) -> BTreeSet<Pid> {
        let mut group = BTreeSet::from([pid.clone()]);
        if let Some(bids) = self.indices.bids_of.get(pid) {
            for bid in bids {
                if let Some(owners) = self.indices.owners_of.get(bid) {
                    group.extend(owners.iter().cloned());
                }
            }
        }
        group
    }
}

/// The shared ledger
///
/// Every mutation takes the write lock for the whole check-and-apply step, so
/// concurrent claims of one BID cannot both succeed and a grant's key check
/// is atomic with recording that key.
#[derive(Debug, Default)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously exported records
    pub fn from_records<'a, I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a LedgerRecord>,
    {
        Ok(Self {
            state: RwLock::new(LedgerState::replay(records)?),
        })
    }

    // State is only written after a successful check, so a writer that
    // panicked cannot have left it half-updated.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one record atomically
    pub fn apply(&self, record: LedgerRecord) -> Result<()> {
        let kind = record.kind();
        let bid = record.bid();
        let pids = record.pids().to_vec();

        match self.write().apply(record) {
            Ok(()) => {
                tracing::info!(?kind, %bid, ?pids, "ledger record applied");
                Ok(())
            }
            Err(conflict) => {
                tracing::warn!(?kind, %bid, ?pids, reason = %conflict, "ledger record rejected");
                Err(conflict.into())
            }
        }
    }

    pub fn apply_claim(&self, bid: Bid, pid: &Pid, post_url: &str) -> Result<()> {
        self.apply(LedgerRecord::claim(bid, pid.clone(), post_url))
    }

    pub fn apply_grant(
        &self,
        bid: Bid,
        granter: &Pid,
        accepter: &Pid,
        key: &PublicKey,
        post_urls: [&str; 2],
    ) -> Result<()> {
        let key = key.encode()?;
        self.apply(LedgerRecord::grant(
            bid,
            granter.clone(),
            accepter.clone(),
            key,
            post_urls.map(str::to_string),
        ))
    }

    pub fn apply_unclaim(&self, bid: Bid, pid: &Pid, post_url: &str) -> Result<()> {
        self.apply(LedgerRecord::unclaim(bid, pid.clone(), post_url))
    }

    /// Current owners of `bid`; empty for unknown BIDs
    pub fn owners_of(&self, bid: Bid) -> BTreeSet<Pid> {
        self.read().owners_of(bid)
    }

    /// BIDs `pid` currently owns; empty for unknown PIDs
    pub fn bids_of(&self, pid: &Pid) -> BTreeSet<Bid> {
        self.read().bids_of(pid)
    }

    pub fn group_of(&self, pid: &Pid) -> BTreeSet<Pid> {
        self.read().group_of(pid)
    }

    /// Copy of the record log, oldest first
    pub fn records(&self) -> Vec<LedgerRecord> {
        self.read().records().to_vec()
    }

    /// Snapshot of the derived indices
    pub fn indices(&self) -> Indices {
        self.read().indices().clone()
    }

    pub fn len(&self) -> usize {
        self.read().records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
