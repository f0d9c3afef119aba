//! Error types for Blueskid
//!
//! Every core operation returns exactly one of these. The grouping tells the
//! transport layer whose fault a failure is: everything except `Internal` is
//! caused by caller input, and only an unreachable adapter is worth retrying.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::grant::Side;
use crate::types::{Bid, Pid};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed assertion: {0}")]
    Format(#[from] FormatError),

    #[error("Cryptographic check failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Grant/accept pair rejected: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Ledger update rejected: {0}")]
    Ledger(#[from] LedgerConflict),

    #[error("Post fetch failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures the caller could not have caused
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }

    /// True when re-issuing the same request might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Adapter(e) if e.is_retryable())
    }
}

/// Malformed assertion text or field contents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("text does not contain an assertion (marker found {markers} times, expected 2)")]
    NotFound { markers: usize },

    #[error("wrong number of fields ({expected} expected, {found} found)")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("opcode must be {expected}, got '{found}'")]
    InvalidOpcode { expected: &'static str, found: String },

    #[error("BID '{0}' is not a hex 64-bit quantity")]
    InvalidBid(String),

    #[error("'{0}' is not a platform@handle identity")]
    InvalidPid(String),

    #[error("malformed nonce '{0}', should end with .G or .A")]
    NonceSuffixUnrecognized(String),

    #[error("malformed nonce, suffix {suffix} does not match opcode {opcode}")]
    NonceSuffixMismatch {
        opcode: &'static str,
        suffix: &'static str,
    },

    #[error("malformed signature: {0}")]
    InvalidBase64(String),
}

impl FormatError {
    /// Both nonce failures are reported as a malformed nonce
    pub fn is_malformed_nonce(&self) -> bool {
        matches!(
            self,
            FormatError::NonceSuffixUnrecognized(_) | FormatError::NonceSuffixMismatch { .. }
        )
    }
}

/// Key decoding and signature failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("malformed public key: {0}")]
    MalformedKey(String),

    #[error("public key is not Ed25519 (algorithm {0})")]
    WrongAlgorithm(String),

    #[error("assertion signature validation failed")]
    SignatureInvalid,
}

/// Inconsistencies between the two halves of a grant/accept pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{side} assertion carries opcode '{found}'")]
    RoleMismatch { side: Side, found: &'static str },

    #[error("granter and accepter not signed with same key")]
    KeyMismatch,

    #[error("granter and accepter used same nonce")]
    NonceReuse,

    #[error("granter and accepter BIDs differ ({grant} vs {accept})")]
    BidMismatch { grant: Bid, accept: Bid },

    #[error("{side} assertion names {actual}, but the other half was posted by {expected}")]
    CounterpartyMismatch {
        side: Side,
        expected: String,
        actual: String,
    },
}

/// A ledger precondition failed; state was left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerConflict {
    #[error("BID {0} has already been claimed")]
    AlreadyClaimed(Bid),

    #[error("no such BID: {0}")]
    UnknownBid(Bid),

    #[error("{pid} is not mapped to BID {bid}")]
    NotOwner { bid: Bid, pid: Pid },

    #[error("public key has been used in a previous grant transaction")]
    KeyReused,
}
