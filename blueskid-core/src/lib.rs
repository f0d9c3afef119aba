//! Blueskid Core Library
//!
//! Implements the assertion protocol for binding social-platform identities
//! (PIDs) to a shared opaque identifier (BID):
//! - Owners publish short signed assertions inside ordinary social posts
//! - Verifiers check grant/accept pairs against the identities that posted them
//! - The ledger records claims, grants and unclaims and enforces ownership

pub mod adapter;
pub mod assertion;
pub mod error;
pub mod grant;
pub mod keys;
pub mod ledger;
pub mod types;

pub use adapter::{Adapter, AdapterError, AdapterRegistry, FetchedAssertion, Post};
pub use assertion::Opcode;
pub use error::{CryptoError, Error, FormatError, LedgerConflict, ProtocolError};
pub use grant::{GrantPair, Side, VerifiedGrant};
pub use keys::{EphemeralKey, PublicKey};
pub use ledger::{Indices, Ledger, LedgerRecord, LedgerState, RecordKind};
pub use types::{Bid, Pid};

/// Result type for blueskid-core operations
pub type Result<T> = std::result::Result<T, Error>;
