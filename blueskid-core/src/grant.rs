//! Grant/accept assertion pairs
//!
//! A BID owner hands a BID to another PID by posting a grant assertion while
//! the recipient posts the matching accept assertion. Both halves are signed
//! by the same single-use key, over nonces that share a timestamp and differ
//! only in their `.G`/`.A` suffix, and each half names the PID that must have
//! posted the other half.
//!
//! Claim and unclaim assertions carry no signature; the only evidence behind
//! them is the authorship of the post they were found in.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{SecondsFormat, Utc};

use crate::assertion::{self, Opcode, SIGNED_FIELDS, UNSIGNED_FIELDS};
use crate::error::{FormatError, ProtocolError};
use crate::{Bid, EphemeralKey, Pid, PublicKey, Result};

/// Which half of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Grant,
    Accept,
}

impl Side {
    pub fn opcode(self) -> Opcode {
        match self {
            Side::Grant => Opcode::Grant,
            Side::Accept => Opcode::Accept,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Grant => f.write_str("grant"),
            Side::Accept => f.write_str("accept"),
        }
    }
}

/// Assertion text for both halves of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPair {
    pub grant: String,
    pub accept: String,
}

/// Outcome of a successful pair verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedGrant {
    /// The BID both halves agree on
    pub bid: Bid,
    /// The key that signed both halves, recorded so it is never accepted again
    pub key: PublicKey,
}

/// One grant or accept assertion whose signature checked out
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    pub opcode: Opcode,
    pub bid: Bid,
    pub nonce: String,
    pub key: PublicKey,
    pub counterparty: String,
}

/// Generate the grant and accept assertions transferring `bid` from
/// `granter` to `accepter`
pub fn generate_pair(bid: Bid, granter: &Pid, accepter: &Pid) -> Result<GrantPair> {
    let key = EphemeralKey::generate();
    let public = key.public_key().encode()?;
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let bid_hex = bid.to_hex();

    let grant = sign_half(&key, Opcode::Grant, &bid_hex, &timestamp, &public, accepter);
    let accept = sign_half(&key, Opcode::Accept, &bid_hex, &timestamp, &public, granter);

    tracing::debug!(%bid, %granter, %accepter, "generated grant/accept pair");
    Ok(GrantPair { grant, accept })
}

fn sign_half(
    key: &EphemeralKey,
    opcode: Opcode,
    bid_hex: &str,
    timestamp: &str,
    public: &str,
    counterparty: &Pid,
) -> String {
    let nonce = format!("{}{}", timestamp, opcode.nonce_suffix().unwrap_or_default());
    let signature = STANDARD.encode(key.sign(nonce.as_bytes()));
    assertion::serialize(&[
        opcode.as_str(),
        bid_hex,
        &nonce,
        public,
        &signature,
        counterparty.as_str(),
    ])
}

/// Validate one grant or accept assertion on its own
pub fn check_single(fields: &[String]) -> Result<SignedAssertion> {
    if fields.len() != SIGNED_FIELDS {
        return Err(FormatError::FieldCountMismatch {
            expected: SIGNED_FIELDS,
            found: fields.len(),
        }
        .into());
    }

    let opcode = match Opcode::from_field(&fields[assertion::OPCODE]) {
        Some(op @ (Opcode::Grant | Opcode::Accept)) => op,
        _ => {
            return Err(FormatError::InvalidOpcode {
                expected: "G or A",
                found: fields[assertion::OPCODE].clone(),
            }
            .into())
        }
    };

    let bid = Bid::parse_hex(&fields[assertion::BID])?;

    let nonce = &fields[assertion::NONCE];
    let suffix = if nonce.ends_with(".G") {
        Opcode::Grant
    } else if nonce.ends_with(".A") {
        Opcode::Accept
    } else {
        return Err(FormatError::NonceSuffixUnrecognized(nonce.clone()).into());
    };
    if suffix != opcode {
        return Err(FormatError::NonceSuffixMismatch {
            opcode: opcode.as_str(),
            suffix: suffix.nonce_suffix().unwrap_or_default(),
        }
        .into());
    }

    let key = PublicKey::decode(&fields[assertion::KEY])?;

    let signature = STANDARD
        .decode(&fields[assertion::SIGNATURE])
        .map_err(|e| FormatError::InvalidBase64(e.to_string()))?;
    key.verify(nonce.as_bytes(), &signature)?;

    Ok(SignedAssertion {
        opcode,
        bid,
        nonce: nonce.clone(),
        key,
        counterparty: fields[assertion::COUNTERPARTY].clone(),
    })
}

fn check_side(fields: &[String], side: Side) -> Result<SignedAssertion> {
    let checked = check_single(fields).map_err(|e| {
        tracing::debug!(%side, error = %e, "invalid assertion");
        e
    })?;
    if checked.opcode != side.opcode() {
        return Err(ProtocolError::RoleMismatch {
            side,
            found: checked.opcode.as_str(),
        }
        .into());
    }
    Ok(checked)
}

/// Verify a grant/accept pair against the PIDs that posted each half
///
/// Has no effect on the ledger; recording the transfer is a separate step.
pub fn verify_pair(
    grant_fields: &[String],
    grant_poster: &Pid,
    accept_fields: &[String],
    accept_poster: &Pid,
) -> Result<VerifiedGrant> {
    let grant = check_side(grant_fields, Side::Grant)?;
    let accept = check_side(accept_fields, Side::Accept)?;

    if grant.key != accept.key {
        return Err(ProtocolError::KeyMismatch.into());
    }
    if grant.nonce == accept.nonce {
        return Err(ProtocolError::NonceReuse.into());
    }
    if grant.bid != accept.bid {
        return Err(ProtocolError::BidMismatch {
            grant: grant.bid,
            accept: accept.bid,
        }
        .into());
    }
    if *grant_poster != *accept.counterparty {
        return Err(ProtocolError::CounterpartyMismatch {
            side: Side::Accept,
            expected: grant_poster.to_string(),
            actual: accept.counterparty,
        }
        .into());
    }
    if *accept_poster != *grant.counterparty {
        return Err(ProtocolError::CounterpartyMismatch {
            side: Side::Grant,
            expected: accept_poster.to_string(),
            actual: grant.counterparty,
        }
        .into());
    }

    Ok(VerifiedGrant {
        bid: grant.bid,
        key: grant.key,
    })
}

/// Locate both assertions in their carrier texts, then [`verify_pair`]
pub fn verify_texts(
    grant_text: &str,
    grant_poster: &Pid,
    accept_text: &str,
    accept_poster: &Pid,
) -> Result<VerifiedGrant> {
    let grant_fields = assertion::locate(grant_text, SIGNED_FIELDS)?;
    let accept_fields = assertion::locate(accept_text, SIGNED_FIELDS)?;
    verify_pair(&grant_fields, grant_poster, &accept_fields, accept_poster)
}

/// Claim assertion text for `bid`
pub fn build_claim(bid: Bid) -> String {
    assertion::serialize(&[Opcode::Claim.as_str(), &bid.to_hex()])
}

/// Unclaim assertion text for `bid`
pub fn build_unclaim(bid: Bid) -> String {
    assertion::serialize(&[Opcode::Unclaim.as_str(), &bid.to_hex()])
}

/// Check a located claim or unclaim assertion and return its BID
pub fn check_bid_assertion(fields: &[String], expected: Opcode) -> Result<Bid> {
    if fields.len() != UNSIGNED_FIELDS {
        return Err(FormatError::FieldCountMismatch {
            expected: UNSIGNED_FIELDS,
            found: fields.len(),
        }
        .into());
    }
    if fields[assertion::OPCODE] != expected.as_str() {
        return Err(FormatError::InvalidOpcode {
            expected: expected.as_str(),
            found: fields[assertion::OPCODE].clone(),
        }
        .into());
    }
    Ok(Bid::parse_hex(&fields[assertion::BID])?)
}
