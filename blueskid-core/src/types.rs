//! Identifier types
//!
//! A BID is an opaque 64-bit number chosen by whoever claims it. A PID is a
//! platform-qualified identity such as `twitter.com@alice`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Blueskid identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bid(u64);

impl Bid {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Unpadded uppercase hex, the form written into assertions
    pub fn to_hex(self) -> String {
        format!("{:X}", self.0)
    }

    /// Parse hex digits of either case; no sign, no `0x`, at most 64 bits
    pub fn parse_hex(s: &str) -> Result<Self, FormatError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FormatError::InvalidBid(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| FormatError::InvalidBid(s.to_string()))
    }
}

impl From<u64> for Bid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Zero-padded to 16 digits, the ledger's canonical form
impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for Bid {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for Bid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Bid::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Platform identity, `<platform-domain>@<handle>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Pid(String);

impl Pid {
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let valid = match s.split_once('@') {
            Some((platform, handle)) => {
                !platform.is_empty()
                    && !handle.is_empty()
                    && !s.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(FormatError::InvalidPid(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn from_parts(platform: &str, handle: &str) -> Result<Self, FormatError> {
        Self::parse(&format!("{}@{}", platform, handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn platform(&self) -> &str {
        self.0.split_once('@').map(|(p, _)| p).unwrap_or_default()
    }

    pub fn handle(&self) -> &str {
        self.0.split_once('@').map(|(_, h)| h).unwrap_or_default()
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pid {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Pid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Pid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<'de> Deserialize<'de> for Pid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pid::parse(&s).map_err(serde::de::Error::custom)
    }
}
