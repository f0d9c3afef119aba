//! Assertion text codec
//!
//! An assertion travels inside arbitrary carrier text, usually the body of a
//! social post, as
//!
//! ```text
//! 🥁field🎸field🎸…🎸field🥁
//! ```
//!
//! The marker and separator symbols, the field order and the opcodes are a
//! fixed wire contract: assertions already sitting in third-party posts must
//! keep parsing.

use crate::error::FormatError;

/// Begin/end marker
pub const MARKER: &str = "🥁";

/// Field separator
pub const SEPARATOR: &str = "🎸";

// Field positions
pub const OPCODE: usize = 0;
pub const BID: usize = 1;
pub const NONCE: usize = 2;
pub const KEY: usize = 3;
pub const SIGNATURE: usize = 4;
pub const COUNTERPARTY: usize = 5;

/// Field count of claim/unclaim assertions
pub const UNSIGNED_FIELDS: usize = 2;

/// Field count of grant/accept assertions
pub const SIGNED_FIELDS: usize = 6;

/// First field of every assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Claim,
    Unclaim,
    Grant,
    Accept,
}

impl Opcode {
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Claim => "C",
            Opcode::Unclaim => "U",
            Opcode::Grant => "G",
            Opcode::Accept => "A",
        }
    }

    pub fn from_field(s: &str) -> Option<Self> {
        match s {
            "C" => Some(Opcode::Claim),
            "U" => Some(Opcode::Unclaim),
            "G" => Some(Opcode::Grant),
            "A" => Some(Opcode::Accept),
            _ => None,
        }
    }

    /// Suffix a signed assertion's nonce must carry
    pub fn nonce_suffix(self) -> Option<&'static str> {
        match self {
            Opcode::Grant => Some(".G"),
            Opcode::Accept => Some(".A"),
            Opcode::Claim | Opcode::Unclaim => None,
        }
    }
}

/// Find the assertion in `text` and split it into `expected_fields` fields
///
/// The marker must occur exactly twice. Surplus separators end up inside the
/// last field, which is where a PID containing the separator would sit.
pub fn locate(text: &str, expected_fields: usize) -> Result<Vec<String>, FormatError> {
    let markers = text.matches(MARKER).count();
    if markers != 2 {
        return Err(FormatError::NotFound { markers });
    }

    let inner = text
        .split(MARKER)
        .nth(1)
        .ok_or(FormatError::NotFound { markers })?;

    let fields: Vec<String> = inner
        .splitn(expected_fields, SEPARATOR)
        .map(str::to_string)
        .collect();
    if fields.len() != expected_fields {
        return Err(FormatError::FieldCountMismatch {
            expected: expected_fields,
            found: fields.len(),
        });
    }
    Ok(fields)
}

/// Wrap fields into assertion text; contents are not validated here
pub fn serialize<S: AsRef<str>>(fields: &[S]) -> String {
    let joined = fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    format!("{}{}{}", MARKER, joined, MARKER)
}
