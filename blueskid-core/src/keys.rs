//! Key codec for Blueskid assertions
//!
//! Grant/accept pairs are signed with single-use Ed25519 keys. Inside an
//! assertion a public key is written as the standard base64 of its DER
//! SubjectPublicKeyInfo, the encoding other tools already produce for it.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::pkcs8::spki;
use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::{Error, Result};

const PEM_ARMOR: &str = "-----BEGIN";

/// A public key that can verify assertion signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CryptoError> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::MalformedKey("public key must be 32 bytes".into()))?;
        let inner = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Get the raw bytes of this public key
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Encode as base64 of the DER SubjectPublicKeyInfo
    pub fn encode(&self) -> Result<String> {
        let der = self
            .inner
            .to_public_key_der()
            .map_err(|e| Error::Internal(format!("public key encoding failed: {}", e)))?;
        Ok(STANDARD.encode(der.as_bytes()))
    }

    /// Decode the assertion form, or a PEM-armored block of the same key
    pub fn decode(s: &str) -> std::result::Result<Self, CryptoError> {
        let inner = if s.contains(PEM_ARMOR) {
            VerifyingKey::from_public_key_pem(s).map_err(classify)?
        } else {
            let der = STANDARD
                .decode(s.trim())
                .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
            VerifyingKey::from_public_key_der(&der).map_err(classify)?
        };
        Ok(Self { inner })
    }

    /// Verify a signature
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> std::result::Result<(), CryptoError> {
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::SignatureInvalid)?;
        self.inner
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureInvalid)
    }
}

fn classify(err: spki::Error) -> CryptoError {
    match err {
        spki::Error::OidUnknown { oid } => CryptoError::WrongAlgorithm(oid.to_string()),
        other => CryptoError::MalformedKey(other.to_string()),
    }
}

/// Signing key for exactly one grant/accept pair
///
/// Never serialized and never printed; the secret bytes are zeroized when
/// the value is dropped.
pub struct EphemeralKey {
    signing_key: SigningKey,
}

impl EphemeralKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.signing_key.verifying_key(),
        }
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

impl fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
