//! Credential hashing
//!
//! Passwords are stored as the SHA-256 digest of the plaintext concatenated
//! with a deployment-wide salt, rendered as lowercase hex. The digest is
//! deterministic by design so the same credentials verify on every device.
//!
//! # Security
//!
//! This scheme is intentionally weak: the salt is a single source-embedded
//! constant rather than a per-user random value, so two accounts with the
//! same password share a digest, and there is no work factor to slow down
//! brute force. It reproduces the behavior of the deployed demo site and
//! must not be used to protect real credentials.

use sha2::{Digest, Sha256};

/// Deployment-wide salt appended to every plaintext before hashing.
pub const DEFAULT_SALT: &str = "GymdexStaticSalt2024";

/// One-way transform of a plaintext password into a storable digest.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    salt: String,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_SALT)
    }
}

impl CredentialHasher {
    /// Create a hasher with an explicit salt. Deployments that override the
    /// salt must keep it stable, or existing digests stop verifying.
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Hash a plaintext password into a 64-character lowercase hex digest.
    ///
    /// Deterministic: the same plaintext always yields the same digest for a
    /// given salt. Infallible; the hashing primitive has no failure mode.
    pub fn digest(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Constant-shape comparison of a plaintext against a stored digest.
    pub fn verify(&self, plaintext: &str, stored_digest: &str) -> bool {
        self.digest(plaintext) == stored_digest
    }
}
