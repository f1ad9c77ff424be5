// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope engine: symmetric key derivation and AES-256-GCM sealing.
//!
//! ## Key Derivation
//!
//! The symmetric key is `SHA-256(X || Y)` over the affine coordinates of the
//! secp256k1 public point, each encoded big-endian with leading zero bytes
//! stripped. A private key is first mapped to its public point, so both
//! halves of one pair reach the same key.
//!
//! This is a self-consistent derivation, not a key exchange: anyone holding
//! only the public key derives the same symmetric key. The behaviour is kept
//! for compatibility with artifacts already in custody.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::error::CryptoError;

/// Length of the SHA-256 plaintext digest prefix.
pub const DIGEST_LEN: usize = 32;

/// Length of the AES-GCM nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Asymmetric key material used only to derive the envelope key.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Full key pair; the public point is recomputed before derivation.
    Private(SecretKey),
    /// Public half only.
    Public(PublicKey),
}

impl KeyMaterial {
    /// The public point of this key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Private(secret) => secret.public_key(),
            KeyMaterial::Public(public) => *public,
        }
    }

    /// Drop the private half, keeping only what derivation needs.
    pub fn to_public(&self) -> KeyMaterial {
        KeyMaterial::Public(self.public_key())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Private(_) => f.write_str("KeyMaterial::Private(..)"),
            KeyMaterial::Public(public) => f
                .debug_tuple("KeyMaterial::Public")
                .field(&public.to_encoded_point(true))
                .finish(),
        }
    }
}

impl From<SecretKey> for KeyMaterial {
    fn from(secret: SecretKey) -> Self {
        KeyMaterial::Private(secret)
    }
}

impl From<PublicKey> for KeyMaterial {
    fn from(public: PublicKey) -> Self {
        KeyMaterial::Public(public)
    }
}

/// A sealed envelope: `digest || nonce || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedArtifact(Vec<u8>);

impl SealedArtifact {
    /// Wrap raw bytes, checking only the minimum length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < DIGEST_LEN + NONCE_LEN {
            return Err(CryptoError::MalformedArtifact {
                expected: DIGEST_LEN + NONCE_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// SHA-256 of the plaintext this envelope was sealed from.
    pub fn digest(&self) -> &[u8] {
        &self.0[..DIGEST_LEN]
    }

    pub fn nonce(&self) -> &[u8] {
        &self.0[DIGEST_LEN..DIGEST_LEN + NONCE_LEN]
    }

    /// AES-GCM ciphertext including the 16-byte tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[DIGEST_LEN + NONCE_LEN..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derive the 32-byte envelope key from either half of a key pair.
pub fn derive_key(key: &KeyMaterial) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let point = key.public_key().to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| CryptoError::InvalidKey("public point has no x coordinate".to_string()))?;
    let y = point
        .y()
        .ok_or_else(|| CryptoError::InvalidKey("public point has no y coordinate".to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(strip_leading_zeros(x));
    hasher.update(strip_leading_zeros(y));

    let mut derived = Zeroizing::new([0u8; 32]);
    derived.copy_from_slice(&hasher.finalize());
    Ok(derived)
}

/// Seal `plaintext` under the key derived from `key`.
pub fn seal(plaintext: &[u8], key: &KeyMaterial) -> Result<SealedArtifact, CryptoError> {
    let digest: [u8; DIGEST_LEN] = Sha256::digest(plaintext).into();
    let derived = derive_key(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    seal_with(plaintext, &digest, &derived, &nonce)
}

/// Open a sealed artifact and verify the plaintext digest.
pub fn open(artifact: &[u8], key: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
    if artifact.len() < DIGEST_LEN + NONCE_LEN {
        return Err(CryptoError::MalformedArtifact {
            expected: DIGEST_LEN + NONCE_LEN,
            actual: artifact.len(),
        });
    }

    let (digest, rest) = artifact.split_at(DIGEST_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| CryptoError::MalformedArtifact {
        expected: DIGEST_LEN + NONCE_LEN,
        actual: artifact.len(),
    })?;

    let derived = derive_key(key)?;
    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*derived));

    let plaintext = cipher
        .decrypt(
            &Nonce::from(nonce),
            Payload {
                msg: ciphertext,
                aad: digest,
            },
        )
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let actual = Sha256::digest(&plaintext);
    if !bool::from(actual[..].ct_eq(digest)) {
        return Err(CryptoError::IntegrityViolation);
    }

    Ok(plaintext)
}

fn seal_with(
    plaintext: &[u8],
    digest: &[u8; DIGEST_LEN],
    derived: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
) -> Result<SealedArtifact, CryptoError> {
    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*derived));

    let ciphertext = cipher
        .encrypt(
            &Nonce::from(*nonce),
            Payload {
                msg: plaintext,
                aad: digest,
            },
        )
        .map_err(|e| CryptoError::Cipher(e.to_string()))?;

    let mut sealed = Vec::with_capacity(DIGEST_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(digest);
    sealed.extend_from_slice(nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(SealedArtifact(sealed))
}

/// Minimal big-endian form: a coordinate of `0x00ab..` hashes as `0xab..`.
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
