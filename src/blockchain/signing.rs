// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial key handling and detached artifact signatures.
//!
//! The custodial key is a secp256k1 key, the same curve and hash the ledger
//! uses for account addresses, so a signature over `keccak256(artifact)` can
//! be checked on-chain with `ecrecover`.

use std::fmt;

use alloy::{
    network::EthereumWallet,
    primitives::{keccak256, Address, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use k256::SecretKey;
use rand::rngs::OsRng;

use crate::tee::{CryptoError, KeyMaterial};

/// The service's custodial secp256k1 key.
///
/// Used for the envelope key derivation, artifact signatures and ledger
/// transactions.
#[derive(Clone)]
pub struct CustodyKey {
    secret: SecretKey,
    signer: PrivateKeySigner,
}

impl CustodyKey {
    /// Build from raw secret key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret =
            SecretKey::from_slice(bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_secret(secret)
    }

    /// Parse a hex private key, with or without `0x` prefix.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, CryptoError> {
        let trimmed = private_key_hex.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let key_bytes = alloy::hex::decode(stripped)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid hex: {e}")))?;
        Self::from_bytes(&key_bytes)
    }

    /// Parse a PEM private key (SEC1 or PKCS#8).
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let pem_str = std::str::from_utf8(pem_bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid UTF-8: {e}")))?;

        let pem = pem::parse(pem_str)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid PEM: {e}")))?;

        let secret = SecretKey::from_sec1_der(pem.contents())
            .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
            .map_err(|e| CryptoError::InvalidKey(format!("invalid key format: {e}")))?;

        Self::from_secret(secret)
    }

    /// Fresh random key.
    pub fn random() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let signer = PrivateKeySigner::from_signing_key(secret.clone().into());
        Self { secret, signer }
    }

    fn from_secret(secret: SecretKey) -> Result<Self, CryptoError> {
        let signer = PrivateKeySigner::from_slice(&secret.to_bytes()[..])
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { secret, signer })
    }

    /// Ledger account address of this key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Key material for the envelope engine.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial::Private(self.secret.clone())
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Wallet for the transaction-signing provider.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for CustodyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodyKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Content hash and recoverable signature over a sealed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSignature {
    /// `keccak256` of the full sealed artifact.
    pub content_hash: B256,
    pub signature: Signature,
}

impl ArtifactSignature {
    /// 65-byte `r || s || v` encoding.
    pub fn signature_bytes(&self) -> [u8; 65] {
        self.signature.as_bytes()
    }

    /// Recover the signing address.
    pub fn recover_signer(&self) -> Result<Address, CryptoError> {
        self.signature
            .recover_address_from_prehash(&self.content_hash)
            .map_err(|e| CryptoError::SigningFailure(e.to_string()))
    }
}

/// Hash a sealed artifact with keccak256 and sign the hash.
pub fn sign_artifact(artifact: &[u8], key: &CustodyKey) -> Result<ArtifactSignature, CryptoError> {
    let content_hash = keccak256(artifact);
    let signature = key
        .signer()
        .sign_hash_sync(&content_hash)
        .map_err(|e| CryptoError::SigningFailure(e.to_string()))?;

    Ok(ArtifactSignature {
        content_hash,
        signature,
    })
}
