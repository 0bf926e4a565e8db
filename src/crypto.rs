// src/crypto.rs
//! Passphrase encryption for secret text messages
//!
//! The passphrase is stretched with Argon2id over a random salt, the result
//! is expanded into a message key with HKDF-SHA256, and the text is sealed
//! with AES-256-GCM. Ciphertext is stored on the server, so the stretching
//! cost is what an offline guess of the passphrase has to pay. The wire form is
//! `base64(salt || iv || ciphertext || tag)`, so the server only ever sees an
//! opaque string. A wrong passphrase fails the GCM tag check and never yields
//! plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use log::{error, trace};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors related to cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Error during AES-GCM encryption
    #[error("AES-GCM error: {0}")]
    AesGcmError(String),

    /// The authentication tag did not verify (wrong passphrase or tampering)
    #[error("Integrity check failed")]
    IntegrityError,

    /// Error during KDF derivation
    #[error("KDF error: {0}")]
    KdfError(String),

    /// Ciphertext is not in the expected format
    #[error("Malformed ciphertext: {0}")]
    MalformedError(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInputError(String),
}

/// The size of the AES key in bytes (256 bits)
pub const AES_KEY_SIZE: usize = 32;

/// The size of the IV in bytes for AES-GCM (96 bits)
pub const AES_IV_SIZE: usize = 12;

/// The size of the per-message salt in bytes
pub const SALT_SIZE: usize = 16;

/// The size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

const KDF_INFO: &[u8] = b"chatline message key v1";

/// Argon2id memory cost in KiB
pub const ARGON2_MEMORY_KIB: u32 = 19 * 1024;

/// Argon2id passes over memory
pub const ARGON2_ITERATIONS: u32 = 2;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Stretch `passphrase` with Argon2id
fn stretch_passphrase(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, 1, Some(AES_KEY_SIZE))
        .map_err(|e| CryptoError::KdfError(format!("Invalid Argon2 parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut stretched = Zeroizing::new(vec![0u8; AES_KEY_SIZE]);
    if let Err(e) = argon2.hash_password_into(passphrase.as_bytes(), salt, &mut stretched) {
        error!("Argon2 stretching failed: {}", e);
        return Err(CryptoError::KdfError(format!("Argon2 stretching failed: {}", e)));
    }
    Ok(stretched)
}

/// Derive the message key for `passphrase` and `salt`
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    trace!("Deriving message key with salt {}", hex::encode(salt));

    let stretched = stretch_passphrase(passphrase, salt)?;
    let hk = Hkdf::<Sha256>::new(Some(salt), &stretched);
    let mut okm = Zeroizing::new(vec![0u8; AES_KEY_SIZE]);

    if let Err(e) = hk.expand(KDF_INFO, &mut okm) {
        error!("HKDF expansion failed: {}", e);
        return Err(CryptoError::KdfError(format!("HKDF expansion failed: {}", e)));
    }

    Ok(okm)
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key).map_err(|e| {
        error!("Failed to create AES-GCM cipher: {}", e);
        CryptoError::AesGcmError(format!("Failed to create cipher: {}", e))
    })
}

/// Encrypt `plaintext` with `passphrase`, returning the base64 wire form
pub fn encrypt_text(plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::InvalidInputError("Passphrase is empty".to_string()));
    }

    let salt = random_bytes(SALT_SIZE);
    let iv = random_bytes(AES_IV_SIZE);
    let key = derive_key(passphrase, &salt)?;
    let cipher = cipher_for(&key)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| {
            error!("AES-GCM encryption failed: {}", e);
            CryptoError::AesGcmError(format!("Encryption failed: {}", e))
        })?;

    let mut sealed = Vec::with_capacity(SALT_SIZE + AES_IV_SIZE + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);

    trace!("Sealed {} plaintext bytes into {} bytes", plaintext.len(), sealed.len());
    Ok(BASE64.encode(sealed))
}

/// Decrypt the base64 wire form produced by [`encrypt_text`]
pub fn decrypt_text(sealed: &str, passphrase: &str) -> Result<String, CryptoError> {
    let raw = BASE64
        .decode(sealed.trim())
        .map_err(|e| CryptoError::MalformedError(format!("Invalid base64: {}", e)))?;

    if raw.len() < SALT_SIZE + AES_IV_SIZE + TAG_SIZE {
        return Err(CryptoError::MalformedError(format!(
            "Ciphertext too short: {} bytes",
            raw.len()
        )));
    }

    let (salt, rest) = raw.split_at(SALT_SIZE);
    let (iv, ciphertext) = rest.split_at(AES_IV_SIZE);

    let key = derive_key(passphrase, salt)?;
    let cipher = cipher_for(&key)?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CryptoError::IntegrityError)?,
    );

    String::from_utf8(plaintext.to_vec())
        .map_err(|e| CryptoError::MalformedError(format!("Plaintext is not UTF-8: {}", e)))
}
