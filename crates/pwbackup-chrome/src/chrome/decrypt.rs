//! Password decryption for login rows.
//!
//! A decryption context is opened once per batch and closed when the batch
//! is done, whether or not every row decrypted. [`DecryptSession`] ties the
//! close to scope exit.

use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use hmac::Hmac;
use log::debug;
use pbkdf2::pbkdf2;
use sha1::Sha1;

use pwbackup_core::{BackupError, BackupErrorKind, BackupResult};

/// The operating system facility that protects stored passwords.
pub trait SecretDecryptor {
    type Context;

    fn open(&self) -> BackupResult<Self::Context>;

    fn decrypt(&self, ctx: &mut Self::Context, blob: &[u8]) -> BackupResult<String>;

    fn close(&self, ctx: Self::Context);
}

/// An open decryption context; closed on drop.
pub struct DecryptSession<'a, D: SecretDecryptor + ?Sized> {
    decryptor: &'a D,
    ctx: Option<D::Context>,
}

impl<'a, D: SecretDecryptor + ?Sized> DecryptSession<'a, D> {
    pub fn open(decryptor: &'a D) -> BackupResult<Self> {
        let ctx = decryptor.open()?;
        Ok(Self { decryptor, ctx: Some(ctx) })
    }

    pub fn decrypt(&mut self, blob: &[u8]) -> BackupResult<String> {
        match self.ctx.as_mut() {
            Some(ctx) => self.decryptor.decrypt(ctx, blob),
            None => Err(decryption_failed("decryption context is closed")),
        }
    }
}

impl<D: SecretDecryptor + ?Sized> Drop for DecryptSession<'_, D> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.decryptor.close(ctx);
        }
    }
}

fn decryption_failed(message: impl Into<String>) -> BackupError {
    BackupError::new(BackupErrorKind::DecryptionFailed, message)
}

const SALT: &[u8] = b"saltysalt";
const IV: [u8; 16] = [b' '; 16];
const DEFAULT_PASSWORD: &str = "peanuts";

/// Chromium's Linux scheme: `v10`/`v11` prefix, AES-128-CBC with a key
/// derived by PBKDF2-HMAC-SHA1 from the keyring password.
#[derive(Debug, Clone)]
pub struct LinuxV10Decryptor {
    password: String,
}

impl Default for LinuxV10Decryptor {
    fn default() -> Self {
        Self::with_password(DEFAULT_PASSWORD)
    }
}

impl LinuxV10Decryptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the password stored in the desktop keyring instead of the
    /// built-in one.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self { password: password.into() }
    }

    pub fn derive_key(password: &str) -> BackupResult<[u8; 16]> {
        let mut key = [0u8; 16];
        pbkdf2::<Hmac<Sha1>>(password.as_bytes(), SALT, 1, &mut key)
            .map_err(|e| decryption_failed(format!("key derivation failed: {e}")))?;
        Ok(key)
    }
}

impl SecretDecryptor for LinuxV10Decryptor {
    /// The derived AES key.
    type Context = [u8; 16];

    fn open(&self) -> BackupResult<[u8; 16]> {
        let key = Self::derive_key(&self.password)?;
        debug!("password decryptor ready");
        Ok(key)
    }

    fn decrypt(&self, key: &mut [u8; 16], blob: &[u8]) -> BackupResult<String> {
        if blob.is_empty() {
            return Ok(String::new());
        }
        let ciphertext = blob
            .strip_prefix(b"v10")
            .or_else(|| blob.strip_prefix(b"v11"))
            .ok_or_else(|| decryption_failed("unrecognised password encryption prefix"))?;

        let mut buf = ciphertext.to_vec();
        let plaintext = cbc::Decryptor::<Aes128>::new_from_slices(&key[..], &IV)
            .map_err(|e| decryption_failed(format!("Failed to init AES-CBC: {e}")))?
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .map_err(|e| decryption_failed(format!("AES-CBC decryption failed: {e}")))?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| decryption_failed("decrypted password is not UTF-8"))
    }

    fn close(&self, mut key: [u8; 16]) {
        key.fill(0);
        debug!("password decryptor closed");
    }
}
