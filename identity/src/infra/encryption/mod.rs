//! [`Encryption`]-related implementations.

pub mod key_ring;

use std::{sync::Arc, time::Duration};

use derive_more::{Display, Error};

use crate::domain::Bearer;

pub use self::key_ring::{InvalidKey, Key, KeyRing};

/// Authenticated symmetric encryption of token payloads.
///
/// Implementations must be safe to call concurrently with a rotation of
/// their keys.
pub trait Encryption {
    /// Encrypts the provided `plaintext` with the currently active key,
    /// embedding the current time as its issuance time.
    ///
    /// # Errors
    ///
    /// With [`EncryptError`] if the `plaintext` cannot be encrypted.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Bearer, EncryptError>;

    /// Decrypts the provided [`Bearer`] token with any of the known keys.
    ///
    /// # Errors
    ///
    /// - [`DecryptError::DecryptionFailed`] if no known key authenticates the
    ///   `token`, or the `token` is not an encrypted one at all.
    /// - [`DecryptError::Expired`] if the `token` was issued earlier than
    ///   `max_age` ago.
    fn decrypt(
        &self,
        token: &Bearer,
        max_age: Duration,
    ) -> Result<Vec<u8>, DecryptError>;
}

impl<E: Encryption + ?Sized> Encryption for Arc<E> {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Bearer, EncryptError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(
        &self,
        token: &Bearer,
        max_age: Duration,
    ) -> Result<Vec<u8>, DecryptError> {
        (**self).decrypt(token, max_age)
    }
}

/// Error of [`Encryption::encrypt()`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("Failed to encrypt token payload")]
pub struct EncryptError(#[error(not(source))] aes_gcm::Error);

/// Error of [`Encryption::decrypt()`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum DecryptError {
    /// Token is authentic, but outside of its validity window.
    #[display("Token expired")]
    Expired,

    /// Token is not authenticated by any known key.
    #[display("Token cannot be decrypted")]
    DecryptionFailed,
}
