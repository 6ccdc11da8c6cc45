//! [`KeyRing`] implementation of [`Encryption`].
//!
//! Every token is a single frame, URL-safe base64 encoded without padding:
//!
//! | Field        | Size     | Contents                                  |
//! |--------------|----------|-------------------------------------------|
//! | version      | 1        | [`VERSION`]                               |
//! | issued at    | 8        | Unix timestamp in seconds, big-endian     |
//! | nonce        | 12       | random                                    |
//! | ciphertext   | variable | AES-256-GCM of the plaintext with its tag |
//!
//! Version and issuance time are authenticated as associated data.

use std::{sync::Arc, time::Duration};

use aes_gcm::{
    aead::{self, rand_core::RngCore as _, Aead as _, KeyInit as _, OsRng},
    Aes256Gcm, Nonce,
};
use arc_swap::ArcSwap;
use base64::{
    alphabet,
    engine::{
        general_purpose::{NO_PAD, URL_SAFE_NO_PAD},
        DecodePaddingMode, GeneralPurpose,
    },
    Engine as _,
};
use common::DateTime;
use derive_more::{Debug, Display, Error};
use secrecy::{ExposeSecret as _, SecretBox};
use tracing as log;

use crate::domain::Bearer;

use super::{DecryptError, EncryptError, Encryption};

/// Version marker of a token frame.
pub const VERSION: u8 = 0x80;

/// Length of a [`Key`] in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the authenticated frame header.
const HEADER_LEN: usize = 1 + 8;

/// Length of an AES-GCM nonce.
const NONCE_LEN: usize = 12;

/// Length of an AES-GCM authentication tag.
const TAG_LEN: usize = 16;

/// Base64 engine accepting URL-safe [`Key`]s either padded or not.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Secret AES-256 key.
#[derive(Debug)]
pub struct Key(SecretBox<[u8; KEY_LEN]>);

impl Key {
    /// Generates a new random [`Key`].
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Box::new([0; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(SecretBox::new(bytes))
    }

    /// Creates a [`Key`] out of its raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(SecretBox::new(Box::new(bytes)))
    }

    /// Decodes a [`Key`] from its URL-safe base64 form.
    ///
    /// # Errors
    ///
    /// With [`InvalidKey`] if the `encoded` string is not a base64 encoded
    /// [`KEY_LEN`] bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, InvalidKey> {
        KEY_ENGINE
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| <[u8; KEY_LEN]>::try_from(bytes).ok())
            .map(Self::from_bytes)
            .ok_or(InvalidKey)
    }

    /// Creates a new [`Aes256Gcm`] cipher with this [`Key`].
    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(
            self.0.expose_secret(),
        ))
    }
}

/// Provided string is not a valid [`Key`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("Key must be URL-safe base64 encoded {KEY_LEN} bytes")]
pub struct InvalidKey;

/// Snapshot of [`Key`]s used by a [`KeyRing`].
#[derive(Debug)]
struct Keys {
    /// [`Key`] encrypting new tokens.
    primary: Arc<Key>,

    /// Former [`Key`]s still accepted for decryption, most recent first.
    secondary: Vec<Arc<Key>>,
}

impl Keys {
    /// Iterates over all the [`Key`]s, the primary one first.
    fn iter(&self) -> impl Iterator<Item = &Key> {
        std::iter::once(&*self.primary)
            .chain(self.secondary.iter().map(|k| &**k))
    }
}

/// Rotatable set of [`Key`]s: the primary one encrypts, every one decrypts.
///
/// [`KeyRing::rotate()`] atomically swaps the whole set, so a decryption in
/// progress always sees a consistent snapshot.
#[derive(Debug)]
pub struct KeyRing {
    /// Current snapshot of [`Key`]s.
    keys: ArcSwap<Keys>,

    /// Maximum number of [`Key`]s kept.
    max_keys: usize,

    /// How far in the future an issuance time is tolerated.
    clock_skew: Duration,
}

impl KeyRing {
    /// Default maximum number of [`Key`]s kept by a [`KeyRing`].
    pub const DEFAULT_MAX_KEYS: usize = 3;

    /// Default tolerated clock skew between [`KeyRing`]s sharing [`Key`]s.
    pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

    /// Creates a new [`KeyRing`] with the provided primary [`Key`] only.
    #[must_use]
    pub fn new(primary: Key) -> Self {
        Self {
            keys: ArcSwap::from_pointee(Keys {
                primary: Arc::new(primary),
                secondary: vec![],
            }),
            max_keys: Self::DEFAULT_MAX_KEYS,
            clock_skew: Self::DEFAULT_CLOCK_SKEW,
        }
    }

    /// Adds the provided decryption-only [`Key`]s to this [`KeyRing`].
    ///
    /// [`Key`]s exceeding the [`KeyRing`] capacity are dropped.
    #[must_use]
    pub fn with_secondary(self, keys: impl IntoIterator<Item = Key>) -> Self {
        let current = self.keys.load_full();
        let secondary = current
            .secondary
            .iter()
            .cloned()
            .chain(keys.into_iter().map(Arc::new))
            .take(self.max_keys - 1)
            .collect();
        self.keys.store(Arc::new(Keys {
            primary: Arc::clone(&current.primary),
            secondary,
        }));
        self
    }

    /// Sets the maximum number of [`Key`]s kept, at least one.
    ///
    /// The oldest [`Key`]s exceeding it are dropped.
    #[must_use]
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        let current = self.keys.load_full();
        if current.secondary.len() >= self.max_keys {
            self.keys.store(Arc::new(Keys {
                primary: Arc::clone(&current.primary),
                secondary: current.secondary[..self.max_keys - 1].to_vec(),
            }));
        }
        self
    }

    /// Sets the tolerated clock skew.
    #[must_use]
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Returns the number of [`Key`]s in this [`KeyRing`].
    #[must_use]
    pub fn key_count(&self) -> usize {
        1 + self.keys.load().secondary.len()
    }

    /// Makes the provided [`Key`] the primary one.
    ///
    /// The former primary [`Key`] stays accepted for decryption, while the
    /// oldest one is dropped once the capacity is exceeded.
    pub fn rotate(&self, primary: Key) {
        let primary = Arc::new(primary);
        _ = self.keys.rcu(|current| Keys {
            primary: Arc::clone(&primary),
            secondary: std::iter::once(&current.primary)
                .chain(&current.secondary)
                .take(self.max_keys - 1)
                .cloned()
                .collect(),
        });
        log::debug!("`KeyRing` rotated, {} keys in use", self.key_count());
    }

    /// Encrypts the `plaintext` as issued at the provided [`DateTime`].
    ///
    /// # Errors
    ///
    /// See [`Encryption::encrypt()`].
    pub fn encrypt_at(
        &self,
        plaintext: &[u8],
        now: DateTime,
    ) -> Result<Bearer, EncryptError> {
        let mut nonce = [0; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut frame = Vec::with_capacity(
            HEADER_LEN + NONCE_LEN + plaintext.len() + TAG_LEN,
        );
        frame.push(VERSION);
        frame.extend_from_slice(&now.unix_timestamp().to_be_bytes());

        let ciphertext = self
            .keys
            .load()
            .primary
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce),
                aead::Payload {
                    msg: plaintext,
                    aad: &frame,
                },
            )
            .map_err(EncryptError)?;
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(frame).into())
    }

    /// Decrypts the [`Bearer`] token, checking its age at the provided
    /// [`DateTime`].
    ///
    /// # Errors
    ///
    /// See [`Encryption::decrypt()`]. Additionally, with
    /// [`DecryptError::DecryptionFailed`] if the `token` is issued further in
    /// the future than the tolerated clock skew.
    pub fn decrypt_at(
        &self,
        token: &Bearer,
        max_age: Duration,
        now: DateTime,
    ) -> Result<Vec<u8>, DecryptError> {
        use DecryptError as E;

        let frame = URL_SAFE_NO_PAD
            .decode(token.as_str())
            .map_err(|_| E::DecryptionFailed)?;
        if frame.len() < HEADER_LEN + NONCE_LEN + TAG_LEN
            || frame[0] != VERSION
        {
            return Err(E::DecryptionFailed);
        }
        let (header, rest) = frame.split_at(HEADER_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let keys = self.keys.load();
        let plaintext = keys
            .iter()
            .find_map(|key| {
                key.cipher()
                    .decrypt(
                        Nonce::from_slice(nonce),
                        aead::Payload {
                            msg: ciphertext,
                            aad: header,
                        },
                    )
                    .ok()
            })
            .ok_or(E::DecryptionFailed)?;

        let mut issued_at = [0; 8];
        issued_at.copy_from_slice(&header[1..]);
        let age = i128::from(now.unix_timestamp())
            - i128::from(i64::from_be_bytes(issued_at));
        if age > i128::from(max_age.as_secs()) {
            return Err(E::Expired);
        }
        if -age > i128::from(self.clock_skew.as_secs()) {
            return Err(E::DecryptionFailed);
        }

        Ok(plaintext)
    }
}

impl Encryption for KeyRing {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Bearer, EncryptError> {
        self.encrypt_at(plaintext, DateTime::now())
    }

    fn decrypt(
        &self,
        token: &Bearer,
        max_age: Duration,
    ) -> Result<Vec<u8>, DecryptError> {
        self.decrypt_at(token, max_age, DateTime::now())
    }
}
