//! Identity token core: issuing, encrypting, validating and projecting bearer
//! tokens of the platform.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod config;
pub mod domain;
pub mod infra;

use std::time::Duration;

use derive_more::{Display, Error, From};
use tracing as log;

#[cfg(test)]
use tokio as _;

use crate::{
    domain::{token, AmbiguousScope, AuthToken, Bearer},
    infra::{
        encryption::{DecryptError, EncryptError},
        Encryption,
    },
};
#[cfg(doc)]
use crate::infra::Directory;

pub use self::command::Command;

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Lifetime of an issued [`Bearer`] token.
    ///
    /// [`Encryption`] rejects tokens issued earlier than this ago.
    pub token_expiration: Duration,
}

/// Identity token service.
#[derive(Clone, Debug)]
pub struct Service<Dir, Enc> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Directory`] of this [`Service`].
    directory: Dir,

    /// [`Encryption`] of this [`Service`].
    encryption: Enc,
}

impl<Dir, Enc> Service<Dir, Enc> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, directory: Dir, encryption: Enc) -> Self {
        Self {
            config,
            directory,
            encryption,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Directory`] of this [`Service`].
    #[must_use]
    pub fn directory(&self) -> &Dir {
        &self.directory
    }

    /// Returns [`Encryption`] of this [`Service`].
    #[must_use]
    pub fn encryption(&self) -> &Enc {
        &self.encryption
    }
}

impl<Dir, Enc: Encryption> Service<Dir, Enc> {
    /// Encodes and encrypts the provided [`AuthToken`] into a [`Bearer`]
    /// token.
    ///
    /// # Errors
    ///
    /// - [`SealError::AmbiguousScope`] if the [`AuthToken`] is scoped to both
    ///   a project and a domain. Nothing is encrypted then.
    /// - [`SealError::Encrypt`] if [`Encryption`] fails.
    pub fn seal(&self, auth: &AuthToken) -> Result<Bearer, SealError> {
        let payload = token::encode(auth)?;
        Ok(self.encryption.encrypt(&payload)?)
    }

    /// Decrypts and decodes the provided [`Bearer`] token into an
    /// [`AuthToken`].
    ///
    /// # Errors
    ///
    /// - [`OpenError::Expired`] if the [`Bearer`] token is authentic, but was
    ///   issued longer than [`Config::token_expiration`] ago.
    /// - [`OpenError::InvalidToken`] otherwise. The exact reason is logged
    ///   only.
    pub fn open(&self, bearer: &Bearer) -> Result<AuthToken, OpenError> {
        use OpenError as E;

        let payload = self
            .encryption
            .decrypt(bearer, self.config.token_expiration)
            .map_err(|e| match e {
                DecryptError::Expired => {
                    log::info!("presented token is expired");
                    E::Expired
                }
                DecryptError::DecryptionFailed => {
                    log::warn!(
                        "presented token is not authenticated by any known \
                         key, possibly tampered with",
                    );
                    E::InvalidToken
                }
            })?;
        token::decode(&payload).map_err(|_| E::InvalidToken)
    }
}

/// Error of [`Service::seal()`].
#[derive(Clone, Copy, Debug, Display, Error, From)]
pub enum SealError {
    /// [`AuthToken`] scope is ambiguous.
    #[display("Cannot seal token: {_0}")]
    AmbiguousScope(AmbiguousScope),

    /// [`Encryption`] failed.
    #[display("Cannot seal token: {_0}")]
    Encrypt(EncryptError),
}

/// Error of [`Service::open()`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum OpenError {
    /// Token is authentic, but expired.
    #[display("Token expired")]
    Expired,

    /// Token is not issued by this [`Service`].
    #[display("Invalid token")]
    InvalidToken,
}
