//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use smart_default::SmartDefault;

use crate::infra::{
    encryption::{InvalidKey, Key},
    KeyRing,
};

/// Identity configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Token configuration.
    #[serde(default)]
    pub token: Token,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Token configuration.
#[derive(Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Token {
    /// Lifetime of an issued token.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub expiration: time::Duration,

    /// URL-safe base64 encoded encryption keys.
    ///
    /// The first one encrypts new tokens, all of them decrypt.
    pub keys: Vec<String>,

    /// Maximum number of keys kept on rotation.
    #[default(KeyRing::DEFAULT_MAX_KEYS)]
    pub max_keys: usize,

    /// How far in the future an issuance time of a token is tolerated.
    #[default(KeyRing::DEFAULT_CLOCK_SKEW)]
    #[serde(with = "humantime_serde")]
    pub clock_skew: time::Duration,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("expiration", &self.expiration)
            .field("keys", &format_args!("[{} hidden]", self.keys.len()))
            .field("max_keys", &self.max_keys)
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

impl From<&Token> for crate::Config {
    fn from(value: &Token) -> Self {
        Self {
            token_expiration: value.expiration,
        }
    }
}

impl TryFrom<&Token> for KeyRing {
    type Error = KeysError;

    fn try_from(value: &Token) -> Result<Self, Self::Error> {
        let mut keys = value
            .keys
            .iter()
            .map(|k| Key::from_base64(k))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let primary = keys.next().ok_or(KeysError::Missing)?;

        Ok(Self::new(primary)
            .with_max_keys(value.max_keys)
            .with_clock_skew(value.clock_skew)
            .with_secondary(keys))
    }
}

/// Error of building a [`KeyRing`] out of a [`Token`] configuration.
#[derive(Clone, Copy, Debug, Display, Error, From)]
pub enum KeysError {
    /// No keys are configured.
    #[from(ignore)]
    #[display("At least one `token.keys` entry is required")]
    Missing,

    /// Configured key is malformed.
    #[display("Invalid `token.keys` entry: {_0}")]
    Invalid(InvalidKey),
}
