//! [`AuditId`] definitions.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use derive_more::Deref;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Length of an [`AuditId`] in bytes.
pub const AUDIT_ID_LEN: usize = 16;

/// Identifier linking a token to the login it originates from.
///
/// Externally represented as URL-safe base64 without padding.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct AuditId([u8; AUDIT_ID_LEN]);

impl AuditId {
    /// Creates a new random [`AuditId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Creates an [`AuditId`] from its raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; AUDIT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this [`AuditId`].
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; AUDIT_ID_LEN] {
        &self.0
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuditId({self})")
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl FromStr for AuditId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        URL_SAFE_NO_PAD
            .decode(s)
            .ok()
            .and_then(|bytes| <[u8; AUDIT_ID_LEN]>::try_from(bytes).ok())
            .map(Self)
            .ok_or("invalid `AuditId`")
    }
}

impl Serialize for AuditId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered, append-only sequence of [`AuditId`]s.
///
/// The first [`AuditId`] identifies the login chain, every following one is
/// appended by a re-scope of the token. Never empty.
#[derive(Clone, Debug, Deref, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuditTrail(Vec<AuditId>);

impl AuditTrail {
    /// Maximum number of [`AuditId`]s in an [`AuditTrail`].
    pub const MAX: usize = 16;

    /// Starts a new [`AuditTrail`] of a fresh login chain.
    #[must_use]
    pub fn new() -> Self {
        Self(vec![AuditId::new()])
    }

    /// Creates an [`AuditTrail`] from the provided [`AuditId`]s.
    ///
    /// [`None`] is returned if there are no `ids` or more than [`MAX`] ones.
    ///
    /// [`MAX`]: Self::MAX
    #[must_use]
    pub fn from_ids(ids: Vec<AuditId>) -> Option<Self> {
        (1..=Self::MAX).contains(&ids.len()).then_some(Self(ids))
    }

    /// Returns the [`AuditId`] of the login chain.
    #[expect(clippy::missing_panics_doc, reason = "never empty")]
    #[must_use]
    pub fn origin(&self) -> AuditId {
        *self.0.first().expect("`AuditTrail` is never empty")
    }

    /// Returns a new [`AuditTrail`] with a fresh [`AuditId`] appended.
    ///
    /// [`None`] is returned if this [`AuditTrail`] is already full.
    #[must_use]
    pub fn extended(&self) -> Option<Self> {
        let mut ids = self.0.clone();
        ids.push(AuditId::new());
        Self::from_ids(ids)
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
