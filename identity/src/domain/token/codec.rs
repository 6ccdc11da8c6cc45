//! Conversions between an [`AuthToken`] and its [`Payload`] bytes.

use derive_more::{Display, Error};
use tracing as log;

use super::{
    payload::{DomainScoped, ProjectScoped, Unscoped},
    AmbiguousScope, AuthToken, DecodeError, Kind, Payload, Scope,
};

/// Encodes the provided [`AuthToken`] into the [`Payload`] bytes matching its
/// [`Scope`].
///
/// # Errors
///
/// With [`AmbiguousScope`] if the [`AuthToken`] is scoped to both a project
/// and a domain.
pub fn encode(token: &AuthToken) -> Result<Vec<u8>, AmbiguousScope> {
    Payload::try_from(token).map(|p| p.to_bytes())
}

/// Decodes the `bytes` as the [`Payload`] of the provided [`Kind`].
///
/// # Errors
///
/// See [`Payload::from_bytes()`].
pub fn decode_variant(
    bytes: &[u8],
    kind: Kind,
) -> Result<AuthToken, DecodeError> {
    Payload::from_bytes(bytes, kind).map(AuthToken::from)
}

/// Decodes the `bytes` of a yet unknown [`Payload`] [`Kind`].
///
/// The leading version marker selects the [`Kind`] among the
/// [`Kind::TRIAL_ORDER`], so no layout is ever tried on the bytes of another
/// one. Never panics, whatever the `bytes` are.
///
/// # Errors
///
/// With [`InvalidToken`] if the `bytes` are not a [`Payload`] of any [`Kind`].
/// The reason is logged, but never returned.
pub fn decode(bytes: &[u8]) -> Result<AuthToken, InvalidToken> {
    let Some(&marker) = bytes.first() else {
        log::debug!("cannot decode an empty token payload");
        return Err(InvalidToken);
    };
    let Some(kind) = Kind::TRIAL_ORDER.into_iter().find(|k| k.u8() == marker)
    else {
        log::debug!("unknown token payload version marker: {marker}");
        return Err(InvalidToken);
    };

    decode_variant(bytes, kind).map_err(|e| {
        log::debug!("cannot decode `{kind}` token payload: {e}");
        InvalidToken
    })
}

/// Bytes are not an [`AuthToken`] issued by this service.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("Invalid token")]
pub struct InvalidToken;

impl TryFrom<&AuthToken> for Payload {
    type Error = AmbiguousScope;

    fn try_from(token: &AuthToken) -> Result<Self, Self::Error> {
        let user_id = token.user_id().clone();
        let method = token.method();
        let expires_at = token.expires_at();
        let audit_ids = token.audit_ids().clone();

        Ok(match token.scope()? {
            Scope::Unscoped => Self::Unscoped(Unscoped {
                user_id,
                method,
                expires_at,
                audit_ids,
            }),
            Scope::Project(project_id) => Self::ProjectScoped(ProjectScoped {
                user_id,
                method,
                project_id,
                expires_at,
                audit_ids,
            }),
            Scope::Domain(domain_id) => Self::DomainScoped(DomainScoped {
                user_id,
                method,
                domain_id,
                expires_at,
                audit_ids,
            }),
        })
    }
}

impl From<Payload> for AuthToken {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Unscoped(p) => Self::scoped(
                p.user_id,
                p.method,
                Scope::Unscoped,
                p.expires_at,
                p.audit_ids,
            ),
            Payload::ProjectScoped(p) => Self::scoped(
                p.user_id,
                p.method,
                Scope::Project(p.project_id),
                p.expires_at,
                p.audit_ids,
            ),
            Payload::DomainScoped(p) => Self::scoped(
                p.user_id,
                p.method,
                Scope::Domain(p.domain_id),
                p.expires_at,
                p.audit_ids,
            ),
        }
    }
}
