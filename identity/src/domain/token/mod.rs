//! [`AuthToken`] definitions.

pub mod codec;
pub mod payload;

use std::fmt;

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr};
use serde::Serialize;

#[cfg(doc)]
use common::DateTime;

use crate::domain::{domain, project, user, AuditTrail, Method};

pub use self::{
    codec::{decode, decode_variant, encode, InvalidToken},
    payload::{DecodeError, Kind, Payload},
};

/// Authenticated session: who is calling, as which [`Scope`].
///
/// Immutable once constructed. Re-scoping produces a new [`AuthToken`] with
/// an extended [`AuditTrail`] and leaves the original one untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthToken {
    /// ID of the authenticated [`User`].
    ///
    /// [`User`]: crate::domain::User
    user_id: user::Id,

    /// [`Method`] the [`User`] authenticated with.
    ///
    /// [`User`]: crate::domain::User
    method: Method,

    /// ID of the [`Project`] this [`AuthToken`] is scoped to, if any.
    ///
    /// [`Project`]: crate::domain::Project
    project_id: Option<project::Id>,

    /// ID of the [`Domain`] this [`AuthToken`] is scoped to, if any.
    ///
    /// [`Domain`]: crate::domain::Domain
    domain_id: Option<domain::Id>,

    /// [`DateTime`] when this [`AuthToken`] expires, with a second precision.
    expires_at: ExpirationDateTime,

    /// [`AuditTrail`] of this [`AuthToken`].
    audit_ids: AuditTrail,
}

impl AuthToken {
    /// Creates a new [`AuthToken`] out of the provided parts.
    ///
    /// Sub-second part of the `expires_at` is dropped. Having both the
    /// `project_id` and the `domain_id` is representable, but such an
    /// [`AuthToken`] is rejected by [`encode()`].
    #[must_use]
    pub fn new(
        user_id: user::Id,
        method: Method,
        project_id: Option<project::Id>,
        domain_id: Option<domain::Id>,
        expires_at: ExpirationDateTime,
        audit_ids: AuditTrail,
    ) -> Self {
        Self {
            user_id,
            method,
            project_id,
            domain_id,
            expires_at: expires_at.trunc_to_seconds(),
            audit_ids,
        }
    }

    /// Creates a new [`AuthToken`] for the provided [`Scope`].
    #[must_use]
    pub fn scoped(
        user_id: user::Id,
        method: Method,
        scope: Scope,
        expires_at: ExpirationDateTime,
        audit_ids: AuditTrail,
    ) -> Self {
        let (project_id, domain_id) = scope.into_parts();
        Self::new(user_id, method, project_id, domain_id, expires_at, audit_ids)
    }

    /// Returns ID of the authenticated [`User`].
    ///
    /// [`User`]: crate::domain::User
    #[must_use]
    pub fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    /// Returns [`Method`] the [`User`] authenticated with.
    ///
    /// [`User`]: crate::domain::User
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns ID of the [`Project`] this [`AuthToken`] is scoped to.
    ///
    /// [`Project`]: crate::domain::Project
    #[must_use]
    pub fn project_id(&self) -> Option<&project::Id> {
        self.project_id.as_ref()
    }

    /// Returns ID of the [`Domain`] this [`AuthToken`] is scoped to.
    ///
    /// [`Domain`]: crate::domain::Domain
    #[must_use]
    pub fn domain_id(&self) -> Option<&domain::Id> {
        self.domain_id.as_ref()
    }

    /// Returns [`DateTime`] when this [`AuthToken`] expires.
    #[must_use]
    pub fn expires_at(&self) -> ExpirationDateTime {
        self.expires_at
    }

    /// Returns [`AuditTrail`] of this [`AuthToken`].
    #[must_use]
    pub fn audit_ids(&self) -> &AuditTrail {
        &self.audit_ids
    }

    /// Returns [`Scope`] of this [`AuthToken`].
    ///
    /// # Errors
    ///
    /// With [`AmbiguousScope`] if both project and domain are set.
    pub fn scope(&self) -> Result<Scope, AmbiguousScope> {
        Scope::new(self.project_id.clone(), self.domain_id.clone())
    }

    /// Derives a new [`AuthToken`] of the same [`User`] scoped to the provided
    /// [`Scope`].
    ///
    /// The derived [`AuthToken`] keeps the expiration, is authenticated by
    /// [`Method::Token`] and has a fresh [`AuditId`] appended to its
    /// [`AuditTrail`]. [`None`] is returned if the [`AuditTrail`] is full.
    ///
    /// [`AuditId`]: crate::domain::AuditId
    /// [`User`]: crate::domain::User
    #[must_use]
    pub fn rescoped(&self, scope: Scope) -> Option<Self> {
        Some(Self::scoped(
            self.user_id.clone(),
            Method::Token,
            scope,
            self.expires_at,
            self.audit_ids.extended()?,
        ))
    }
}

/// Authorization context of an [`AuthToken`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Scope {
    /// Identity only.
    Unscoped,

    /// Scoped to a [`Project`].
    ///
    /// [`Project`]: crate::domain::Project
    Project(project::Id),

    /// Scoped to a [`Domain`].
    ///
    /// [`Domain`]: crate::domain::Domain
    Domain(domain::Id),
}

impl Scope {
    /// Creates a new [`Scope`] out of the optional project and domain IDs.
    ///
    /// # Errors
    ///
    /// With [`AmbiguousScope`] if both IDs are provided.
    pub fn new(
        project_id: Option<project::Id>,
        domain_id: Option<domain::Id>,
    ) -> Result<Self, AmbiguousScope> {
        match (project_id, domain_id) {
            (None, None) => Ok(Self::Unscoped),
            (Some(id), None) => Ok(Self::Project(id)),
            (None, Some(id)) => Ok(Self::Domain(id)),
            (Some(_), Some(_)) => Err(AmbiguousScope),
        }
    }

    /// Returns the payload [`Kind`] carrying this [`Scope`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Unscoped => Kind::Unscoped,
            Self::Project(_) => Kind::ProjectScoped,
            Self::Domain(_) => Kind::DomainScoped,
        }
    }

    /// Splits this [`Scope`] into the optional project and domain IDs.
    #[must_use]
    pub fn into_parts(self) -> (Option<project::Id>, Option<domain::Id>) {
        match self {
            Self::Unscoped => (None, None),
            Self::Project(id) => (Some(id), None),
            Self::Domain(id) => (None, Some(id)),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => f.write_str("unscoped"),
            Self::Project(id) => write!(f, "project:{id}"),
            Self::Domain(id) => write!(f, "domain:{id}"),
        }
    }
}

/// Both project and domain are requested as a [`Scope`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("Token cannot be scoped to both a project and a domain")]
pub struct AmbiguousScope;

/// Bearer token: the encrypted wire form of an [`AuthToken`].
#[derive(AsRef, Clone, Display, Eq, From, FromStr, Hash, PartialEq, Serialize)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct Bearer(String);

impl Bearer {
    /// Returns the string form of this [`Bearer`] token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Bearer(..)")
    }
}

/// [`DateTime`] when an [`AuthToken`] expires.
pub type ExpirationDateTime = DateTimeOf<(AuthToken, unit::Expiration)>;

/// [`DateTime`] when an [`AuthToken`] was issued.
pub type IssuanceDateTime = DateTimeOf<(AuthToken, unit::Issuance)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::domain::{AuditTrail, Method};

    use super::{AmbiguousScope, AuthToken, ExpirationDateTime, Kind, Scope};

    fn token(scope: Scope) -> AuthToken {
        AuthToken::scoped(
            "u1".parse().unwrap(),
            Method::Password,
            scope,
            ExpirationDateTime::now() + Duration::from_secs(3600),
            AuditTrail::new(),
        )
    }

    #[test]
    fn resolves_scope() {
        assert_eq!(Scope::new(None, None), Ok(Scope::Unscoped));
        assert_eq!(
            Scope::new(Some("p1".parse().unwrap()), None),
            Ok(Scope::Project("p1".parse().unwrap())),
        );
        assert_eq!(
            Scope::new(None, Some("d1".parse().unwrap())),
            Ok(Scope::Domain("d1".parse().unwrap())),
        );
        assert_eq!(
            Scope::new(
                Some("p1".parse().unwrap()),
                Some("d1".parse().unwrap()),
            ),
            Err(AmbiguousScope),
        );
    }

    #[test]
    fn displays_scope() {
        assert_eq!(Scope::Unscoped.to_string(), "unscoped");
        assert_eq!(
            Scope::Project("p1".parse().unwrap()).to_string(),
            "project:p1",
        );
        assert_eq!(
            Scope::Domain("d1".parse().unwrap()).to_string(),
            "domain:d1",
        );
    }

    #[test]
    fn maps_scope_to_kind() {
        assert_eq!(Scope::Unscoped.kind(), Kind::Unscoped);
        assert_eq!(
            Scope::Project("p1".parse().unwrap()).kind(),
            Kind::ProjectScoped,
        );
        assert_eq!(
            Scope::Domain("d1".parse().unwrap()).kind(),
            Kind::DomainScoped,
        );
    }

    #[test]
    fn drops_subsecond_expiry() {
        let t = token(Scope::Unscoped);

        assert_eq!(
            t.expires_at(),
            ExpirationDateTime::from_unix_timestamp(
                t.expires_at().unix_timestamp()
            )
            .unwrap(),
        );
    }

    #[test]
    fn rescoping_extends_audit_trail() {
        let original = token(Scope::Unscoped);
        let rescoped = original
            .rescoped(Scope::Project("p1".parse().unwrap()))
            .unwrap();

        assert_eq!(original.scope(), Ok(Scope::Unscoped));
        assert_eq!(original.audit_ids().len(), 1);

        assert_eq!(rescoped.user_id(), original.user_id());
        assert_eq!(rescoped.method(), Method::Token);
        assert_eq!(rescoped.expires_at(), original.expires_at());
        assert_eq!(
            rescoped.scope(),
            Ok(Scope::Project("p1".parse().unwrap())),
        );
        assert_eq!(rescoped.audit_ids().len(), 2);
        assert_eq!(rescoped.audit_ids()[0], original.audit_ids()[0]);
    }
}
