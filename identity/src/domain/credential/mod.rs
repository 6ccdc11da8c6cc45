//! Credential views of an [`AuthToken`] for the public identity APIs.
//!
//! Views are projections only: built fresh for each validation out of an
//! [`AuthToken`] and the [`Resolved`] directory data, never persisted.
//!
//! [`AuthToken`]: crate::domain::AuthToken

pub mod v2;
pub mod v3;

use crate::domain::{Catalog, Domain, Project, Role, User};

pub use self::{v2::project as project_v2, v3::project as project_v3};

/// Directory data an [`AuthToken`] refers to, looked up by the caller.
///
/// [`AuthToken`]: crate::domain::AuthToken
#[derive(Clone, Debug)]
pub struct Resolved {
    /// [`User`] the [`AuthToken`] is issued for.
    ///
    /// [`AuthToken`]: crate::domain::AuthToken
    pub user: User,

    /// Project or domain the [`AuthToken`] is scoped to.
    ///
    /// [`AuthToken`]: crate::domain::AuthToken
    pub target: Target,

    /// [`Role`]s of the [`User`] on the [`Target`].
    pub roles: Vec<Role>,

    /// Service [`Catalog`], if looked up.
    pub catalog: Option<Catalog>,
}

impl Resolved {
    /// Indicates whether the [`User`] is granted any [`Role`], so views carry
    /// an authorization surface.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        !self.roles.is_empty()
    }
}

/// Resolved scope of an [`AuthToken`].
///
/// [`AuthToken`]: crate::domain::AuthToken
#[derive(Clone, Debug)]
pub enum Target {
    /// Token is not scoped.
    None,

    /// Token is scoped to a [`Project`].
    Project(Project),

    /// Token is scoped to a [`Domain`].
    Domain(Domain),
}

#[cfg(test)]
mod fixture {
    use std::time::Duration;

    use crate::domain::{
        catalog::{Endpoint, Entry, Interface},
        token::{ExpirationDateTime, IssuanceDateTime},
        AuditTrail, AuthToken, Bearer, Catalog, Domain, Method, Project, Role,
        Scope, User,
    };

    use super::{Resolved, Target};

    pub(super) fn expires_at() -> ExpirationDateTime {
        ExpirationDateTime::from_unix_timestamp(1_700_086_400).unwrap()
    }

    pub(super) fn issued_at() -> IssuanceDateTime {
        (expires_at() - Duration::from_secs(86_400)).coerce()
    }

    pub(super) fn bearer() -> Bearer {
        Bearer::from("gAAAAABfresh".to_owned())
    }

    pub(super) fn token(scope: Scope) -> AuthToken {
        AuthToken::scoped(
            "u1".parse().unwrap(),
            Method::Password,
            scope,
            expires_at(),
            AuditTrail::new(),
        )
    }

    pub(super) fn user() -> User {
        User {
            id: "u1".parse().unwrap(),
            name: "alice".to_owned(),
            domain_id: "default".parse().unwrap(),
            domain_name: "Default".to_owned(),
        }
    }

    pub(super) fn project() -> Project {
        Project {
            id: "p1".parse().unwrap(),
            name: "demo".to_owned(),
            domain_id: "default".parse().unwrap(),
            domain_name: "Default".to_owned(),
        }
    }

    pub(super) fn domain() -> Domain {
        Domain {
            id: "d1".parse().unwrap(),
            name: "engineering".to_owned(),
        }
    }

    pub(super) fn admin() -> Role {
        Role {
            id: "r1".into(),
            name: "admin".to_owned(),
        }
    }

    pub(super) fn catalog() -> Catalog {
        Catalog {
            entries: vec![Entry {
                id: "s1".to_owned(),
                kind: "compute".to_owned(),
                name: "nova".to_owned(),
                endpoints: vec![
                    Endpoint {
                        id: "e1".to_owned(),
                        interface: Interface::Public,
                        region: "region-a".to_owned(),
                        url: "https://compute.example.com".to_owned(),
                    },
                    Endpoint {
                        id: "e2".to_owned(),
                        interface: Interface::Internal,
                        region: "region-a".to_owned(),
                        url: "http://compute.internal".to_owned(),
                    },
                    Endpoint {
                        id: "e3".to_owned(),
                        interface: Interface::Public,
                        region: "region-b".to_owned(),
                        url: "https://b.compute.example.com".to_owned(),
                    },
                ],
            }],
        }
    }

    pub(super) fn resolved(target: Target, roles: Vec<Role>) -> Resolved {
        let catalog = (!roles.is_empty()).then(catalog);
        Resolved {
            user: user(),
            target,
            roles,
            catalog,
        }
    }
}
