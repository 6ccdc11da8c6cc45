//! Credential view of the legacy (v2) identity API.
//!
//! The legacy API knows tenants (projects) only, so a domain-scoped token is
//! reported here without any authorization surface.

use itertools::Itertools as _;
use serde::Serialize;

use crate::domain::{
    catalog::{self, Interface},
    token::{ExpirationDateTime, IssuanceDateTime},
    AuditTrail, AuthToken, Bearer,
};

use super::{Resolved, Target};

/// Credential of the v2 identity API.
#[derive(Clone, Debug, Serialize)]
pub struct Credential {
    /// [`Token`] details.
    pub token: Token,

    /// [`User`] the token is issued for.
    pub user: User,

    /// [`Metadata`] of the token.
    pub metadata: Metadata,

    /// Service catalog.
    #[serde(rename = "serviceCatalog", skip_serializing_if = "Option::is_none")]
    pub service_catalog: Option<Vec<Service>>,
}

/// Token details of a v2 [`Credential`].
#[derive(Clone, Debug, Serialize)]
pub struct Token {
    /// Freshly encrypted [`Bearer`] token.
    pub id: Bearer,

    /// When the token expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires: ExpirationDateTime,

    /// When the token was issued.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub issued_at: IssuanceDateTime,

    /// [`AuditTrail`] of the token.
    pub audit_ids: AuditTrail,

    /// [`Tenant`] the token is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

/// Tenant (project) of a v2 [`Token`].
#[derive(Clone, Debug, Serialize)]
pub struct Tenant {
    /// ID of the tenant.
    pub id: String,

    /// Name of the tenant.
    pub name: String,
}

/// User of a v2 [`Credential`].
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of the user.
    pub id: String,

    /// Name of the user.
    pub name: String,

    /// Login name of the user.
    pub username: String,

    /// [`Role`]s of the user on the [`Tenant`].
    pub roles: Vec<Role>,
}

/// Role of a v2 [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct Role {
    /// Name of the role.
    pub name: String,
}

/// Metadata of a v2 [`Credential`].
#[derive(Clone, Debug, Serialize)]
pub struct Metadata {
    /// Always `0`: administrative access is decided by the roles.
    pub is_admin: u8,

    /// Names of the [`Role`]s.
    pub roles: Vec<String>,
}

/// Service of a v2 catalog.
#[derive(Clone, Debug, Serialize)]
pub struct Service {
    /// Type of the service.
    #[serde(rename = "type")]
    pub kind: String,

    /// Name of the service.
    pub name: String,

    /// [`Endpoint`]s of the service, one per region.
    pub endpoints: Vec<Endpoint>,
}

/// All the interfaces of a v2 [`Service`] in a single region.
#[derive(Clone, Debug, Serialize)]
pub struct Endpoint {
    /// ID of the endpoint.
    pub id: String,

    /// Region of the endpoint.
    pub region: String,

    /// URL of the public interface.
    #[serde(rename = "publicURL", skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// URL of the internal interface.
    #[serde(rename = "internalURL", skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,

    /// URL of the admin interface.
    #[serde(rename = "adminURL", skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
}

/// Projects the [`AuthToken`] and its [`Resolved`] directory data into a v2
/// [`Credential`].
///
/// Only a project-scoped [`AuthToken`] with any [`Role`] gets a [`Tenant`],
/// the [`Role`]s and a catalog.
#[must_use]
pub fn project(
    token: &AuthToken,
    id: Bearer,
    issued_at: IssuanceDateTime,
    resolved: &Resolved,
) -> Credential {
    let Resolved {
        user,
        target,
        roles,
        catalog,
    } = resolved;

    let mut credential = Credential {
        token: Token {
            id,
            expires: token.expires_at(),
            issued_at,
            audit_ids: token.audit_ids().clone(),
            tenant: None,
        },
        user: User {
            id: user.id.to_string(),
            name: user.name.clone(),
            username: user.name.clone(),
            roles: vec![],
        },
        metadata: Metadata {
            is_admin: 0,
            roles: vec![],
        },
        service_catalog: None,
    };

    if let (Target::Project(p), true) = (target, resolved.is_authorized()) {
        credential.token.tenant = Some(Tenant {
            id: p.id.to_string(),
            name: p.name.clone(),
        });
        credential.user.roles = roles
            .iter()
            .map(|r| Role {
                name: r.name.clone(),
            })
            .collect();
        credential.metadata.roles =
            roles.iter().map(|r| r.name.clone()).collect();
        credential.service_catalog = catalog.as_ref().map(services);
    }

    credential
}

/// Converts the [`catalog::Catalog`] into v2 [`Service`]s, merging the
/// interfaces of each region into a single [`Endpoint`].
fn services(catalog: &catalog::Catalog) -> Vec<Service> {
    catalog
        .entries
        .iter()
        .map(|e| {
            let regions = e
                .endpoints
                .iter()
                .sorted_by(|a, b| a.region.cmp(&b.region))
                .chunk_by(|ep| ep.region.as_str());
            let endpoints = regions
                .into_iter()
                .map(|(region, mut group)| {
                    let mut merged = Endpoint {
                        id: String::new(),
                        region: region.to_owned(),
                        public_url: None,
                        internal_url: None,
                        admin_url: None,
                    };
                    if let Some(first) = group.next() {
                        merged.id.clone_from(&first.id);
                        merged.merge(first);
                    }
                    for ep in group {
                        merged.merge(ep);
                    }
                    merged
                })
                .collect();
            Service {
                kind: e.kind.clone(),
                name: e.name.clone(),
                endpoints,
            }
        })
        .collect()
}

impl Endpoint {
    /// Sets the URL of the [`Interface`] of the provided [`catalog::Endpoint`].
    ///
    /// The first URL of an [`Interface`] wins.
    fn merge(&mut self, ep: &catalog::Endpoint) {
        let slot = match ep.interface {
            Interface::Public => &mut self.public_url,
            Interface::Internal => &mut self.internal_url,
            Interface::Admin => &mut self.admin_url,
        };
        if slot.is_none() {
            *slot = Some(ep.url.clone());
        }
    }
}
