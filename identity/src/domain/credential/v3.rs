//! Credential view of the current (v3) identity API.

use serde::Serialize;

use crate::domain::{
    catalog::{self, Interface},
    token::{ExpirationDateTime, IssuanceDateTime},
    AuditTrail, AuthToken, Bearer, Method,
};

use super::{Resolved, Target};

/// Credential of the v3 identity API.
#[derive(Clone, Debug, Serialize)]
pub struct Credential {
    /// Freshly encrypted [`Bearer`] token, returned out of the body.
    #[serde(skip)]
    pub id: Bearer,

    /// [`Token`] details.
    pub token: Token,
}

/// Token details of a v3 [`Credential`].
#[derive(Clone, Debug, Serialize)]
pub struct Token {
    /// When the token expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: ExpirationDateTime,

    /// When the token was issued.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub issued_at: IssuanceDateTime,

    /// [`AuditTrail`] of the token.
    pub audit_ids: AuditTrail,

    /// [`Method`]s the user authenticated with.
    pub methods: Vec<Method>,

    /// [`User`] the token is issued for.
    pub user: User,

    /// Whether the token is scoped to a domain, which is then reported as the
    /// [`Project`].
    pub is_domain: bool,

    /// Project or domain the token is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,

    /// [`Role`]s of the user on the [`Project`].
    pub roles: Vec<Role>,

    /// Service catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<Service>>,
}

/// User of a v3 [`Token`].
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of the user.
    pub id: String,

    /// Name of the user.
    pub name: String,

    /// [`DomainRef`] the user belongs to.
    pub domain: DomainRef,
}

/// Project of a v3 [`Token`].
#[derive(Clone, Debug, Serialize)]
pub struct Project {
    /// ID of the project.
    pub id: String,

    /// Name of the project.
    pub name: String,

    /// [`DomainRef`] owning the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainRef>,
}

/// Reference to a domain.
#[derive(Clone, Debug, Serialize)]
pub struct DomainRef {
    /// ID of the domain.
    pub id: String,

    /// Name of the domain.
    pub name: String,
}

/// Role of a v3 [`Token`].
#[derive(Clone, Debug, Serialize)]
pub struct Role {
    /// ID of the role.
    pub id: String,

    /// Name of the role.
    pub name: String,
}

/// Service of a v3 catalog.
#[derive(Clone, Debug, Serialize)]
pub struct Service {
    /// ID of the service.
    pub id: String,

    /// Type of the service.
    #[serde(rename = "type")]
    pub kind: String,

    /// Name of the service.
    pub name: String,

    /// [`Endpoint`]s of the service.
    pub endpoints: Vec<Endpoint>,
}

/// Endpoint of a v3 [`Service`].
#[derive(Clone, Debug, Serialize)]
pub struct Endpoint {
    /// ID of the endpoint.
    pub id: String,

    /// [`Interface`] of the endpoint.
    pub interface: Interface,

    /// Region of the endpoint.
    pub region: String,

    /// ID of the region of the endpoint.
    pub region_id: String,

    /// URL of the endpoint.
    pub url: String,
}

/// Projects the [`AuthToken`] and its [`Resolved`] directory data into a v3
/// [`Credential`].
///
/// Without any [`Role`] the [`Credential`] carries identity only: neither a
/// [`Project`] nor a catalog.
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

    let mut view = Token {
        expires_at: token.expires_at(),
        issued_at,
        audit_ids: token.audit_ids().clone(),
        methods: vec![token.method()],
        user: User {
            id: user.id.to_string(),
            name: user.name.clone(),
            domain: DomainRef {
                id: user.domain_id.to_string(),
                name: user.domain_name.clone(),
            },
        },
        is_domain: false,
        project: None,
        roles: vec![],
        catalog: None,
    };

    if resolved.is_authorized() {
        match target {
            Target::None => {}
            Target::Project(p) => {
                view.project = Some(Project {
                    id: p.id.to_string(),
                    name: p.name.clone(),
                    domain: Some(DomainRef {
                        id: p.domain_id.to_string(),
                        name: p.domain_name.clone(),
                    }),
                });
            }
            Target::Domain(d) => {
                view.is_domain = true;
                view.project = Some(Project {
                    id: d.id.to_string(),
                    name: d.name.clone(),
                    domain: None,
                });
            }
        }
        view.roles = roles
            .iter()
            .map(|r| Role {
                id: r.id.to_string(),
                name: r.name.clone(),
            })
            .collect();
        view.catalog = catalog.as_ref().map(services);
    }

    Credential { id, token: view }
}

/// Converts the [`catalog::Catalog`] into v3 [`Service`]s.
fn services(catalog: &catalog::Catalog) -> Vec<Service> {
    catalog
        .entries
        .iter()
        .map(|e| Service {
            id: e.id.clone(),
            kind: e.kind.clone(),
            name: e.name.clone(),
            endpoints: e
                .endpoints
                .iter()
                .map(|ep| Endpoint {
                    id: ep.id.clone(),
                    interface: ep.interface,
                    region: ep.region.clone(),
                    region_id: ep.region.clone(),
                    url: ep.url.clone(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use crate::domain::{credential::fixture, Scope};

    use super::{project, Target};

    #[test]
    fn unscoped_carries_identity_only() {
        let token = fixture::token(Scope::Unscoped);
        let view = project(
            &token,
            fixture::bearer(),
            fixture::issued_at(),
            &fixture::resolved(Target::None, vec![]),
        );

        assert_eq!(view.id, fixture::bearer());
        assert_eq!(view.token.user.id, "u1");
        assert_eq!(view.token.user.domain.name, "Default");
        assert!(view.token.roles.is_empty());
        assert!(view.token.project.is_none());
        assert!(view.token.catalog.is_none());
        assert!(!view.token.is_domain);
    }

    #[test]
    fn project_scope_embeds_project_and_catalog() {
        let token = fixture::token(Scope::Project("p1".parse().unwrap()));
        let view = project(
            &token,
            fixture::bearer(),
            fixture::issued_at(),
            &fixture::resolved(
                Target::Project(fixture::project()),
                vec![fixture::admin()],
            ),
        );

        assert!(!view.token.is_domain);
        let p = view.token.project.as_ref().unwrap();
        assert_eq!(p.id, "p1");
        assert_eq!(p.domain.as_ref().unwrap().id, "default");
        assert_eq!(view.token.roles.len(), 1);
        assert_eq!(view.token.roles[0].name, "admin");
        assert_eq!(view.token.catalog.as_ref().unwrap()[0].endpoints.len(), 3);
    }

    #[test]
    fn domain_scope_reports_domain_as_project() {
        let token = fixture::token(Scope::Domain("d1".parse().unwrap()));
        let view = project(
            &token,
            fixture::bearer(),
            fixture::issued_at(),
            &fixture::resolved(
                Target::Domain(fixture::domain()),
                vec![fixture::admin()],
            ),
        );

        assert!(view.token.is_domain);
        let p = view.token.project.as_ref().unwrap();
        assert_eq!(p.id, "d1");
        assert_eq!(p.name, "engineering");
        assert!(p.domain.is_none());
    }

    #[test]
    fn roleless_scope_omits_authorization_surface() {
        let token = fixture::token(Scope::Project("p1".parse().unwrap()));
        let view = project(
            &token,
            fixture::bearer(),
            fixture::issued_at(),
            &fixture::resolved(Target::Project(fixture::project()), vec![]),
        );

        assert!(view.token.project.is_none());
        assert!(view.token.roles.is_empty());
        assert!(view.token.catalog.is_none());
    }

    #[test]
    fn serializes_identity_api_shape() {
        let token = fixture::token(Scope::Project("p1".parse().unwrap()));
        let view = project(
            &token,
            fixture::bearer(),
            fixture::issued_at(),
            &fixture::resolved(
                Target::Project(fixture::project()),
                vec![fixture::admin()],
            ),
        );
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["token"]["expires_at"], "2023-11-15T22:13:20Z");
        assert_eq!(json["token"]["issued_at"], "2023-11-14T22:13:20Z");
        assert_eq!(json["token"]["methods"], json!(["password"]));
        assert_eq!(
            json["token"]["roles"],
            json!([{"id": "r1", "name": "admin"}]),
        );
        assert_eq!(json["token"]["catalog"][0]["type"], "compute");
        assert_eq!(
            json["token"]["catalog"][0]["endpoints"][1]["interface"],
            "internal",
        );
    }
}
