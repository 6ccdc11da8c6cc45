use std::{sync::Arc, time::Duration};

use common::DateTime;
use identity::{
    command::{
        issue_token::{self, Output},
        validate_token, IssueToken, ValidateTokenV2, ValidateTokenV3,
    },
    domain::{
        catalog::{Endpoint, Entry, Interface},
        token, AuditTrail, AuthToken, Bearer, Catalog, Domain, Method,
        Project, Role, Scope, User,
    },
    infra::{encryption::Key, InMemory, KeyRing},
    Command as _, Config, Service,
};
use tracerr::Traced;

const HOUR: Duration = Duration::from_secs(3600);

type TestService = Service<InMemory, Arc<KeyRing>>;

struct Env {
    service: TestService,
    directory: InMemory,
    keys: Arc<KeyRing>,
}

fn env() -> Env {
    let admin = Role {
        id: "r1".into(),
        name: "admin".to_owned(),
    };
    let directory = InMemory::new()
        .with_user(User {
            id: "u1".parse().unwrap(),
            name: "alice".to_owned(),
            domain_id: "default".parse().unwrap(),
            domain_name: "Default".to_owned(),
        })
        .with_project(Project {
            id: "p1".parse().unwrap(),
            name: "demo".to_owned(),
            domain_id: "default".parse().unwrap(),
            domain_name: "Default".to_owned(),
        })
        .with_project(Project {
            id: "p3".parse().unwrap(),
            name: "roleless".to_owned(),
            domain_id: "default".parse().unwrap(),
            domain_name: "Default".to_owned(),
        })
        .with_domain(Domain {
            id: "d1".parse().unwrap(),
            name: "engineering".to_owned(),
        })
        .with_roles(
            "u1".parse().unwrap(),
            Scope::Project("p1".parse().unwrap()),
            [admin.clone()],
        )
        .with_roles(
            "u1".parse().unwrap(),
            Scope::Domain("d1".parse().unwrap()),
            [admin],
        )
        .with_catalog(Catalog {
            entries: vec![Entry {
                id: "s1".to_owned(),
                kind: "identity".to_owned(),
                name: "keystone".to_owned(),
                endpoints: vec![Endpoint {
                    id: "e1".to_owned(),
                    interface: Interface::Public,
                    region: "region-a".to_owned(),
                    url: "https://identity.example.com".to_owned(),
                }],
            }],
        });
    let keys = Arc::new(KeyRing::new(Key::generate()));
    let service = Service::new(
        Config {
            token_expiration: Duration::from_secs(86_400),
        },
        directory.clone(),
        Arc::clone(&keys),
    );
    Env {
        service,
        directory,
        keys,
    }
}

async fn issue(
    service: &TestService,
    project_id: Option<&str>,
    domain_id: Option<&str>,
) -> Result<Output, Traced<issue_token::ExecutionError>> {
    service
        .execute(IssueToken::New {
            user_id: "u1".parse().unwrap(),
            method: Method::Password,
            project_id: project_id.map(|id| id.parse().unwrap()),
            domain_id: domain_id.map(|id| id.parse().unwrap()),
            lifetime: HOUR,
        })
        .await
}

fn cause<E>(err: &Traced<E>) -> &E {
    err.as_ref()
}

#[tokio::test]
async fn validates_unscoped_token() {
    let env = env();
    let issued = issue(&env.service, None, None).await.unwrap();

    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(v3.token.user.id, "u1");
    assert_eq!(v3.token.user.name, "alice");
    assert!(v3.token.roles.is_empty());
    assert!(v3.token.catalog.is_none());
    assert!(v3.token.project.is_none());
    assert_eq!(v3.token.methods, [Method::Password]);
    assert_eq!(v3.token.expires_at, issued.auth.expires_at());
    assert_ne!(v3.id, issued.token);

    let v2 = env
        .service
        .execute(ValidateTokenV2 {
            token: issued.token,
        })
        .await
        .unwrap();
    assert!(v2.token.tenant.is_none());
    assert!(v2.service_catalog.is_none());
}

#[tokio::test]
async fn projects_project_scope_into_both_versions() {
    let env = env();
    let issued = issue(&env.service, Some("p1"), None).await.unwrap();

    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token.clone(),
        })
        .await
        .unwrap();
    assert!(!v3.token.is_domain);
    assert_eq!(v3.token.project.as_ref().unwrap().id, "p1");
    assert_eq!(v3.token.roles.len(), 1);
    assert_eq!(v3.token.roles[0].name, "admin");
    assert_eq!(v3.token.catalog.as_ref().unwrap().len(), 1);

    let v2 = env
        .service
        .execute(ValidateTokenV2 {
            token: issued.token,
        })
        .await
        .unwrap();
    assert_eq!(v2.token.tenant.as_ref().unwrap().id, "p1");
    assert_eq!(v2.metadata.roles, ["admin"]);
    assert_eq!(v2.user.roles[0].name, "admin");
    assert!(v2.service_catalog.is_some());
}

#[tokio::test]
async fn degrades_domain_scope_in_legacy_version() {
    let env = env();
    let issued = issue(&env.service, None, Some("d1")).await.unwrap();

    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token.clone(),
        })
        .await
        .unwrap();
    assert!(v3.token.is_domain);
    assert_eq!(v3.token.project.as_ref().unwrap().id, "d1");

    let v2 = env
        .service
        .execute(ValidateTokenV2 {
            token: issued.token,
        })
        .await
        .unwrap();
    assert!(v2.token.tenant.is_none());
    assert!(v2.metadata.roles.is_empty());
    assert!(v2.service_catalog.is_none());
}

#[tokio::test]
async fn omits_authorization_surface_without_roles() {
    let env = env();
    let issued = issue(&env.service, Some("p3"), None).await.unwrap();

    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token.clone(),
        })
        .await
        .unwrap();
    assert!(v3.token.project.is_none());
    assert!(v3.token.roles.is_empty());
    assert!(v3.token.catalog.is_none());

    let v2 = env
        .service
        .execute(ValidateTokenV2 {
            token: issued.token,
        })
        .await
        .unwrap();
    assert!(v2.token.tenant.is_none());
    assert!(v2.service_catalog.is_none());
}

#[tokio::test]
async fn rejects_ambiguous_scope() {
    let env = env();

    let err = issue(&env.service, Some("p1"), Some("d1")).await.unwrap_err();
    assert!(matches!(
        cause(&err),
        issue_token::ExecutionError::AmbiguousScope(_),
    ));
}

#[tokio::test]
async fn rejects_too_short_lifetime() {
    let env = env();

    let err = env
        .service
        .execute(IssueToken::New {
            user_id: "u1".parse().unwrap(),
            method: Method::Password,
            project_id: None,
            domain_id: None,
            lifetime: Duration::from_millis(500),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        issue_token::ExecutionError::NonPositiveLifetime,
    ));
}

#[tokio::test]
async fn rejects_unrepresentable_lifetime() {
    let env = env();

    let err = env
        .service
        .execute(IssueToken::New {
            user_id: "u1".parse().unwrap(),
            method: Method::Password,
            project_id: Some("p1".parse().unwrap()),
            domain_id: None,
            lifetime: Duration::from_secs(400_000 * 365 * 86_400),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        issue_token::ExecutionError::LifetimeOutOfRange,
    ));

    let err = env
        .service
        .execute(IssueToken::New {
            user_id: "u1".parse().unwrap(),
            method: Method::Password,
            project_id: None,
            domain_id: None,
            lifetime: Duration::MAX,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        issue_token::ExecutionError::LifetimeOutOfRange,
    ));
}

#[tokio::test]
async fn reports_vanished_user_and_scope() {
    let env = env();

    let issued = issue(&env.service, Some("p2"), None).await.unwrap();
    let err = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::UnknownScope(Scope::Project(id))
            if id.as_str() == "p2",
    ));

    let issued = issue(&env.service, None, None).await.unwrap();
    env.directory.remove_user(&"u1".parse().unwrap());
    let err = env
        .service
        .execute(ValidateTokenV2 {
            token: issued.token,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::UnknownUser(id) if id.as_str() == "u1",
    ));
}

#[tokio::test]
async fn rejects_expired_tokens() {
    let env = env();

    let auth = AuthToken::scoped(
        "u1".parse().unwrap(),
        Method::Password,
        Scope::Unscoped,
        (DateTime::now() + HOUR).coerce(),
        AuditTrail::new(),
    );
    let stale = env
        .keys
        .encrypt_at(
            &token::encode(&auth).unwrap(),
            DateTime::now() - Duration::from_secs(86_401),
        )
        .unwrap();
    let err = env
        .service
        .execute(ValidateTokenV3 { token: stale })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::Expired,
    ));

}

#[tokio::test]
async fn decides_validity_by_issuance_age() {
    let env = env();

    let outlived = AuthToken::scoped(
        "u1".parse().unwrap(),
        Method::Password,
        Scope::Unscoped,
        (DateTime::now() - Duration::from_secs(5)).coerce(),
        AuditTrail::new(),
    );
    let token = env
        .keys
        .encrypt_at(
            &token::encode(&outlived).unwrap(),
            DateTime::now() - Duration::from_secs(86_390),
        )
        .unwrap();
    let v3 = env
        .service
        .execute(ValidateTokenV3 { token })
        .await
        .unwrap();

    assert_eq!(v3.token.expires_at, outlived.expires_at());
    assert!(v3.token.roles.is_empty());
}

#[tokio::test]
async fn rejects_tampered_and_foreign_tokens() {
    let env = env();
    let issued = issue(&env.service, Some("p1"), None).await.unwrap();

    let mut raw = issued.token.as_str().to_owned();
    let last = raw.pop().unwrap();
    raw.push(if last == 'A' { 'B' } else { 'A' });
    let err = env
        .service
        .execute(ValidateTokenV3 {
            token: Bearer::from(raw),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::InvalidToken,
    ));

    let foreign = KeyRing::new(Key::generate()).encrypt_at(
        &token::encode(&issued.auth).unwrap(),
        DateTime::now(),
    );
    let err = env
        .service
        .execute(ValidateTokenV2 {
            token: foreign.unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::InvalidToken,
    ));

    let garbage = env.keys.encrypt_at(b"\x02garbage", DateTime::now());
    let err = env
        .service
        .execute(ValidateTokenV3 {
            token: garbage.unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        cause(&err),
        validate_token::ExecutionError::InvalidToken,
    ));
}

#[tokio::test]
async fn rescopes_keeping_audit_chain() {
    let env = env();
    let issued = issue(&env.service, None, None).await.unwrap();

    let rescoped = env
        .service
        .execute(IssueToken::Rescope {
            token: issued.token,
            project_id: Some("p1".parse().unwrap()),
            domain_id: None,
        })
        .await
        .unwrap();
    assert_eq!(rescoped.auth.method(), Method::Token);
    assert_eq!(rescoped.auth.expires_at(), issued.auth.expires_at());
    assert_eq!(rescoped.auth.audit_ids().len(), 2);
    assert_eq!(
        rescoped.auth.audit_ids().origin(),
        issued.auth.audit_ids().origin(),
    );

    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: rescoped.token,
        })
        .await
        .unwrap();
    assert_eq!(v3.token.project.as_ref().unwrap().id, "p1");
    assert_eq!(v3.token.methods, [Method::Token]);
    assert_eq!(v3.token.audit_ids.len(), 2);
}

#[tokio::test]
async fn survives_key_rotation() {
    let env = env();
    let issued = issue(&env.service, Some("p1"), None).await.unwrap();

    env.keys.rotate(Key::generate());
    let v3 = env
        .service
        .execute(ValidateTokenV3 {
            token: issued.token,
        })
        .await
        .unwrap();

    let fresh = KeyRing::new(Key::generate());
    assert!(fresh
        .decrypt_at(&v3.id, Duration::from_secs(60), DateTime::now())
        .is_err());
    assert!(env
        .keys
        .decrypt_at(&v3.id, Duration::from_secs(60), DateTime::now())
        .is_ok());
}
