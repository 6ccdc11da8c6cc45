//! Domain definitions.

pub mod audit;
pub mod catalog;
pub mod credential;
#[expect(clippy::module_inception, reason = "identity domain entity")]
pub mod domain;
pub mod id;
pub mod method;
pub mod project;
pub mod role;
pub mod token;
pub mod user;

pub use self::{
    audit::{AuditId, AuditTrail},
    catalog::Catalog,
    domain::Domain,
    id::IdOf,
    method::Method,
    project::Project,
    role::Role,
    token::{AmbiguousScope, AuthToken, Bearer, Scope},
    user::User,
};
