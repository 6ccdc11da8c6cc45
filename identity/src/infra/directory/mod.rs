//! [`Directory`]-related implementations.
//!
//! A [`Directory`] resolves the entities an [`AuthToken`] refers to by
//! implementing the following operations:
//! - `Select<By<Option<User>, &user::Id>>`;
//! - `Select<By<Option<Project>, &project::Id>>`;
//! - `Select<By<Option<Domain>, &domain::Id>>`;
//! - `Select<By<Vec<Role>, (&user::Id, &Scope)>>`;
//! - `Select<By<Catalog, ()>>`.
//!
//! [`AuthToken`]: crate::domain::AuthToken

#[cfg(feature = "memory")]
pub mod memory;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "memory")]
pub use self::memory::InMemory;

/// Directory lookup.
pub use common::Handler as Directory;

/// [`Directory`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Backend storing the directory failed.
    #[display("Directory backend failed: {_0}")]
    Backend(#[error(not(source))] Box<dyn std::error::Error + Send + Sync>),
}
