//! [`Project`] definitions.

use crate::domain::{domain, IdOf};

/// Project a token may be scoped to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// ID of this [`Project`].
    pub id: Id,

    /// Name of this [`Project`].
    pub name: String,

    /// ID of the [`Domain`] owning this [`Project`].
    ///
    /// [`Domain`]: crate::domain::Domain
    pub domain_id: domain::Id,

    /// Name of the [`Domain`] owning this [`Project`].
    ///
    /// [`Domain`]: crate::domain::Domain
    pub domain_name: String,
}

/// ID of a [`Project`].
pub type Id = IdOf<Project>;
