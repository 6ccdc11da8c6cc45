//! [`User`] definitions.

use crate::domain::{domain, IdOf};

/// User registered in the directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// Name of this [`User`].
    pub name: String,

    /// ID of the [`Domain`] this [`User`] belongs to.
    ///
    /// [`Domain`]: crate::domain::Domain
    pub domain_id: domain::Id,

    /// Name of the [`Domain`] this [`User`] belongs to.
    ///
    /// [`Domain`]: crate::domain::Domain
    pub domain_name: String,
}

/// ID of a [`User`].
pub type Id = IdOf<User>;
