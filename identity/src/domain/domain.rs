//! [`Domain`] definitions.

use crate::domain::IdOf;

/// Domain owning users and projects, a token may be scoped to it as well.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Domain {
    /// ID of this [`Domain`].
    pub id: Id,

    /// Name of this [`Domain`].
    pub name: String,
}

/// ID of a [`Domain`].
pub type Id = IdOf<Domain>;
