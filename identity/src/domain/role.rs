//! [`Role`] definitions.

use derive_more::{AsRef, Display, From, Into};
use serde::Serialize;

/// Role assigned to a user on a project or a domain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Role {
    /// ID of this [`Role`].
    pub id: Id,

    /// Name of this [`Role`].
    pub name: String,
}

/// ID of a [`Role`].
#[derive(
    AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Id(String);
