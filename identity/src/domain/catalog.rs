//! Service [`Catalog`] definitions.

use serde::{Serialize, Serializer};

/// Catalog of the platform services and their [`Endpoint`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Catalog {
    /// Registered services.
    pub entries: Vec<Entry>,
}

impl Catalog {
    /// Indicates whether this [`Catalog`] lists no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Service registered in a [`Catalog`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// ID of this service.
    pub id: String,

    /// Type of this service, like `compute` or `identity`.
    pub kind: String,

    /// Name of this service.
    pub name: String,

    /// [`Endpoint`]s this service is reachable at.
    pub endpoints: Vec<Endpoint>,
}

/// Address a service is reachable at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    /// ID of this [`Endpoint`].
    pub id: String,

    /// [`Interface`] this [`Endpoint`] is exposed on.
    pub interface: Interface,

    /// Region this [`Endpoint`] belongs to.
    pub region: String,

    /// URL of this [`Endpoint`].
    pub url: String,
}

common::define_kind! {
    #[doc = "Network interface of an `Endpoint`."]
    enum Interface {
        #[doc = "Reachable by any client."]
        Public = 1,

        #[doc = "Reachable from inside the platform network."]
        Internal = 2,

        #[doc = "Reserved for administrative access."]
        Admin = 3,
    }
}

impl Serialize for Interface {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
