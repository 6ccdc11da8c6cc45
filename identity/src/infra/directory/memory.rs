//! In-memory [`Directory`] implementation.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        domain, project, user, Catalog, Domain, Project, Role, Scope, User,
    },
    infra::{directory, Directory},
};

/// In-memory [`Directory`], populated upfront.
#[derive(Clone, Debug, Default)]
pub struct InMemory(Arc<RwLock<Entities>>);

/// Entities stored in an [`InMemory`] [`Directory`].
#[derive(Debug, Default)]
struct Entities {
    /// Registered [`User`]s.
    users: HashMap<user::Id, User>,

    /// Registered [`Project`]s.
    projects: HashMap<project::Id, Project>,

    /// Registered [`Domain`]s.
    domains: HashMap<domain::Id, Domain>,

    /// [`Role`]s assigned to [`User`]s on [`Scope`]s.
    roles: HashMap<(user::Id, Scope), Vec<Role>>,

    /// Service [`Catalog`].
    catalog: Catalog,
}

impl InMemory {
    /// Creates a new empty [`InMemory`] [`Directory`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the provided [`User`].
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.insert_user(user);
        self
    }

    /// Registers the provided [`Project`].
    #[must_use]
    pub fn with_project(self, project: Project) -> Self {
        self.update(|e| {
            _ = e.projects.insert(project.id.clone(), project);
        });
        self
    }

    /// Registers the provided [`Domain`].
    #[must_use]
    pub fn with_domain(self, domain: Domain) -> Self {
        self.update(|e| {
            _ = e.domains.insert(domain.id.clone(), domain);
        });
        self
    }

    /// Assigns the provided [`Role`]s to the [`User`] on the [`Scope`].
    #[must_use]
    pub fn with_roles(
        self,
        user_id: user::Id,
        scope: Scope,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.update(|e| {
            e.roles.entry((user_id, scope)).or_default().extend(roles);
        });
        self
    }

    /// Sets the service [`Catalog`].
    #[must_use]
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        self.update(|e| e.catalog = catalog);
        self
    }

    /// Registers or replaces the provided [`User`].
    pub fn insert_user(&self, user: User) {
        self.update(|e| {
            _ = e.users.insert(user.id.clone(), user);
        });
    }

    /// Removes the [`User`] with the provided ID, if any.
    pub fn remove_user(&self, id: &user::Id) {
        self.update(|e| {
            _ = e.users.remove(id);
        });
    }

    /// Removes the [`Project`] with the provided ID, if any.
    pub fn remove_project(&self, id: &project::Id) {
        self.update(|e| {
            _ = e.projects.remove(id);
        });
    }

    /// Applies the provided function to the stored [`Entities`].
    fn update(&self, f: impl FnOnce(&mut Entities)) {
        f(&mut self.0.write().unwrap_or_else(|e| e.into_inner()));
    }

    /// Reads the stored [`Entities`] with the provided function.
    fn read<T>(&self, f: impl FnOnce(&Entities) -> T) -> T {
        f(&self.0.read().unwrap_or_else(|e| e.into_inner()))
    }
}

impl<'l> Directory<Select<By<Option<User>, &'l user::Id>>> for InMemory {
    type Ok = Option<User>;
    type Err = Traced<directory::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|e| e.users.get(id).cloned()))
    }
}

impl<'l> Directory<Select<By<Option<Project>, &'l project::Id>>> for InMemory {
    type Ok = Option<Project>;
    type Err = Traced<directory::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Project>, &'l project::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|e| e.projects.get(id).cloned()))
    }
}

impl<'l> Directory<Select<By<Option<Domain>, &'l domain::Id>>> for InMemory {
    type Ok = Option<Domain>;
    type Err = Traced<directory::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Domain>, &'l domain::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|e| e.domains.get(id).cloned()))
    }
}

impl<'l> Directory<Select<By<Vec<Role>, (&'l user::Id, &'l Scope)>>>
    for InMemory
{
    type Ok = Vec<Role>;
    type Err = Traced<directory::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Role>, (&'l user::Id, &'l Scope)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, scope) = by.into_inner();
        Ok(self.read(|e| {
            e.roles
                .get(&(user_id.clone(), scope.clone()))
                .cloned()
                .unwrap_or_default()
        }))
    }
}

impl Directory<Select<By<Catalog, ()>>> for InMemory {
    type Ok = Catalog;
    type Err = Traced<directory::Error>;

    async fn execute(
        &self,
        _: Select<By<Catalog, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.read(|e| e.catalog.clone()))
    }
}
