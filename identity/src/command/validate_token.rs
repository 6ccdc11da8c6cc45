//! [`Command`] for validating a [`Bearer`] token.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        credential::{Resolved, Target},
        domain, project,
        token::IssuanceDateTime,
        user, AuthToken, Bearer, Catalog, Domain, Project, Role, Scope, User,
    },
    infra::{directory, encryption::EncryptError, Directory, Encryption},
    OpenError, SealError, Service,
};

use super::Command;

/// [`Command`] for validating a [`Bearer`] token and resolving everything it
/// refers to.
///
/// The resolved data is projected by [`ValidateTokenV2`] and
/// [`ValidateTokenV3`] into the credential of the respective API version.
///
/// [`ValidateTokenV2`]: super::ValidateTokenV2
/// [`ValidateTokenV3`]: super::ValidateTokenV3
#[derive(Clone, Debug)]
pub struct ValidateToken {
    /// [`Bearer`] token to validate.
    pub token: Bearer,
}

/// Output of [`ValidateToken`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Decoded [`AuthToken`].
    pub auth: AuthToken,

    /// Freshly encrypted [`Bearer`] token of the same [`AuthToken`].
    pub token: Bearer,

    /// When the [`AuthToken`] was issued.
    pub issued_at: IssuanceDateTime,

    /// Directory data the [`AuthToken`] refers to.
    pub resolved: Resolved,
}

impl<Dir, Enc> Command<ValidateToken> for Service<Dir, Enc>
where
    Dir: for<'l> Directory<
            Select<By<Option<User>, &'l user::Id>>,
            Ok = Option<User>,
            Err = Traced<directory::Error>,
        > + for<'l> Directory<
            Select<By<Option<Project>, &'l project::Id>>,
            Ok = Option<Project>,
            Err = Traced<directory::Error>,
        > + for<'l> Directory<
            Select<By<Option<Domain>, &'l domain::Id>>,
            Ok = Option<Domain>,
            Err = Traced<directory::Error>,
        > + for<'l> Directory<
            Select<By<Vec<Role>, (&'l user::Id, &'l Scope)>>,
            Ok = Vec<Role>,
            Err = Traced<directory::Error>,
        > + Directory<
            Select<By<Catalog, ()>>,
            Ok = Catalog,
            Err = Traced<directory::Error>,
        >,
    Enc: Encryption,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ValidateToken { token }: ValidateToken,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let auth = self.open(&token).map_err(tracerr::from_and_wrap!(=> E))?;
        let scope = auth
            .scope()
            .map_err(|_| tracerr::new!(E::InvalidToken))?;

        let user = self
            .directory()
            .execute(Select(By::new(auth.user_id())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| {
                log::warn!(
                    "valid token refers to vanished `User(id: {})`",
                    auth.user_id(),
                );
                tracerr::new!(E::UnknownUser(auth.user_id().clone()))
            })?;

        let vanished = || {
            log::warn!("valid token refers to vanished `{scope}` scope");
            tracerr::new!(E::UnknownScope(scope.clone()))
        };
        let target = match &scope {
            Scope::Unscoped => Target::None,
            Scope::Project(id) => Target::Project(
                self.directory()
                    .execute(Select(By::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(vanished)?,
            ),
            Scope::Domain(id) => Target::Domain(
                self.directory()
                    .execute(Select(By::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(vanished)?,
            ),
        };

        let roles = if matches!(target, Target::None) {
            vec![]
        } else {
            self.directory()
                .execute(Select(By::new((auth.user_id(), &scope))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
        };
        let catalog = if roles.is_empty() {
            None
        } else {
            Some(
                self.directory()
                    .execute(Select(By::new(())))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            )
        };

        let fresh = self.seal(&auth).map_err(tracerr::from_and_wrap!(=> E))?;
        let issued_at = auth
            .expires_at()
            .checked_sub(self.config().token_expiration)
            .ok_or_else(|| tracerr::new!(E::InvalidToken))?
            .coerce();

        Ok(Output {
            auth,
            token: fresh,
            issued_at,
            resolved: Resolved {
                user,
                target,
                roles,
                catalog,
            },
        })
    }
}

/// Error of [`ValidateToken`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Directory`] lookup failed.
    #[display("`Directory` operation failed: {_0}")]
    Directory(directory::Error),

    /// Re-encryption of the validated token failed.
    #[display("Failed to re-encrypt token: {_0}")]
    Encrypt(EncryptError),

    /// Token is not issued by this [`Service`].
    #[display("Invalid token")]
    #[from(ignore)]
    InvalidToken,

    /// Token is expired.
    #[display("Token expired")]
    #[from(ignore)]
    Expired,

    /// Token refers to a [`User`] not existing anymore.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UnknownUser(#[error(not(source))] user::Id),

    /// Token refers to a [`Scope`] not existing anymore.
    #[display("`{_0}` scope does not exist")]
    #[from(ignore)]
    UnknownScope(#[error(not(source))] Scope),
}

impl From<SealError> for ExecutionError {
    fn from(e: SealError) -> Self {
        match e {
            SealError::AmbiguousScope(_) => Self::InvalidToken,
            SealError::Encrypt(e) => Self::Encrypt(e),
        }
    }
}

impl From<OpenError> for ExecutionError {
    fn from(e: OpenError) -> Self {
        match e {
            OpenError::Expired => Self::Expired,
            OpenError::InvalidToken => Self::InvalidToken,
        }
    }
}
