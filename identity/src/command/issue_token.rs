//! [`Command`] for issuing a [`Bearer`] token.

use std::time::Duration;

use common::DateTime;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        domain, project, user, AmbiguousScope, AuditTrail, AuthToken, Bearer,
        Method, Scope,
    },
    infra::{encryption::EncryptError, Encryption},
    OpenError, SealError, Service,
};

use super::Command;

/// [`Command`] for issuing a [`Bearer`] token.
#[derive(Clone, Debug)]
pub enum IssueToken {
    /// Issue a [`Bearer`] token for a freshly authenticated user.
    New {
        /// ID of the authenticated user.
        user_id: user::Id,

        /// [`Method`] the user authenticated with.
        method: Method,

        /// ID of the project to scope the token to.
        project_id: Option<project::Id>,

        /// ID of the domain to scope the token to.
        domain_id: Option<domain::Id>,

        /// [`Duration`] the token is valid for.
        lifetime: Duration,
    },

    /// Issue a [`Bearer`] token of the same user for another [`Scope`].
    Rescope {
        /// Valid [`Bearer`] token to derive the new one from.
        token: Bearer,

        /// ID of the project to scope the token to.
        project_id: Option<project::Id>,

        /// ID of the domain to scope the token to.
        domain_id: Option<domain::Id>,
    },
}

/// Output of [`IssueToken`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Issued [`Bearer`] token.
    pub token: Bearer,

    /// [`AuthToken`] encrypted into the [`Bearer`] token.
    pub auth: AuthToken,
}

impl<Dir, Enc> Command<IssueToken> for Service<Dir, Enc>
where
    Enc: Encryption,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: IssueToken) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;
        use IssueToken as Cmd;

        let auth = match cmd {
            Cmd::New {
                user_id,
                method,
                project_id,
                domain_id,
                lifetime,
            } => {
                let scope = Scope::new(project_id, domain_id)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                if lifetime < Duration::from_secs(1) {
                    return Err(tracerr::new!(E::NonPositiveLifetime));
                }
                let expires_at = DateTime::now()
                    .checked_add(lifetime)
                    .ok_or_else(|| tracerr::new!(E::LifetimeOutOfRange))?;
                AuthToken::scoped(
                    user_id,
                    method,
                    scope,
                    expires_at.coerce(),
                    AuditTrail::new(),
                )
            }
            Cmd::Rescope {
                token,
                project_id,
                domain_id,
            } => {
                let scope = Scope::new(project_id, domain_id)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                self.open(&token)
                    .map_err(tracerr::from_and_wrap!(=> E))?
                    .rescoped(scope)
                    .ok_or_else(|| tracerr::new!(E::AuditTrailExhausted))?
            }
        };

        let token = self.seal(&auth).map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!(
            "issued token of `User(id: {})` scoped as `{}`, audit chain `{}`",
            auth.user_id(),
            auth.scope()
                .map_or_else(|e| e.to_string(), |s| s.kind().to_string()),
            auth.audit_ids().origin(),
        );

        Ok(Output { token, auth })
    }
}

/// Error of [`IssueToken`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Both a project and a domain are requested as the scope.
    #[display("{_0}")]
    AmbiguousScope(AmbiguousScope),

    /// Token lifetime is shorter than a second.
    #[display("Token lifetime must be at least one second")]
    #[from(ignore)]
    NonPositiveLifetime,

    /// Token lifetime reaches beyond any representable expiration.
    #[display("Token lifetime is too long")]
    #[from(ignore)]
    LifetimeOutOfRange,

    /// Re-scoped token has no room for another audit ID.
    #[display("Token cannot be re-scoped anymore")]
    #[from(ignore)]
    AuditTrailExhausted,

    /// Re-scoped token is not issued by this [`Service`].
    #[display("Invalid token")]
    #[from(ignore)]
    InvalidToken,

    /// Re-scoped token is expired.
    #[display("Token expired")]
    #[from(ignore)]
    Expired,

    /// [`Encryption`] failed.
    #[display("Failed to encrypt token: {_0}")]
    Encrypt(EncryptError),
}

impl From<SealError> for ExecutionError {
    fn from(e: SealError) -> Self {
        match e {
            SealError::AmbiguousScope(e) => Self::AmbiguousScope(e),
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
