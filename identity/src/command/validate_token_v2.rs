//! [`Command`] for validating a [`Bearer`] token as the v2 identity API.

use tracerr::Traced;

use crate::{
    domain::{credential::v2, Bearer},
    Service,
};

use super::{
    validate_token::{self, ExecutionError},
    Command, ValidateToken,
};

/// [`Command`] for validating a [`Bearer`] token into a [`v2::Credential`].
#[derive(Clone, Debug)]
pub struct ValidateTokenV2 {
    /// [`Bearer`] token to validate.
    pub token: Bearer,
}

impl<Dir, Enc> Command<ValidateTokenV2> for Service<Dir, Enc>
where
    Self: Command<
        ValidateToken,
        Ok = validate_token::Output,
        Err = Traced<ExecutionError>,
    >,
{
    type Ok = v2::Credential;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ValidateTokenV2 { token }: ValidateTokenV2,
    ) -> Result<Self::Ok, Self::Err> {
        let validate_token::Output {
            auth,
            token,
            issued_at,
            resolved,
        } = self
            .execute(ValidateToken { token })
            .await
            .map_err(tracerr::wrap!())?;

        Ok(v2::project(&auth, token, issued_at, &resolved))
    }
}
