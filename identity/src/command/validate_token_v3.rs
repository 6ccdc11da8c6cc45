//! [`Command`] for validating a [`Bearer`] token as the v3 identity API.

use tracerr::Traced;

use crate::{
    domain::{credential::v3, Bearer},
    Service,
};

use super::{
    validate_token::{self, ExecutionError},
    Command, ValidateToken,
};

/// [`Command`] for validating a [`Bearer`] token into a [`v3::Credential`].
#[derive(Clone, Debug)]
pub struct ValidateTokenV3 {
    /// [`Bearer`] token to validate.
    pub token: Bearer,
}

impl<Dir, Enc> Command<ValidateTokenV3> for Service<Dir, Enc>
where
    Self: Command<
        ValidateToken,
        Ok = validate_token::Output,
        Err = Traced<ExecutionError>,
    >,
{
    type Ok = v3::Credential;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ValidateTokenV3 { token }: ValidateTokenV3,
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

        Ok(v3::project(&auth, token, issued_at, &resolved))
    }
}
