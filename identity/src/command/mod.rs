//! [`Command`] definition.

pub mod issue_token;
pub mod validate_token;
pub mod validate_token_v2;
pub mod validate_token_v3;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    issue_token::IssueToken, validate_token::ValidateToken,
    validate_token_v2::ValidateTokenV2, validate_token_v3::ValidateTokenV3,
};
