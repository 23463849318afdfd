use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Errors surfaced by the auth core. Handlers rely on the `IntoResponse`
/// impl below, so the routing layer never inspects variants itself.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("{0}")]
    WeakPassword(String),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email address not verified")]
    NotVerified,
    #[error("email address already verified")]
    AlreadyVerified,
    #[error("token expired")]
    ExpiredToken,
    #[error("token purpose mismatch")]
    PurposeMismatch,
    #[error("invalid token")]
    InvalidSignature,
    #[error("refresh token superseded")]
    RevokedToken,
    #[error("storage unavailable")]
    StorageUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::WeakPassword(_) | Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::ExpiredToken
            | Self::PurposeMismatch
            | Self::InvalidSignature
            | Self::RevokedToken => StatusCode::UNAUTHORIZED,
            Self::NotVerified => StatusCode::FORBIDDEN,
            Self::DuplicateEmail | Self::AlreadyVerified => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        // unique violation on the users email index is the atomic duplicate
        // guard
        if let Some(db) = err.as_database_error() {
            if db.is_unique_violation() {
                return Self::DuplicateEmail;
            }
        }
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StorageUnavailable(err.into())
            }
            _ => Self::Internal(err.into()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "auth core error");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_error_classes() {
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::WeakPassword("too short".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::NotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::RevokedToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::StorageUnavailable(anyhow::anyhow!("pool timed out")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
