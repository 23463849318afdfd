use axum::extract::FromRef;
use tracing::{info, instrument, warn};

use crate::auth::claims::TokenKind;
use crate::auth::jwt::JwtKeys;
use crate::auth::repo::UserStore;
use crate::auth::repo_types::User;
use crate::error::AuthError;
use crate::mail::Mailer;
use crate::state::AppState;

/// Issue an email-verification token for `user` and hand the link to the
/// mail collaborator. Dispatch failure must not fail the registration that
/// triggered it, so every error ends here as a warning.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn start(state: &AppState, user: &User) {
    let keys = JwtKeys::from_ref(state);
    let token = match keys.sign(user.id, TokenKind::EmailVerify) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "could not sign verification token");
            return;
        }
    };
    let link = format!(
        "{}/auth/verify-email?token={}",
        state.config.public_base_url, token
    );
    if let Err(e) = state.mailer.send(&user.email, &link).await {
        warn!(error = %e, email = %user.email, "verification email dispatch failed");
    }
}

/// Consume a verification token: flip the subject's verified flag exactly
/// once. The token itself stays valid until expiry (it carries no
/// server-side state), so the `AlreadyVerified` check is the single-use
/// guard.
#[instrument(skip(state, token))]
pub async fn complete(state: &AppState, token: &str) -> Result<User, AuthError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token, TokenKind::EmailVerify)?;
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if user.is_verified {
        return Err(AuthError::AlreadyVerified);
    }
    let user = state.users.mark_verified(user.id).await?;
    info!(user_id = %user.id, "email verified");
    Ok(user)
}
