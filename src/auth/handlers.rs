use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::{
    dto::{
        LoginRequest, PublicUser, RefreshRequest, RegisterRequest, TokenPair,
        VerifyEmailQuery, VerifyEmailResponse,
    },
    extractors::AuthUser,
    services, verification,
};
use crate::error::AuthError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-email", get(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let user = services::register(&state, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, query))]
async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<VerifyEmailResponse>, AuthError> {
    verification::complete(&state, &query.token).await?;
    Ok(Json(VerifyEmailResponse {
        msg: "Email verified successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(pair))
}

#[instrument(skip(state, payload))]
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = services::refresh(&state, &payload.refresh_token).await?;
    Ok(Json(pair))
}

#[instrument(skip_all)]
async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn public_user_serialization_exposes_no_secrets() {
        let user = crate::auth::repo_types::User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_verified: true,
            refresh_token_fingerprint: Some("fp".to_string()),
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("fingerprint"));
    }
}
