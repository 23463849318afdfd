use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::config::JwtConfig;
use crate::error::AuthError;
use crate::state::AppState;

/// Signing and verification keys plus per-kind TTLs, built once from config.
/// The secret itself is only held inside the jsonwebtoken key types and is
/// never logged.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub email_verify_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            access_ttl_minutes,
            refresh_ttl_days,
            email_verify_ttl_hours,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_days as u64) * 24 * 3600),
            email_verify_ttl: Duration::from_secs((email_verify_ttl_hours as u64) * 3600),
        }
    }
}

impl JwtKeys {
    fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::EmailVerify => self.email_verify_ttl,
        }
    }

    pub fn sign(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let ttl = self.ttl_for(kind);
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(e.into()))?;
        debug!(user_id = %user_id, kind = ?kind, "token signed");
        Ok(token)
    }

    /// Decode and validate a token, then check its purpose claim against
    /// `expected`. Expiry is a closed boundary: a token whose `exp` equals
    /// the current second is already expired.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidSignature,
            }
        })?;
        let claims = data.claims;
        if claims.exp as i64 <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(AuthError::ExpiredToken);
        }
        if claims.kind != expected {
            return Err(AuthError::PurposeMismatch);
        }
        debug!(user_id = %claims.sub, kind = ?claims.kind, "token verified");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            access_ttl: Duration::from_secs(300),
            refresh_ttl: Duration::from_secs(3600),
            email_verify_ttl: Duration::from_secs(600),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip_per_kind() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        for kind in [TokenKind::Access, TokenKind::Refresh, TokenKind::EmailVerify] {
            let token = keys.sign(user_id, kind).expect("sign");
            let claims = keys.verify(&token, kind).expect("verify");
            assert_eq!(claims.sub, user_id);
            assert_eq!(claims.kind, kind);
            assert_eq!(claims.iss, "test-issuer");
            assert_eq!(claims.aud, "test-aud");
            assert!(claims.exp > claims.iat);
        }
    }

    #[test]
    fn issued_tokens_are_unique() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let first = keys.sign(user_id, TokenKind::Refresh).expect("sign");
        let second = keys.sign(user_id, TokenKind::Refresh).expect("sign");
        assert_ne!(first, second);
    }

    #[test]
    fn verify_rejects_purpose_mismatch() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(Uuid::new_v4(), TokenKind::Access).expect("sign");
        let err = keys.verify(&token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, AuthError::PurposeMismatch));

        let token = keys
            .sign(Uuid::new_v4(), TokenKind::Refresh)
            .expect("sign");
        let err = keys.verify(&token, TokenKind::EmailVerify).unwrap_err();
        assert!(matches!(err, AuthError::PurposeMismatch));
    }

    #[test]
    fn verify_rejects_zero_ttl_token_as_expired() {
        let mut keys = make_keys("dev-secret");
        keys.access_ttl = Duration::from_secs(0);
        let token = keys.sign(Uuid::new_v4(), TokenKind::Access).expect("sign");
        let err = keys.verify(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[test]
    fn verify_rejects_garbage_and_wrong_secret() {
        let keys = make_keys("dev-secret");
        let err = keys.verify("not-a-jwt", TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));

        let other = make_keys("another-secret");
        let token = other.sign(Uuid::new_v4(), TokenKind::Access).expect("sign");
        let err = keys.verify(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }
}
