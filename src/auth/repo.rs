use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::AuthError;

/// Persistence seam for user records. Emails reaching this trait are
/// already normalized (see `services::normalize_email`); the unique index
/// on the backing table is what makes duplicate detection atomic.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    async fn mark_verified(&self, id: Uuid) -> Result<User, AuthError>;
    async fn set_refresh_fingerprint(&self, id: Uuid, fingerprint: &str)
        -> Result<(), AuthError>;
    /// Compare-and-swap of the stored fingerprint. Returns false when the
    /// stored value no longer matches `expected`, i.e. the presented token
    /// was superseded by a concurrent rotation.
    async fn rotate_refresh_fingerprint(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AuthError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, is_verified, refresh_token_fingerprint, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, refresh_token_fingerprint, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified, refresh_token_fingerprint, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE
            WHERE id = $1
            RETURNING id, email, password_hash, is_verified, refresh_token_fingerprint, created_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_refresh_fingerprint(
        &self,
        id: Uuid,
        fingerprint: &str,
    ) -> Result<(), AuthError> {
        sqlx::query(r#"UPDATE users SET refresh_token_fingerprint = $2 WHERE id = $1"#)
            .bind(id)
            .bind(fingerprint)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn rotate_refresh_fingerprint(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_fingerprint = $3
            WHERE id = $1 AND refresh_token_fingerprint = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// In-memory store backing `AppState::fake()` and the service tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AuthError> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        if users.values().any(|u| u.email == email) {
            return Err(AuthError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_verified: false,
            refresh_token_fingerprint: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<User, AuthError> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("user {id} not found")))?;
        user.is_verified = true;
        Ok(user.clone())
    }

    async fn set_refresh_fingerprint(
        &self,
        id: Uuid,
        fingerprint: &str,
    ) -> Result<(), AuthError> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        if let Some(user) = users.get_mut(&id) {
            user.refresh_token_fingerprint = Some(fingerprint.to_string());
        }
        Ok(())
    }

    async fn rotate_refresh_fingerprint(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AuthError> {
        let mut users = self.users.lock().expect("user store lock poisoned");
        match users.get_mut(&id) {
            Some(user) if user.refresh_token_fingerprint.as_deref() == Some(expected) => {
                user.refresh_token_fingerprint = Some(next.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create("a@x.com", "hash").await.expect("create");
        let err = store.create("a@x.com", "hash").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn memory_store_rotation_is_a_compare_and_swap() {
        let store = MemoryUserStore::default();
        let user = store.create("a@x.com", "hash").await.expect("create");

        // no fingerprint stored yet: nothing to rotate from
        assert!(!store
            .rotate_refresh_fingerprint(user.id, "old", "new")
            .await
            .expect("rotate"));

        store
            .set_refresh_fingerprint(user.id, "old")
            .await
            .expect("set");
        assert!(store
            .rotate_refresh_fingerprint(user.id, "old", "new")
            .await
            .expect("rotate"));

        // a second swap from the stale value must lose
        assert!(!store
            .rotate_refresh_fingerprint(user.id, "old", "newer")
            .await
            .expect("rotate"));
        let user = store.find_by_id(user.id).await.expect("find").expect("user");
        assert_eq!(user.refresh_token_fingerprint.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn memory_store_marks_verified_once_set() {
        let store = MemoryUserStore::default();
        let user = store.create("a@x.com", "hash").await.expect("create");
        assert!(!user.is_verified);
        let user = store.mark_verified(user.id).await.expect("mark");
        assert!(user.is_verified);
    }
}
