//! Refresh token storage with lazy expiry and one-way revocation.
//!
//! Refresh tokens are opaque random strings; the database row is the only
//! source of truth for who a token belongs to and whether it is still usable.
//! Access tokens are stateless and never touch this table.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sqlx::sqlite::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use super::decode_uuid;
use crate::clock::unix_now;

/// Number of random bytes in a refresh token (hex-encodes to 64 characters).
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Refresh token duration: 60 days
pub const REFRESH_TOKEN_DURATION_SECS: i64 = 60 * 24 * 60 * 60;

/// A persisted refresh token record.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: i64,
    pub expires_at: i64,
    pub revoked_at: Option<i64>,
}

impl RefreshToken {
    /// Usable iff never revoked and `now` is strictly before expiry.
    pub fn is_usable_at(&self, now: i64) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token: String,
    user_id: String,
    created_at: i64,
    expires_at: i64,
    revoked_at: Option<i64>,
}

impl TryFrom<RefreshTokenRow> for RefreshToken {
    type Error = sqlx::Error;

    fn try_from(row: RefreshTokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: row.token,
            user_id: decode_uuid(&row.user_id)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        })
    }
}

/// Errors that can occur while issuing or resolving refresh tokens.
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("Refresh token not found")]
    NotFound,
    #[error("Refresh token has been revoked")]
    Revoked,
    #[error("Refresh token has expired")]
    Expired,
    /// Entropy source failure or a token value collision.
    #[error("Failed to generate refresh token: {0}")]
    GenerationFailure(String),
    #[error("System time error")]
    TimeError,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Generate a fresh refresh token value: 32 OS-random bytes as lowercase hex.
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::GenerationFailure(e.to_string()))?;
    Ok(hex::encode(bytes))
}

fn now_secs() -> Result<i64, RefreshTokenError> {
    unix_now()
        .map(|secs| secs as i64)
        .map_err(|_| RefreshTokenError::TimeError)
}

/// Store for issuing, resolving and revoking refresh tokens.
///
/// Every call is a direct round trip to the database; nothing is cached.
#[derive(Clone)]
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue and persist a new refresh token for a user.
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        self.issue_at(user_id, now_secs()?).await
    }

    /// Issue a refresh token as if the current time were `now`.
    pub async fn issue_at(
        &self,
        user_id: Uuid,
        now: i64,
    ) -> Result<RefreshToken, RefreshTokenError> {
        let token = generate_refresh_token()?;
        self.insert(token, user_id, now).await
    }

    /// Persist a token value. A duplicate value is a generation failure, not retried.
    async fn insert(
        &self,
        token: String,
        user_id: Uuid,
        now: i64,
    ) -> Result<RefreshToken, RefreshTokenError> {
        let expires_at = now + REFRESH_TOKEN_DURATION_SECS;

        let result = sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id.to_string())
        .bind(now)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RefreshToken {
                token,
                user_id,
                created_at: now,
                expires_at,
                revoked_at: None,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::error!(user_id = %user_id, "Refresh token collision");
                Err(RefreshTokenError::GenerationFailure(
                    "token value already exists".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a token record by its exact value, whatever its state.
    pub async fn get(&self, token: &str) -> Result<Option<RefreshToken>, RefreshTokenError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            "SELECT token, user_id, created_at, expires_at, revoked_at FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshToken::try_from).transpose()?)
    }

    /// Resolve a usable token to the user it was issued to.
    pub async fn resolve(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        self.resolve_at(token, now_secs()?).await
    }

    /// Resolve a token as if the current time were `now`.
    ///
    /// Checks run in order: existence, revocation, expiry.
    pub async fn resolve_at(&self, token: &str, now: i64) -> Result<Uuid, RefreshTokenError> {
        let record = self.get(token).await?.ok_or(RefreshTokenError::NotFound)?;

        if record.revoked_at.is_some() {
            return Err(RefreshTokenError::Revoked);
        }
        if !record.is_usable_at(now) {
            return Err(RefreshTokenError::Expired);
        }

        Ok(record.user_id)
    }

    /// Revoke a token. Returns whether this call performed the revocation.
    ///
    /// Unknown or already-revoked tokens are a no-op, not an error.
    pub async fn revoke(&self, token: &str) -> Result<bool, RefreshTokenError> {
        self.revoke_at(token, now_secs()?).await
    }

    /// Revoke a token as if the current time were `now`.
    pub async fn revoke_at(&self, token: &str, now: i64) -> Result<bool, RefreshTokenError> {
        // Single conditional update so concurrent revokes cannot both win.
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ?, updated_at = ? WHERE token = ? AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn store() -> RefreshTokenStore {
        Database::open(":memory:").await.unwrap().refresh_tokens()
    }

    #[test]
    fn test_generated_token_is_64_lowercase_hex() {
        let token = generate_refresh_token().unwrap();
        assert_eq!(token.len(), 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let first = generate_refresh_token().unwrap();
        let second = generate_refresh_token().unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let store = store().await;
        let user_id = Uuid::new_v4();

        let issued = store.issue(user_id).await.unwrap();
        assert_eq!(issued.token.len(), 64);
        assert_eq!(
            issued.expires_at - issued.created_at,
            REFRESH_TOKEN_DURATION_SECS
        );
        assert!(issued.revoked_at.is_none());

        assert_eq!(store.resolve(&issued.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let store = store().await;
        let err = store
            .resolve(&generate_refresh_token().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshTokenError::NotFound));
    }

    #[tokio::test]
    async fn test_revoke_then_resolve() {
        let store = store().await;
        let issued = store.issue(Uuid::new_v4()).await.unwrap();

        assert!(store.revoke(&issued.token).await.unwrap());

        let err = store.resolve(&issued.token).await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::Revoked));
    }

    #[tokio::test]
    async fn test_second_revoke_keeps_first_timestamp() {
        let store = store().await;
        let issued = store.issue_at(Uuid::new_v4(), 1_000).await.unwrap();

        assert!(store.revoke_at(&issued.token, 1_100).await.unwrap());
        assert!(!store.revoke_at(&issued.token, 1_200).await.unwrap());

        let record = store.get(&issued.token).await.unwrap().unwrap();
        assert_eq!(record.revoked_at, Some(1_100));

        let err = store.resolve_at(&issued.token, 1_300).await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::Revoked));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_noop() {
        let store = store().await;
        assert!(!store.revoke("does-not-exist").await.unwrap());
    }

    #[tokio::test]
    async fn test_expiry_is_strict() {
        let store = store().await;
        let user_id = Uuid::new_v4();
        let issued = store.issue_at(user_id, 1_000).await.unwrap();
        let expires_at = 1_000 + REFRESH_TOKEN_DURATION_SECS;

        assert_eq!(
            store.resolve_at(&issued.token, expires_at - 1).await.unwrap(),
            user_id
        );

        let err = store.resolve_at(&issued.token, expires_at).await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::Expired));
    }

    #[tokio::test]
    async fn test_revoked_reported_before_expired() {
        let store = store().await;
        let issued = store.issue_at(Uuid::new_v4(), 1_000).await.unwrap();
        store.revoke_at(&issued.token, 1_001).await.unwrap();

        let far_future = 1_000 + REFRESH_TOKEN_DURATION_SECS * 2;
        let err = store
            .resolve_at(&issued.token, far_future)
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshTokenError::Revoked));
    }

    #[tokio::test]
    async fn test_collision_is_generation_failure() {
        let store = store().await;
        let token = generate_refresh_token().unwrap();

        store
            .insert(token.clone(), Uuid::new_v4(), 1_000)
            .await
            .unwrap();
        let err = store
            .insert(token.clone(), Uuid::new_v4(), 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshTokenError::GenerationFailure(_)));

        // The original record is untouched.
        let record = store.get(&token).await.unwrap().unwrap();
        assert!(record.is_usable_at(1_001));
    }

    #[tokio::test]
    async fn test_multiple_tokens_per_user_are_independent() {
        let store = store().await;
        let user_id = Uuid::new_v4();

        let first = store.issue(user_id).await.unwrap();
        let second = store.issue(user_id).await.unwrap();
        store.revoke(&first.token).await.unwrap();

        assert!(store.resolve(&first.token).await.is_err());
        assert_eq!(store.resolve(&second.token).await.unwrap(), user_id);
    }
}
