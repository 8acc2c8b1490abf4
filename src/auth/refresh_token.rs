/// Refresh Token Management
///
/// Refresh tokens are:
/// - Cryptographically secure random 64-character strings
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Reusable until they expire or are revoked (no rotation on refresh)
/// - Storage-backed, so revocation takes effect immediately

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AuthError;

pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a new cryptographically secure refresh token
///
/// 64 base62 characters, roughly 381 bits of entropy.
/// The plaintext goes to the client; the store only keeps its digest.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest used as the storage key of a refresh token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Lifecycle state of a refresh token at a given instant
///
/// `Expired` and `Revoked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenStatus {
    Active,
    Expired,
    Revoked,
}

/// A persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn new(token_hash: String, user_id: Uuid, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token_hash,
            user_id,
            created_at,
            expires_at: created_at + ttl,
            revoked_at: None,
        }
    }

    /// Revocation wins over expiry; a token is usable only while `now < expires_at`
    pub fn status(&self, now: DateTime<Utc>) -> RefreshTokenStatus {
        if self.revoked_at.is_some() {
            RefreshTokenStatus::Revoked
        } else if now >= self.expires_at {
            RefreshTokenStatus::Expired
        } else {
            RefreshTokenStatus::Active
        }
    }
}

/// Storage of opaque, revocable refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Create and persist a new token for `user_id`, returning the plaintext
    async fn issue(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Fetch the record for `token`
    ///
    /// Returns `AuthError::NotFound` when no row matches. Revocation and
    /// expiry are left for the caller to evaluate.
    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError>;

    /// Mark `token` revoked
    ///
    /// Idempotent: unknown or already revoked tokens are not an error and no
    /// row is ever created.
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;

    /// Remove every token; only used by the development reset
    async fn delete_all(&self) -> Result<u64, AuthError>;
}

/// Postgres-backed refresh token store
#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let token = generate_refresh_token();
        let record = RefreshTokenRecord::new(hash_token(&token), user_id, Utc::now(), self.ttl);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $3, $4, NULL)
            "#,
        )
        .bind(&record.token_hash)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, "Refresh token issued");
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        let token_hash = hash_token(token);

        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)>(
            r#"
            SELECT user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Err(AuthError::NotFound),
            Some((user_id, created_at, expires_at, revoked_at)) => Ok(RefreshTokenRecord {
                token_hash,
                user_id,
                created_at,
                expires_at,
                revoked_at,
            }),
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(now)
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows = result.rows_affected(), "Refresh token revoke applied");
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
