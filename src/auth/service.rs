/// Auth facade
///
/// Orchestrates the credential hasher, access token codec, bearer extractor
/// and refresh token store for the login, refresh and revoke flows.

use actix_web::http::header::HeaderMap;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::bearer::get_bearer_token;
use crate::auth::jwt::{
    clamp_access_token_ttl, issue_access_token, validate_access_token,
    MAX_ACCESS_TOKEN_TTL_SECONDS,
};
use crate::auth::password::{hash_password_with_cost, verify_password};
use crate::auth::refresh_token::{RefreshTokenStatus, RefreshTokenStore};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::users::{User, UserRepository};
use crate::validators::{is_present_password, is_valid_email};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Password checked against `dummy_hash` when the email is unknown
const UNKNOWN_ACCOUNT_PASSWORD: &str = "chirpy-unknown-account";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    settings: AuthSettings,
    /// Hash at the configured cost, so unknown emails cost one bcrypt check too
    dummy_hash: Option<String>,
}

impl AuthService {
    pub fn new(
        settings: AuthSettings,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let dummy_hash = match hash_password_with_cost(UNKNOWN_ACCOUNT_PASSWORD, settings.bcrypt_cost) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to prepare unknown-account hash");
                None
            }
        };

        Self {
            users,
            refresh_tokens,
            settings,
            dummy_hash,
        }
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, plain: &str) -> Result<String, AuthError> {
        let cost = self.settings.bcrypt_cost;
        let plain = plain.to_owned();
        run_blocking(move || hash_password_with_cost(&plain, cost)).await
    }

    async fn verify_password(&self, plain: &str, hashed: &str) -> Result<bool, AuthError> {
        let plain = plain.to_owned();
        let hashed = hashed.to_owned();
        run_blocking(move || verify_password(&plain, &hashed)).await
    }

    /// Exchange email and password for an access token and a refresh token
    ///
    /// Unknown email and wrong password fail identically. Each login issues an
    /// additional refresh token; earlier ones stay valid.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<LoginOutcome, AuthError> {
        // Same normalisation as registration, without its validation errors
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                if let Some(dummy_hash) = &self.dummy_hash {
                    let _ = self.verify_password(password, dummy_hash).await;
                }
                tracing::info!("Login rejected: unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify_password(password, &user.hashed_password).await? {
            tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = issue_access_token(
            user.id,
            &self.settings.secret,
            clamp_access_token_ttl(requested_ttl_seconds),
        )?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Resolve the user behind a bearer access token, without touching storage
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = get_bearer_token(headers)?;
        validate_access_token(&token, &self.settings.secret)
    }

    /// Mint a new access token from a bearer refresh token
    ///
    /// The refresh token is neither consumed nor rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = get_bearer_token(headers)?;

        let record = match self.refresh_tokens.lookup(&token).await {
            Ok(record) => record,
            Err(AuthError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        match record.status(Utc::now()) {
            RefreshTokenStatus::Revoked => {
                tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
                Err(AuthError::RevokedToken)
            }
            RefreshTokenStatus::Expired => {
                tracing::info!(user_id = %record.user_id, "Refresh token expired");
                Err(AuthError::ExpiredToken)
            }
            RefreshTokenStatus::Active => issue_access_token(
                record.user_id,
                &self.settings.secret,
                Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECONDS),
            ),
        }
    }

    /// Revoke the bearer refresh token; unknown or revoked tokens are accepted
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = get_bearer_token(headers)?;
        self.refresh_tokens.revoke(&token).await
    }

    /// Create an account
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = is_valid_email(email)?;
        is_present_password(password)?;

        let hashed = self.hash_password(password).await?;
        Ok(self.users.create(&email, &hashed).await?)
    }

    /// Replace the email and password of the user behind a bearer access token
    pub async fn update_credentials(
        &self,
        headers: &HeaderMap,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let user_id = self.authenticate(headers)?;
        let email = is_valid_email(email)?;
        is_present_password(password)?;

        let hashed = self.hash_password(password).await?;
        Ok(self.users.update_credentials(user_id, &email, &hashed).await?)
    }

    /// Wipe all refresh tokens and users
    pub async fn reset(&self) -> Result<(), AppError> {
        let tokens = self.refresh_tokens.delete_all().await?;
        let users = self.users.delete_all().await?;
        tracing::warn!(users, tokens, "All accounts deleted");
        Ok(())
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AuthError::Hashing(format!("hashing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_REFRESH_TOKEN_TTL_DAYS;
    use crate::memory::{InMemoryRefreshTokenStore, InMemoryUserRepository};

    fn service(bcrypt_cost: u32) -> AuthService {
        AuthService::new(
            AuthSettings {
                secret: "omgsecret".to_string(),
                refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
                bcrypt_cost,
            },
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenStore::default()),
        )
    }

    #[test]
    fn test_dummy_hash_uses_configured_cost() {
        let service = service(4);
        let dummy_hash = service.dummy_hash.as_deref().expect("dummy hash prepared");

        assert!(dummy_hash.starts_with("$2b$04$"));
        assert!(verify_password(UNKNOWN_ACCOUNT_PASSWORD, dummy_hash).unwrap());
        assert!(!verify_password("123456", dummy_hash).unwrap());
    }

    #[test]
    fn test_invalid_cost_skips_dummy_hash() {
        assert!(service(99).dummy_hash.is_none());
    }

    #[tokio::test]
    async fn test_unknown_email_matching_dummy_password_is_rejected() {
        let service = service(4);

        let result = service
            .login("ghost@chirpy.com", UNKNOWN_ACCOUNT_PASSWORD, None)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
