/// In-memory stores
///
/// Process-local implementations of the storage traits, used by the test
/// suites and by `database.in_memory = true` for running without Postgres.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    generate_refresh_token, hash_token, RefreshTokenRecord, RefreshTokenStore,
    DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
use crate::error::{AuthError, DatabaseError};
use crate::users::{User, UserRepository};

/// Users keyed by id with a unique email index
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<DashMap<Uuid, User>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn duplicate_email() -> DatabaseError {
        DatabaseError::UniqueConstraintViolation("Email already registered".to_string())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|u| u.value().clone())))
    }

    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        match self.by_email.entry(email.to_string()) {
            Entry::Occupied(_) => Err(Self::duplicate_email()),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    created_at: now,
                    updated_at: now,
                    email: email.to_string(),
                    hashed_password: hashed_password.to_string(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let current_email = self
            .users
            .get(&id)
            .map(|u| u.email.clone())
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

        if current_email != email {
            match self.by_email.entry(email.to_string()) {
                Entry::Occupied(_) => return Err(Self::duplicate_email()),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.by_email.remove(&current_email);
        }

        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let count = self.users.len() as u64;
        self.users.clear();
        self.by_email.clear();
        Ok(count)
    }
}

/// Refresh tokens keyed by their SHA-256 digest
#[derive(Clone)]
pub struct InMemoryRefreshTokenStore {
    tokens: Arc<DashMap<String, RefreshTokenRecord>>,
    ttl: Duration,
}

impl InMemoryRefreshTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS))
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let token = generate_refresh_token();
        let record = RefreshTokenRecord::new(hash_token(&token), user_id, Utc::now(), self.ttl);
        self.tokens.insert(record.token_hash.clone(), record);
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.tokens
            .get(&hash_token(token))
            .map(|r| r.value().clone())
            .ok_or(AuthError::NotFound)
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        // get_mut holds the shard lock, so concurrent revokes serialize here
        if let Some(mut record) = self.tokens.get_mut(&hash_token(token)) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let count = self.tokens.len() as u64;
        self.tokens.clear();
        Ok(count)
    }
}
