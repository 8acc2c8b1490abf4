/// Authentication module
///
/// Password hashing, JWT access tokens, bearer extraction, refresh token
/// storage and the facade that ties them together.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use bearer::get_bearer_token;
pub use claims::{Claims, ISSUER};
pub use jwt::{
    clamp_access_token_ttl, issue_access_token, issue_access_token_at, validate_access_token,
    validate_access_token_at, CLOCK_SKEW_SECONDS, MAX_ACCESS_TOKEN_TTL_SECONDS,
    MIN_ACCESS_TOKEN_TTL_SECONDS,
};
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use refresh_token::{
    generate_refresh_token, hash_token, PgRefreshTokenStore, RefreshTokenRecord,
    RefreshTokenStatus, RefreshTokenStore, DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
pub use service::{AuthService, LoginOutcome};
