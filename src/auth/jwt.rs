/// JWT Token Generation and Validation
///
/// Access tokens are HS256 JWTs validated without any storage lookup.
/// They cannot be revoked before expiry, which is why the TTL is capped at an hour.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::AuthError;

/// How far in the future `iat` may lie before a token is rejected
pub const CLOCK_SKEW_SECONDS: i64 = 30;
pub const MIN_ACCESS_TOKEN_TTL_SECONDS: i64 = 2;
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Resolve the access token lifetime requested by a client
///
/// Values inside [2s, 1h] are honoured. Anything else, including no value,
/// falls back to one hour instead of being rejected.
pub fn clamp_access_token_ttl(requested_seconds: Option<i64>) -> Duration {
    match requested_seconds {
        Some(seconds)
            if (MIN_ACCESS_TOKEN_TTL_SECONDS..=MAX_ACCESS_TOKEN_TTL_SECONDS).contains(&seconds) =>
        {
            Duration::seconds(seconds)
        }
        _ => Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECONDS),
    }
}

/// Generate a new access token for a user
///
/// # Errors
/// Returns `AuthError::Signing` if the secret is empty or encoding fails
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Same as [`issue_access_token`] with an explicit issue instant
pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Signing("signing secret is empty".to_string()));
    }

    let claims = Claims::new(user_id, now, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(format!("token encoding failed: {}", e)))
}

/// Validate an access token and return the user it was issued to
///
/// # Errors
/// - `AuthError::InvalidToken` for a bad signature, issuer, shape or future `iat`
/// - `AuthError::ExpiredToken` for a well-formed token past its `exp`
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    validate_access_token_at(token, secret, Utc::now())
}

/// Same as [`validate_access_token`] against an explicit clock
pub fn validate_access_token_at(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // exp is compared against `now` below, without leeway
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AuthError::InvalidToken
    })?;

    if claims.is_issued_after(now, CLOCK_SKEW_SECONDS) {
        tracing::debug!(iat = claims.iat, "Access token issued in the future");
        return Err(AuthError::InvalidToken);
    }

    if claims.is_expired_at(now) {
        return Err(AuthError::ExpiredToken);
    }

    claims.user_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_generate_and_validate_token() {
        let user_id = Uuid::new_v4();

        for ttl in [2, 60, 3600] {
            let token = issue_access_token(user_id, SECRET, Duration::seconds(ttl))
                .expect("Failed to generate token");
            let validated = validate_access_token(&token, SECRET).expect("Failed to validate token");
            assert_eq!(validated, user_id);
        }
    }

    #[test]
    fn test_ttl_clamping() {
        assert_eq!(clamp_access_token_ttl(Some(2)), Duration::seconds(2));
        assert_eq!(clamp_access_token_ttl(Some(3600)), Duration::seconds(3600));
        assert_eq!(clamp_access_token_ttl(Some(90)), Duration::seconds(90));

        for out_of_range in [None, Some(0), Some(1), Some(-5), Some(3601), Some(7200)] {
            assert_eq!(clamp_access_token_ttl(out_of_range), Duration::seconds(3600));
        }
    }

    #[test]
    fn test_out_of_range_ttl_matches_one_hour_token() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let one_hour = issue_access_token_at(user_id, SECRET, clamp_access_token_ttl(Some(3600)), now).unwrap();

        for requested in [0, 7200] {
            let token = issue_access_token_at(user_id, SECRET, clamp_access_token_ttl(Some(requested)), now)
                .unwrap();
            assert_eq!(token, one_hour);
        }
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, Duration::seconds(60)).unwrap();
        let result = validate_access_token(&token, "a-completely-different-secret");

        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expiry_boundary() {
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now() - Duration::hours(2);
        let token = issue_access_token_at(user_id, SECRET, Duration::seconds(60), issued_at).unwrap();

        let just_before = issued_at + Duration::seconds(59);
        assert_eq!(validate_access_token_at(&token, SECRET, just_before), Ok(user_id));

        let at_expiry = issued_at + Duration::seconds(60);
        assert_eq!(
            validate_access_token_at(&token, SECRET, at_expiry),
            Err(AuthError::ExpiredToken)
        );

        assert_eq!(validate_access_token(&token, SECRET), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_invalid_token() {
        let result = validate_access_token("invalid.token.here", SECRET);
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_token() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, Duration::seconds(60)).unwrap();

        let tampered = format!("{}X", token);
        assert_eq!(validate_access_token(&tampered, SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), Utc::now(), Duration::seconds(60));
        claims.iss = "someone-else".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(validate_access_token(&token, SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_non_uuid_subject() {
        let mut claims = Claims::new(Uuid::new_v4(), Utc::now(), Duration::seconds(60));
        claims.sub = "not-a-user".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(validate_access_token(&token, SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_issued_in_future() {
        let now = Utc::now();
        let token = issue_access_token_at(
            Uuid::new_v4(),
            SECRET,
            Duration::seconds(60),
            now + Duration::seconds(CLOCK_SKEW_SECONDS + 10),
        )
        .unwrap();

        assert_eq!(validate_access_token_at(&token, SECRET, now), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_small_clock_skew_is_tolerated() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let token = issue_access_token_at(user_id, SECRET, Duration::seconds(60), now + Duration::seconds(5))
            .unwrap();

        assert_eq!(validate_access_token_at(&token, SECRET, now), Ok(user_id));
    }

    #[test]
    fn test_empty_secret() {
        let result = issue_access_token(Uuid::new_v4(), "", Duration::seconds(60));
        assert!(matches!(result, Err(AuthError::Signing(_))));
    }
}
