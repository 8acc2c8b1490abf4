/// Bearer credential extraction from the `Authorization` header

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Return the credential carried as `Authorization: Bearer <token>`
///
/// The prefix is matched literally and the remainder is trimmed.
///
/// # Errors
/// Returns `AuthError::MissingHeader` if the header is absent, not visible
/// ASCII, lacks the prefix, or carries an empty credential
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingHeader)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extracts_and_trims_token() {
        let token = get_bearer_token(&headers_with("Bearer   wobbles   ")).unwrap();
        assert_eq!(token, "wobbles");
    }

    #[test]
    fn test_plain_token() {
        let token = get_bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(get_bearer_token(&HeaderMap::new()), Err(AuthError::MissingHeader));
    }

    #[test]
    fn test_wrong_scheme() {
        for value in ["Basic dXNlcjpwYXNz", "bearer wobbles", "Bearerwobbles", "wobbles"] {
            assert_eq!(
                get_bearer_token(&headers_with(value)),
                Err(AuthError::MissingHeader),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_empty_credential() {
        assert_eq!(get_bearer_token(&headers_with("Bearer    ")), Err(AuthError::MissingHeader));
    }
}
