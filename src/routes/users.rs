use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthService;
use crate::error::{AppError, ErrorContext};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or empty password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let user = auth
        .register(&form.email, &form.password)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(user))
}

/// PUT /api/users
///
/// Requires `Authorization: Bearer <access_token>`; updates the caller's own
/// email and password.
pub async fn update_user(
    req: HttpRequest,
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update");

    let user = auth
        .update_credentials(req.headers(), &form.email, &form.password)
        .await
        .map_err(|e| context.record(e))?;

    let context = context.with_user_id(user.id.to_string());
    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(user))
}
