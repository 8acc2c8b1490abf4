use actix_web::{web, HttpResponse};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::metrics::HitCounter;

/// Admin switches decided at startup
#[derive(Debug, Clone, Copy)]
pub struct AdminSettings {
    pub reset_enabled: bool,
}

/// GET /admin/metrics
pub async fn metrics(counter: web::Data<HitCounter>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        counter.hits()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and deletes every account. Only enabled on the dev platform.
///
/// # Errors
/// - 403: Not running on the dev platform
pub async fn reset(
    admin: web::Data<AdminSettings>,
    counter: web::Data<HitCounter>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    if !admin.reset_enabled {
        return Err(AppError::Forbidden(
            "Reset is only allowed on the dev platform".to_string(),
        ));
    }

    counter.reset();
    auth.reset().await?;

    Ok(HttpResponse::Ok().body("Reset complete"))
}
