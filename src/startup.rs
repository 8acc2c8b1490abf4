use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::logger::LoggerMiddleware;
use crate::metrics::HitCounter;
use crate::middleware::HitCounterMiddleware;
use crate::routes::{
    create_user, health_check, login, metrics, refresh, reset, revoke, update_user,
    AdminSettings,
};

pub fn run(
    listener: TcpListener,
    auth_service: AuthService,
    reset_enabled: bool,
) -> Result<Server, std::io::Error> {
    let auth_service = web::Data::new(auth_service);
    let hit_counter = web::Data::new(HitCounter::new());
    let admin_settings = web::Data::new(AdminSettings { reset_enabled });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(auth_service.clone())
            .app_data(hit_counter.clone())
            .app_data(admin_settings.clone())
            .service(
                web::scope("/api")
                    .wrap(HitCounterMiddleware::new(hit_counter.clone()))
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke)),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
