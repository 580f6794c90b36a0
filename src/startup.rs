use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::RevocationRegistry;
use crate::configuration::JwtSettings;
use crate::middleware::{AuthGate, RequestLogger};
use crate::routes::{
    create_post, get_data, get_profile, health_check, login, logout, refresh, register,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());
    // One registry per process; every worker shares it through the
    // Data handle.
    let registry = web::Data::new(RevocationRegistry::new());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(registry.clone())

            // Public routes (no authentication required). /api/health
            // is registered ahead of the gated /api scope so it stays
            // on the allow-list.
            .route("/api/health", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))

            // Protected routes (require a valid access token)
            .service(
                web::resource("/auth/logout")
                    .wrap(AuthGate::new(jwt_config.clone(), registry.clone()))
                    .route(web::post().to(logout)),
            )
            .service(
                web::scope("/api")
                    .wrap(AuthGate::new(jwt_config.clone(), registry.clone()))
                    .route("/profile", web::get().to(get_profile))
                    .route("/data", web::get().to(get_data))
                    .route("/posts", web::post().to(create_post)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
