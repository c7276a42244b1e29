use actix_web::web;

use crate::handlers::system::health_check;

mod admin;
mod auth;
mod reviews;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);

    cfg.service(
        web::scope("/auth")
            .configure(auth::config_routes)
    );

    cfg.service(
        web::scope("/api")
            .configure(reviews::config_routes)
            .configure(admin::config_routes)
    );
}
