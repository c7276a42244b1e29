use actix_web::web;

use crate::handlers::auth;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register);
    cfg.service(auth::login);
    cfg.service(auth::refresh_token);
}
