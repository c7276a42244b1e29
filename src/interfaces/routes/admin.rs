use actix_web::web;

use crate::handlers::admin;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/stats")
                    .route(web::get().to(admin::admin_stats))
            )
            .service(
                web::resource("/reviews")
                    .route(web::get().to(admin::admin_list_reviews))
            )
    );
}
