use actix_web::web;

use crate::handlers::{auth, csrf, images, reviews, upload};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/public/reviews")
            .route(web::get().to(reviews::public_reviews))
    );

    cfg.service(
        web::resource("/search")
            .route(web::get().to(reviews::search_reviews))
    );

    cfg.service(
        web::resource("/csrf")
            .route(web::get().to(csrf::issue_csrf_token))
    );

    cfg.service(
        web::resource("/me")
            .route(web::get().to(auth::me))
    );

    cfg.service(
        web::resource("/reviews")
            .route(web::post().to(reviews::create_review))
    );

    cfg.service(
        web::resource("/reviews/{id}")
            .route(web::get().to(reviews::get_review))
            .route(web::put().to(reviews::update_review))
            .route(web::delete().to(reviews::delete_review))
    );

    cfg.service(
        web::resource("/upload")
            .route(web::post().to(upload::upload_image))
    );

    cfg.service(
        web::resource("/images/{id}")
            .route(web::get().to(images::serve_review_image))
    );
}
