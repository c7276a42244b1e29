
use test_utils::*;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use reviews_backend::{
    auth::jwt::JwtService,
    entities::user::User,
    middlewares::{auth::SessionMiddleware, csrf::CsrfGuard, rate_limit::RateLimitMiddleware},
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};

struct TestHarness {
    state: web::Data<AppState>,
    jwt: JwtService,
    review_repo: Arc<FakeReviewRepo>,
}

fn harness_with_config(config: AppConfig, users: Vec<User>) -> TestHarness {
    let user_repo = FakeUserRepo::with_users(users);
    let review_repo = FakeReviewRepo::new();
    let jwt = JwtService::new(&config);
    let state = AppState::with_repos(&config, user_repo, review_repo.clone());

    TestHarness {
        state: web::Data::new(state),
        jwt,
        review_repo,
    }
}

fn harness(users: Vec<User>) -> TestHarness {
    harness_with_config(test_config(), users)
}

macro_rules! init_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data($harness.state.clone())
                .wrap(SessionMiddleware)
                .wrap(CsrfGuard)
                .wrap(RateLimitMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

fn bearer(jwt: &JwtService, user: &User) -> String {
    format!("Bearer {}", jwt.create_session_token(user).unwrap())
}

fn review_body() -> Value {
    json!({
        "titleEs": "Hola Mundo",
        "contentEs": "0123456789",
        "category": "anime",
        "status": "draft"
    })
}

#[actix_rt::test]
async fn public_listing_requires_no_session() {
    let h = harness(vec![]);
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/api/public/reviews").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn create_without_session_is_unauthorized_regardless_of_tokens() {
    let h = harness(vec![]);
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("X-CSRF-Token", "aaaa"))
        .cookie(actix_web::cookie::Cookie::new("csrf-token", "aaaa"))
        .set_json(review_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn create_without_csrf_tokens_is_forbidden() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("Authorization", bearer(&h.jwt, &user)))
        .set_json(review_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn mismatched_csrf_tokens_are_forbidden() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("Authorization", bearer(&h.jwt, &user)))
        .insert_header(("X-CSRF-Token", "token-a"))
        .cookie(actix_web::cookie::Cookie::new("csrf-token", "token-b"))
        .set_json(review_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn create_with_matching_csrf_succeeds_and_slugs_stay_unique() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let make_request = || {
        test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(("Authorization", bearer(&h.jwt, &user)))
            .insert_header(("X-CSRF-Token", "same-token"))
            .cookie(actix_web::cookie::Cookie::new("csrf-token", "same-token"))
            .set_json(review_body())
            .to_request()
    };

    let resp = test::call_service(&app, make_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["slug"], "hola-mundo");
    assert_eq!(body["authorId"], user.id.to_string());

    let resp = test::call_service(&app, make_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["slug"], "hola-mundo-1");

    assert_eq!(h.review_repo.reviews.lock().unwrap().len(), 2);
}

#[actix_rt::test]
async fn invalid_payload_returns_field_errors() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("Authorization", bearer(&h.jwt, &user)))
        .insert_header(("X-CSRF-Token", "t"))
        .cookie(actix_web::cookie::Cookie::new("csrf-token", "t"))
        .set_json(json!({"category": "anime"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));
}

#[actix_rt::test]
async fn csrf_issuance_needs_a_session_and_sets_the_cookie() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/api/csrf").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/csrf")
        .insert_header(("Authorization", bearer(&h.jwt, &user)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "csrf-token")
        .expect("csrf cookie missing");
    assert_eq!(cookie.http_only(), Some(true));

    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
}

#[actix_rt::test]
async fn admin_stats_trust_the_persisted_role_not_the_claims() {
    // The token claims admin, the user row says otherwise
    let demoted = regular_user();
    let mut claims_identity = demoted.clone();
    claims_identity.role = "admin".to_string();

    let h = harness(vec![demoted.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(("Authorization", bearer(&h.jwt, &claims_identity)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn admin_stats_report_aggregates_for_real_admins() {
    let admin = admin_user();
    let h = harness(vec![admin.clone()]);
    let app = init_app!(h);

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(("Authorization", bearer(&h.jwt, &admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalReviews"], 0);
    assert!(body["recentActivity"].as_array().is_some());
}

#[actix_rt::test]
async fn delete_is_gated_by_owner_or_admin() {
    let author = regular_user();
    let stranger = regular_user();
    let admin = admin_user();
    let h = harness(vec![author.clone(), stranger.clone(), admin.clone()]);
    let app = init_app!(h);

    let create = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("Authorization", bearer(&h.jwt, &author)))
        .insert_header(("X-CSRF-Token", "tok"))
        .cookie(actix_web::cookie::Cookie::new("csrf-token", "tok"))
        .set_json(review_body())
        .to_request();
    let resp = test::call_service(&app, create).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    let delete_as = |user: &User| {
        test::TestRequest::delete()
            .uri(&format!("/api/reviews/{}", id))
            .insert_header(("Authorization", bearer(&h.jwt, user)))
            .insert_header(("X-CSRF-Token", "tok"))
            .cookie(actix_web::cookie::Cookie::new("csrf-token", "tok"))
            .to_request()
    };

    let resp = test::call_service(&app, delete_as(&stranger)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, delete_as(&admin)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/reviews/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn requests_past_the_cap_get_429_with_a_retry_hint() {
    let mut config = test_config();
    config.rate_limit_max_requests = 3;
    let h = harness_with_config(config, vec![]);
    let app = init_app!(h);

    for _ in 0..3 {
        let req = test::TestRequest::get().uri("/api/public/reviews").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/api/public/reviews").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after = resp
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .expect("Retry-After header missing");
    assert!(retry_after > 0);

    // The issuance path stays reachable for a throttled client
    let req = test::TestRequest::get().uri("/api/csrf").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn image_endpoint_redirects_to_external_cover_url() {
    let user = regular_user();
    let h = harness(vec![user.clone()]);
    let app = init_app!(h);

    let mut body = review_body();
    body["coverImage"] = json!("https://images.example.com/cover.jpg");
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(("Authorization", bearer(&h.jwt, &user)))
        .insert_header(("X-CSRF-Token", "tok"))
        .cookie(actix_web::cookie::Cookie::new("csrf-token", "tok"))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/images/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").and_then(|v| v.to_str().ok()),
        Some("https://images.example.com/cover.jpg")
    );
}
