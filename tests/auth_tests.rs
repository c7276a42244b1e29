
use test_utils::*;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use reviews_backend::{
    auth::jwt::JwtService,
    auth::password::hash_password,
    entities::user::User,
    middlewares::{auth::SessionMiddleware, csrf::CsrfGuard, rate_limit::RateLimitMiddleware},
    routes::configure_routes,
    AppState,
};

const STRONG_PASSWORD: &str = "k9#Vortex!candle";

fn build_state(users: Vec<User>) -> (web::Data<AppState>, JwtService) {
    let config = test_config();
    let jwt = JwtService::new(&config);
    let state = web::Data::new(AppState::with_repos(
        &config,
        FakeUserRepo::with_users(users),
        FakeReviewRepo::new(),
    ));
    (state, jwt)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(SessionMiddleware)
                .wrap(CsrfGuard)
                .wrap(RateLimitMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn register_returns_201_for_valid_input() {
    let (state, _) = build_state(vec![]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "new@example.com",
            "password": STRONG_PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn register_rejects_weak_passwords() {
    let (state, _) = build_state(vec![]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "new@example.com",
            "password": "password1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn register_then_login_returns_valid_tokens() {
    let (state, _) = build_state(vec![]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "login@example.com",
            "password": STRONG_PASSWORD
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "email": "login@example.com",
            "password": STRONG_PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let access_token = body["access_token"].as_str().unwrap().to_string();
    assert!(!access_token.is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(("Authorization", format!("Bearer {}", access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["email"], "login@example.com");
    assert_eq!(me["role"], "user");
}

#[actix_rt::test]
async fn wrong_credentials_are_rejected() {
    let mut user = regular_user();
    user.password_hash = Some(hash_password(STRONG_PASSWORD).unwrap());
    let email = user.email.clone();
    let (state, _) = build_state(vec![user]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": email, "password": "not-the-password"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Wrong credentials");
}

#[actix_rt::test]
async fn provider_accounts_without_a_hash_cannot_use_password_login() {
    let user = regular_user(); // password_hash: None
    let email = user.email.clone();
    let (state, _) = build_state(vec![user]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": email, "password": STRONG_PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn protected_endpoints_require_auth() {
    let (state, _) = build_state(vec![]);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn expired_tokens_are_rejected() {
    let user = regular_user();
    let mut config = test_config();
    // Issued already past its expiry, beyond any validation leeway
    config.session_expiration_minutes = -5;
    let expired_jwt = JwtService::new(&config);
    let token = expired_jwt.create_session_token(&user).unwrap();

    let (state, _) = build_state(vec![user]);
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn refresh_token_issues_a_new_pair() {
    let mut user = regular_user();
    user.password_hash = Some(hash_password(STRONG_PASSWORD).unwrap());
    let (state, jwt) = build_state(vec![user.clone()]);
    let app = init_app!(state);

    let refresh = jwt.create_refresh_token(&user.id).unwrap();

    let req = test::TestRequest::post()
        .uri("/auth/refresh-token")
        .set_json(json!({"refresh_token": refresh}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}
