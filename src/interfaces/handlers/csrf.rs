use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpResponse, Responder,
};
use tracing::instrument;

use crate::{
    auth::csrf::generate_csrf_token,
    constants::{CSRF_COOKIE, CSRF_COOKIE_MAX_AGE_SECS},
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

/// Issues a fresh double-submit token to an authenticated caller: the same
/// value goes into the response body (for the request header) and into an
/// HttpOnly cookie scoped to the whole origin.
#[instrument(skip(_claims, state))]
pub async fn issue_csrf_token(
    _claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let token = generate_csrf_token();

    let cookie = Cookie::build(CSRF_COOKIE, token.clone())
        .http_only(true)
        .secure(state.config.is_production())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::seconds(CSRF_COOKIE_MAX_AGE_SECS))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({"token": token})))
}
