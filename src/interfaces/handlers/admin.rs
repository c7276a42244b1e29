use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{errors::AppError, use_cases::extractors::AuthClaims, AppState};

#[instrument(skip(claims, state))]
pub async fn admin_stats(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.auth_handler.require_admin(&claims.0).await?;

    let stats = state.review_handler.admin_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Status-unrestricted listing for the admin UI.
#[instrument(skip(claims, state))]
pub async fn admin_list_reviews(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.auth_handler.require_admin(&claims.0).await?;

    let reviews = state.review_handler.list_admin().await?;
    Ok(HttpResponse::Ok().json(reviews))
}
