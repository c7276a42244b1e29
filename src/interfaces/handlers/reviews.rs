use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    domain::locale::Locale,
    entities::review::ReviewPayload,
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

fn parse_locale(query: &HashMap<String, String>) -> Option<Locale> {
    query.get("locale").and_then(|tag| Locale::from_tag(tag))
}

#[instrument(skip(claims, state, data))]
pub async fn create_review(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<ReviewPayload>,
) -> Result<impl Responder, AppError> {
    let caller = state.auth_handler.resolve_identity(&claims.0).await?;

    let review = state
        .review_handler
        .create_review(data.into_inner(), &caller)
        .await?;

    Ok(HttpResponse::Created().json(review))
}

#[instrument(skip(claims, review_id, state, query))]
pub async fn get_review(
    claims: Option<AuthClaims>,
    review_id: web::Path<String>,
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    // A session is optional here; it only widens visibility to drafts the
    // caller owns or administers
    let viewer = match &claims {
        Some(claims) => state.auth_handler.resolve_identity(&claims.0).await.ok(),
        None => None,
    };

    let review = state
        .review_handler
        .get_review(&review_id, viewer.as_ref(), parse_locale(&query))
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

#[instrument(skip(claims, review_id, state, data))]
pub async fn update_review(
    claims: AuthClaims,
    review_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<ReviewPayload>,
) -> Result<impl Responder, AppError> {
    let caller = state.auth_handler.resolve_identity(&claims.0).await?;

    let updated = state
        .review_handler
        .update_review(&review_id, data.into_inner(), &caller)
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[instrument(skip(claims, review_id, state))]
pub async fn delete_review(
    claims: AuthClaims,
    review_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let caller = state.auth_handler.resolve_identity(&claims.0).await?;

    state.review_handler.delete_review(&review_id, &caller).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Review deleted successfully"
    })))
}

#[instrument(skip(state, query))]
pub async fn public_reviews(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let category = query.get("category").map(String::as_str);
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|l| *l > 0)
        .map(|l| l.min(100));
    let locale = parse_locale(&query);

    let reviews = state
        .review_handler
        .list_public(category, limit, locale)
        .await?;

    Ok(HttpResponse::Ok().json(reviews))
}

#[instrument(skip(state, query))]
pub async fn search_reviews(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let term = query.get("q").map(String::as_str).unwrap_or_default();
    let locale = parse_locale(&query);

    let reviews = state.review_handler.search(term, locale).await?;

    Ok(HttpResponse::Ok().json(reviews))
}
