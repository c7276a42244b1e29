use actix_web::{http::header, web, HttpResponse, Responder};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::instrument;

use crate::{errors::AppError, AppState};

/// Streams the stored image bytes with their mime type, or redirects to the
/// external cover URL when no bytes were uploaded.
#[instrument(skip(review_id, state))]
pub async fn serve_review_image(
    review_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let image = state.review_handler.get_review_image(&review_id).await?;

    if let (Some(data), Some(mime_type)) = (&image.image_data, &image.image_mime_type) {
        if !data.is_empty() {
            let bytes = BASE64
                .decode(data)
                .map_err(|e| AppError::InternalError(format!("Corrupt stored image: {}", e)))?;

            return Ok(HttpResponse::Ok()
                .insert_header((header::CONTENT_TYPE, mime_type.clone()))
                .insert_header((header::CACHE_CONTROL, "public, max-age=3600, must-revalidate"))
                .body(bytes));
        }
    }

    if let Some(cover_image) = image.cover_image.filter(|url| !url.is_empty()) {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, cover_image))
            .finish());
    }

    Err(AppError::NotFound("No image found for this review".into()))
}
