use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures_util::TryStreamExt;
use tracing::instrument;

use crate::{
    errors::AppError,
    media::image::{process_image, MAX_FILE_SIZE},
    use_cases::extractors::AuthClaims,
    AppState,
};

/// Accepts a multipart `image` field, downscales oversized uploads, and
/// returns the processed bytes base64-encoded for storage on the review
/// record.
#[instrument(skip(claims, state, payload))]
pub async fn upload_image(
    claims: AuthClaims,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<impl Responder, AppError> {
    state.auth_handler.resolve_identity(&claims.0).await?;

    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::field_error("image", &format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("image") {
            // Drain unrelated fields so the stream can advance
            while field
                .try_next()
                .await
                .map_err(|e| AppError::field_error("image", &format!("Invalid multipart payload: {}", e)))?
                .is_some()
            {}
            continue;
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::field_error("image", &format!("Failed to read upload: {}", e)))?
        {
            if bytes.len() + chunk.len() > MAX_FILE_SIZE {
                return Err(AppError::field_error(
                    "image",
                    "File too large. Maximum size is 5MB",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
        break;
    }

    let Some(bytes) = file_bytes else {
        return Err(AppError::field_error("image", "No file provided"));
    };

    // Decode and resize off the request executor
    let processed = web::block(move || process_image(&bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Image processing task failed: {}", e)))??;

    let size = processed.data.len();
    let image_data = BASE64.encode(&processed.data);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "imageData": image_data,
        "mimeType": processed.mime_type,
        "width": processed.width,
        "height": processed.height,
        "size": size,
    })))
}
