use std::io::Cursor;

use image::{imageops::FilterType, GenericImageView, ImageFormat};

use crate::errors::AppError;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// 5MB upload ceiling.
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

const MAX_WIDTH: u32 = 1920;
const MAX_HEIGHT: u32 = 1080;

#[derive(Debug)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// Sniffs the real content type from the bytes; the client-declared type is
/// not trusted.
pub fn validate_image(bytes: &[u8]) -> Result<&'static str, AppError> {
    if bytes.is_empty() {
        return Err(AppError::field_error("image", "No file provided"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(AppError::field_error(
            "image",
            "File too large. Maximum size is 5MB",
        ));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| AppError::field_error("image", "Unrecognized file type"))?;

    let mime = kind.mime_type();
    if !ALLOWED_IMAGE_TYPES.contains(&mime) {
        return Err(AppError::field_error(
            "image",
            "Invalid file type. Allowed types: image/jpeg, image/jpg, image/png, image/webp",
        ));
    }

    Ok(match mime {
        "image/jpg" | "image/jpeg" => "image/jpeg",
        "image/png" => "image/png",
        _ => "image/webp",
    })
}

/// Decodes, downscales anything larger than 1920x1080 (aspect ratio kept),
/// and re-encodes in the source format.
pub fn process_image(bytes: &[u8]) -> Result<ProcessedImage, AppError> {
    let mime_type = validate_image(bytes)?;

    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::InternalError(format!("Failed to decode image: {}", e)))?;

    let (width, height) = img.dimensions();
    let resized = if width > MAX_WIDTH || height > MAX_HEIGHT {
        img.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        img
    };
    let (out_width, out_height) = resized.dimensions();

    let format = match mime_type {
        "image/png" => ImageFormat::Png,
        "image/webp" => ImageFormat::WebP,
        _ => ImageFormat::Jpeg,
    };

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| AppError::InternalError(format!("Failed to encode image: {}", e)))?;

    Ok(ProcessedImage {
        data: out.into_inner(),
        mime_type: mime_type.to_string(),
        width: out_width,
        height: out_height,
    })
}
