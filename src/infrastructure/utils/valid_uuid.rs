use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path segment as a UUID, mapping failures to a validation error.
pub fn valid_uuid(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::field_error("id", "Invalid UUID"))
}
