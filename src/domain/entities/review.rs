use std::borrow::Cow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    domain::locale::{self, Locale},
    utils::youtube::extract_video_id,
};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_TITLE_LENGTH: u64 = 3;
const MAX_TITLE_LENGTH: u64 = 200;
const MIN_CONTENT_LENGTH: u64 = 10;
const MAX_CONTENT_LENGTH: u64 = 50_000;
const MAX_PLATFORM_LENGTH: u64 = 50;

pub const CATEGORIES: [&str; 3] = ["anime", "manga", "video-games"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::Published => "published",
            ReviewStatus::Archived => "archived",
        }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub title: Option<String>,
    pub title_es: Option<String>,
    pub title_en: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    pub content_es: Option<String>,
    pub content_en: Option<String>,
    pub category: String,
    pub platform: Option<String>,
    pub rating: Option<f64>,
    pub cover_image: Option<String>,
    pub image_data: Option<String>,
    pub image_mime_type: Option<String>,
    pub youtube_url: Option<String>,
    pub status: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn localized_title(&self, loc: Locale) -> &str {
        let specific = match loc {
            Locale::Es => self.title_es.as_deref(),
            Locale::En => self.title_en.as_deref(),
        };
        locale::resolve(specific, self.title.as_deref())
    }

    pub fn localized_content(&self, loc: Locale) -> &str {
        let specific = match loc {
            Locale::Es => self.content_es.as_deref(),
            Locale::En => self.content_en.as_deref(),
        };
        locale::resolve(specific, self.content.as_deref())
    }

    pub fn has_title_translation(&self, loc: Locale) -> bool {
        match loc {
            Locale::Es => locale::has_translation(self.title_es.as_deref()),
            Locale::En => locale::has_translation(self.title_en.as_deref()),
        }
    }

    pub fn has_content_translation(&self, loc: Locale) -> bool {
        match loc {
            Locale::Es => locale::has_translation(self.content_es.as_deref()),
            Locale::En => locale::has_translation(self.content_en.as_deref()),
        }
    }

    /// The title the slug is derived from: Spanish, then English, then the
    /// legacy column.
    pub fn primary_title(&self) -> &str {
        primary_title_of(
            self.title_es.as_deref(),
            self.title_en.as_deref(),
            self.title.as_deref(),
        )
    }
}

pub fn primary_title_of<'a>(
    title_es: Option<&'a str>,
    title_en: Option<&'a str>,
    title: Option<&'a str>,
) -> &'a str {
    locale::resolve(title_es, Some(locale::resolve(title_en, title)))
}

#[derive(Debug)]
pub struct ReviewInsert {
    pub title: Option<String>,
    pub title_es: Option<String>,
    pub title_en: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    pub content_es: Option<String>,
    pub content_en: Option<String>,
    pub category: String,
    pub platform: Option<String>,
    pub rating: Option<f64>,
    pub cover_image: Option<String>,
    pub image_data: Option<String>,
    pub image_mime_type: Option<String>,
    pub youtube_url: Option<String>,
    pub status: ReviewStatus,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── API Response Models ──────────────────────────────────────────

/// Listing shape for public endpoints. Stored image bytes are replaced by a
/// presence flag to keep list responses small.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummaryRow {
    pub id: Uuid,
    pub title: Option<String>,
    pub title_es: Option<String>,
    pub title_en: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    pub content_es: Option<String>,
    pub content_en: Option<String>,
    pub category: String,
    pub platform: Option<String>,
    pub rating: Option<f64>,
    pub cover_image: Option<String>,
    pub has_image_data: bool,
    pub image_mime_type: Option<String>,
    pub youtube_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    #[serde(flatten)]
    pub row: ReviewSummaryRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_title_translation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_content_translation: Option<bool>,
}

impl ReviewSummaryRow {
    pub fn into_summary(self, loc: Option<Locale>) -> ReviewSummary {
        match loc {
            None => ReviewSummary {
                row: self,
                localized_title: None,
                localized_content: None,
                has_title_translation: None,
                has_content_translation: None,
            },
            Some(loc) => {
                let (title_specific, content_specific) = match loc {
                    Locale::Es => (self.title_es.as_deref(), self.content_es.as_deref()),
                    Locale::En => (self.title_en.as_deref(), self.content_en.as_deref()),
                };
                let localized_title =
                    locale::resolve(title_specific, self.title.as_deref()).to_string();
                let localized_content =
                    locale::resolve(content_specific, self.content.as_deref()).to_string();
                let has_title = locale::has_translation(title_specific);
                let has_content = locale::has_translation(content_specific);

                ReviewSummary {
                    row: self,
                    localized_title: Some(localized_title),
                    localized_content: Some(localized_content),
                    has_title_translation: Some(has_title),
                    has_content_translation: Some(has_content),
                }
            }
        }
    }
}

/// Detail shape: the full record plus author attribution and, when a
/// locale was requested, the resolved text.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub author_name: Option<String>,
    pub author_email: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized: Option<LocalizedView>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedView {
    pub title: String,
    pub content: String,
    pub has_title_translation: bool,
    pub has_content_translation: bool,
}

impl ReviewDetail {
    pub fn localize(&mut self, loc: Locale) {
        self.localized = Some(LocalizedView {
            title: self.review.localized_title(loc).to_string(),
            content: self.review.localized_content(loc).to_string(),
            has_title_translation: self.review.has_title_translation(loc),
            has_content_translation: self.review.has_content_translation(loc),
        });
    }
}

/// Media columns only, for the image-serving endpoint.
#[derive(Debug, sqlx::FromRow)]
pub struct ReviewImage {
    pub image_data: Option<String>,
    pub image_mime_type: Option<String>,
    pub cover_image: Option<String>,
}

/// One line of the admin activity feed.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewActivity {
    pub id: Uuid,
    pub title: Option<String>,
    pub title_es: Option<String>,
    pub title_en: Option<String>,
    pub status: String,
    pub author_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_reviews: i64,
    pub anime_and_manga_reviews: i64,
    pub video_game_reviews: i64,
    pub recent_activity: Vec<ReviewActivity>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Inbound payload for both create and full-record update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_review_payload", skip_on_field_errors = false))]
pub struct ReviewPayload {
    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH, message = "Title must be 3-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH, message = "Title must be 3-200 characters"))]
    pub title_es: Option<String>,

    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH, message = "Title must be 3-200 characters"))]
    pub title_en: Option<String>,

    #[validate(length(min = MIN_CONTENT_LENGTH, max = MAX_CONTENT_LENGTH, message = "Content must be 10-50000 characters"))]
    pub content: Option<String>,

    #[validate(length(min = MIN_CONTENT_LENGTH, max = MAX_CONTENT_LENGTH, message = "Content must be 10-50000 characters"))]
    pub content_es: Option<String>,

    #[validate(length(min = MIN_CONTENT_LENGTH, max = MAX_CONTENT_LENGTH, message = "Content must be 10-50000 characters"))]
    pub content_en: Option<String>,

    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[validate(length(min = 1, max = MAX_PLATFORM_LENGTH, message = "Platform must be 1-50 characters"))]
    pub platform: Option<String>,

    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0 and 10"))]
    pub rating: Option<f64>,

    #[validate(custom(function = "validate_http_url"))]
    pub cover_image: Option<String>,

    pub image_data: Option<String>,

    pub image_mime_type: Option<String>,

    #[validate(custom(function = "validate_youtube_url"))]
    pub youtube_url: Option<String>,

    pub status: ReviewStatus,
}

impl ReviewPayload {
    pub fn primary_title(&self) -> &str {
        primary_title_of(
            self.title_es.as_deref(),
            self.title_en.as_deref(),
            self.title.as_deref(),
        )
    }

    pub fn into_insert(self, slug: String, author_id: Uuid) -> ReviewInsert {
        let now = Utc::now();
        ReviewInsert {
            title: self.title,
            title_es: self.title_es,
            title_en: self.title_en,
            slug,
            content: self.content,
            content_es: self.content_es,
            content_en: self.content_en,
            category: self.category,
            platform: self.platform,
            rating: self.rating,
            cover_image: self.cover_image,
            image_data: self.image_data,
            image_mime_type: self.image_mime_type,
            youtube_url: self.youtube_url,
            status: self.status,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(new_validation_error(
            "invalid_category",
            "Category must be one of: anime, manga, video-games",
        ))
    }
}

pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error(
            "invalid_url_scheme",
            "URL must start with http:// or https://",
        )),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

pub fn validate_youtube_url(url: &str) -> Result<(), ValidationError> {
    if extract_video_id(url).is_some() {
        Ok(())
    } else {
        Err(new_validation_error(
            "invalid_youtube_url",
            "YouTube URL must be a watch, youtu.be, or embed link",
        ))
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

/// Cross-field invariants: at least one title and one content variant, and
/// uploaded image bytes must carry a mime type.
fn validate_review_payload(payload: &ReviewPayload) -> Result<(), ValidationError> {
    if !(has_text(&payload.title) || has_text(&payload.title_es) || has_text(&payload.title_en)) {
        return Err(new_validation_error(
            "missing_title",
            "At least one of title, titleEs, titleEn is required",
        ));
    }
    if !(has_text(&payload.content)
        || has_text(&payload.content_es)
        || has_text(&payload.content_en))
    {
        return Err(new_validation_error(
            "missing_content",
            "At least one of content, contentEs, contentEn is required",
        ));
    }
    if has_text(&payload.image_data) && !has_text(&payload.image_mime_type) {
        return Err(new_validation_error(
            "missing_mime_type",
            "imageMimeType is required when imageData is present",
        ));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
