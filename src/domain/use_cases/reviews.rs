use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::locale::Locale,
    domain::slug::{next_unique_slug, slugify},
    domain::use_cases::auth::authorize_owner_or_admin,
    entities::review::{
        AdminStats, Review, ReviewDetail, ReviewImage, ReviewPayload, ReviewStatus,
        ReviewSummary, ReviewSummaryRow,
    },
    entities::user::User,
    errors::AppError,
    interfaces::repositories::review::ReviewRepository,
    utils::valid_uuid::valid_uuid,
};

const ACTIVITY_FEED_SIZE: i64 = 5;

/// Validates inbound review payloads, derives unique slugs, and maps
/// operations onto the persistence store.
pub struct ReviewHandler {
    pub review_repo: Arc<dyn ReviewRepository>,
}

impl ReviewHandler {
    pub fn new(review_repo: Arc<dyn ReviewRepository>) -> Self {
        ReviewHandler { review_repo }
    }

    /// Slug for a primary title, suffixed past any sibling already holding
    /// the base. `exclude` keeps a record from colliding with itself on
    /// update.
    async fn generate_slug(
        &self,
        primary_title: &str,
        exclude: Option<Uuid>,
    ) -> Result<String, AppError> {
        let base = slugify(primary_title);
        if base.is_empty() {
            return Err(AppError::field_error(
                "title",
                "Title must contain at least one alphanumeric character",
            ));
        }

        let existing = self.review_repo.slugs_with_base(&base, exclude).await?;
        Ok(next_unique_slug(&base, &existing))
    }

    /// Creates a review owned by the caller. A single INSERT carries the
    /// whole record, so either everything lands or nothing does.
    pub async fn create_review(
        &self,
        payload: ReviewPayload,
        author: &User,
    ) -> Result<Review, AppError> {
        payload.validate()?;

        let slug = self.generate_slug(payload.primary_title(), None).await?;
        let insert = payload.into_insert(slug, author.id);

        self.review_repo.create_review(&insert).await
    }

    /// Unpublished records are visible to their author and to admins only;
    /// everyone else sees a 404 rather than a hint that the draft exists.
    pub async fn get_review(
        &self,
        id: &str,
        viewer: Option<&User>,
        locale: Option<Locale>,
    ) -> Result<ReviewDetail, AppError> {
        let review_id = valid_uuid(id)?;
        let mut detail = self
            .review_repo
            .get_review_detail(&review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

        if detail.review.status != ReviewStatus::Published.as_str() {
            let allowed = viewer
                .is_some_and(|u| u.id == detail.review.author_id || u.is_admin());
            if !allowed {
                return Err(AppError::NotFound("Review not found".into()));
            }
        }

        if let Some(loc) = locale {
            detail.localize(loc);
        }

        Ok(detail)
    }

    /// Full-record update. The slug is regenerated only when the primary
    /// title changed; `author_id` never moves.
    pub async fn update_review(
        &self,
        id: &str,
        payload: ReviewPayload,
        caller: &User,
    ) -> Result<Review, AppError> {
        payload.validate()?;

        let review_id = valid_uuid(id)?;
        let existing = self
            .review_repo
            .get_review_by_id(&review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

        authorize_owner_or_admin(caller, &existing.author_id)?;

        let slug = if payload.primary_title() != existing.primary_title() {
            self.generate_slug(payload.primary_title(), Some(review_id)).await?
        } else {
            existing.slug.clone()
        };

        self.review_repo.update_review(&review_id, &payload, &slug).await
    }

    /// Permanent deletion, no tombstone.
    pub async fn delete_review(&self, id: &str, caller: &User) -> Result<(), AppError> {
        let review_id = valid_uuid(id)?;
        let existing = self
            .review_repo
            .get_review_by_id(&review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

        authorize_owner_or_admin(caller, &existing.author_id)?;

        self.review_repo.delete_review(&review_id).await
    }

    pub async fn list_public(
        &self,
        category: Option<&str>,
        limit: Option<i64>,
        locale: Option<Locale>,
    ) -> Result<Vec<ReviewSummary>, AppError> {
        let rows = self.review_repo.list_published(category, limit).await?;
        Ok(rows.into_iter().map(|row| row.into_summary(locale)).collect())
    }

    pub async fn list_admin(&self) -> Result<Vec<ReviewSummaryRow>, AppError> {
        self.review_repo.list_all().await
    }

    /// Substring search over title and content, published records only. A
    /// blank query returns an empty result without touching the store.
    pub async fn search(
        &self,
        query: &str,
        locale: Option<Locale>,
    ) -> Result<Vec<ReviewSummary>, AppError> {
        let term = query.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.review_repo.search_published(term).await?;
        Ok(rows.into_iter().map(|row| row.into_summary(locale)).collect())
    }

    pub async fn get_review_image(&self, id: &str) -> Result<ReviewImage, AppError> {
        let review_id = valid_uuid(id)?;
        self.review_repo
            .get_review_image(&review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".into()))
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        let total_reviews = self.review_repo.count_reviews().await?;
        let anime = self.review_repo.count_by_category("anime").await?;
        let manga = self.review_repo.count_by_category("manga").await?;
        let video_games = self.review_repo.count_by_category("video-games").await?;
        let recent_activity = self.review_repo.recent_activity(ACTIVITY_FEED_SIZE).await?;

        Ok(AdminStats {
            total_reviews,
            anime_and_manga_reviews: anime + manga,
            video_game_reviews: video_games,
            recent_activity,
        })
    }
}
