use async_trait::async_trait;
use uuid::Uuid;
use sqlx::{self, PgPool, QueryBuilder};

use crate::{
    entities::review::{
        Review, ReviewActivity, ReviewDetail, ReviewImage, ReviewInsert, ReviewPayload,
        ReviewSummaryRow,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxReviewRepo,
};

const SUMMARY_COLUMNS: &str = r#"
    r.id, r.title, r.title_es, r.title_en, r.slug,
    r.content, r.content_es, r.content_en,
    r.category, r.platform, r.rating, r.cover_image,
    (r.image_data IS NOT NULL AND r.image_data <> '') AS has_image_data,
    r.image_mime_type, r.youtube_url, r.status,
    r.created_at, r.updated_at, u.name AS author_name
"#;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: &ReviewInsert) -> Result<Review, AppError>;
    async fn get_review_by_id(&self, id: &Uuid) -> Result<Option<Review>, AppError>;
    async fn get_review_detail(&self, id: &Uuid) -> Result<Option<ReviewDetail>, AppError>;
    async fn update_review(
        &self,
        id: &Uuid,
        payload: &ReviewPayload,
        slug: &str,
    ) -> Result<Review, AppError>;
    async fn delete_review(&self, id: &Uuid) -> Result<(), AppError>;
    async fn list_published(
        &self,
        category: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ReviewSummaryRow>, AppError>;
    async fn list_all(&self) -> Result<Vec<ReviewSummaryRow>, AppError>;
    async fn search_published(&self, query: &str) -> Result<Vec<ReviewSummaryRow>, AppError>;
    async fn slugs_with_base(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<String>, AppError>;
    async fn get_review_image(&self, id: &Uuid) -> Result<Option<ReviewImage>, AppError>;
    async fn count_reviews(&self) -> Result<i64, AppError>;
    async fn count_by_category(&self, category: &str) -> Result<i64, AppError>;
    async fn recent_activity(&self, limit: i64) -> Result<Vec<ReviewActivity>, AppError>;
}

impl SqlxReviewRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxReviewRepo { pool }
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepo {
    async fn create_review(&self, review: &ReviewInsert) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (
                title, title_es, title_en, slug,
                content, content_es, content_en,
                category, platform, rating, cover_image,
                image_data, image_mime_type, youtube_url,
                status, author_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(&review.title)
        .bind(&review.title_es)
        .bind(&review.title_en)
        .bind(&review.slug)
        .bind(&review.content)
        .bind(&review.content_es)
        .bind(&review.content_en)
        .bind(&review.category)
        .bind(&review.platform)
        .bind(review.rating)
        .bind(&review.cover_image)
        .bind(&review.image_data)
        .bind(&review.image_mime_type)
        .bind(&review.youtube_url)
        .bind(review.status.as_str())
        .bind(review.author_id)
        .bind(review.created_at)
        .bind(review.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("reviews_slug_key") {
                    return AppError::Conflict("Slug already exists".into());
                }
            }
            AppError::from(e)
        })
    }

    async fn get_review_by_id(&self, id: &Uuid) -> Result<Option<Review>, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn get_review_detail(&self, id: &Uuid) -> Result<Option<ReviewDetail>, AppError> {
        sqlx::query_as::<_, ReviewDetail>(
            r#"
            SELECT r.*, u.name AS author_name, u.email AS author_email
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn update_review(
        &self,
        id: &Uuid,
        payload: &ReviewPayload,
        slug: &str,
    ) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET
                title = $1,
                title_es = $2,
                title_en = $3,
                slug = $4,
                content = $5,
                content_es = $6,
                content_en = $7,
                category = $8,
                platform = $9,
                rating = $10,
                cover_image = $11,
                image_data = $12,
                image_mime_type = $13,
                youtube_url = $14,
                status = $15,
                updated_at = NOW()
            WHERE id = $16
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.title_es)
        .bind(&payload.title_en)
        .bind(slug)
        .bind(&payload.content)
        .bind(&payload.content_es)
        .bind(&payload.content_en)
        .bind(&payload.category)
        .bind(&payload.platform)
        .bind(payload.rating)
        .bind(&payload.cover_image)
        .bind(&payload.image_data)
        .bind(&payload.image_mime_type)
        .bind(&payload.youtube_url)
        .bind(payload.status.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("reviews_slug_key") {
                    return AppError::Conflict("Slug already exists".into());
                }
            }
            AppError::from(e)
        })
    }

    async fn delete_review(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Review not found".into()));
        }

        Ok(())
    }

    async fn list_published(
        &self,
        category: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ReviewSummaryRow>, AppError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {SUMMARY_COLUMNS} FROM reviews r JOIN users u ON u.id = r.author_id \
             WHERE r.status = 'published'"
        ));

        if let Some(category) = category {
            builder.push(" AND r.category = ").push_bind(category);
        }

        builder.push(" ORDER BY r.created_at DESC");

        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let rows = builder
            .build_query_as::<ReviewSummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<ReviewSummaryRow>, AppError> {
        let rows = sqlx::query_as::<_, ReviewSummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM reviews r JOIN users u ON u.id = r.author_id \
             ORDER BY r.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows)
    }

    async fn search_published(&self, query: &str) -> Result<Vec<ReviewSummaryRow>, AppError> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, ReviewSummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM reviews r JOIN users u ON u.id = r.author_id \
             WHERE r.status = 'published' AND (r.title ILIKE $1 OR r.content ILIKE $1) \
             ORDER BY r.created_at DESC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows)
    }

    async fn slugs_with_base(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM reviews
            WHERE (slug = $1 OR slug LIKE $2)
              AND ($3::uuid IS NULL OR id <> $3)
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", base))
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(slugs)
    }

    async fn get_review_image(&self, id: &Uuid) -> Result<Option<ReviewImage>, AppError> {
        sqlx::query_as::<_, ReviewImage>(
            "SELECT image_data, image_mime_type, cover_image FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn count_reviews(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn count_by_category(&self, category: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE category = $1")
            .bind(category)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ReviewActivity>, AppError> {
        let rows = sqlx::query_as::<_, ReviewActivity>(
            r#"
            SELECT r.id, r.title, r.title_es, r.title_en, r.status,
                   u.name AS author_name, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            ORDER BY r.updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows)
    }
}
