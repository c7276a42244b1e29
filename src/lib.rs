use std::sync::Arc;
use std::time::Duration;

use redis::Client as RedisClient;

pub mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, locale, slug, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, limiter, media, utils};

use auth::jwt::JwtService;
use limiter::rate_limiter::{InMemoryRateLimiter, RateLimitStore, RedisRateLimiter};
use repositories::review::ReviewRepository;
use repositories::sqlx_repo::{SqlxReviewRepo, SqlxUserRepo};
use repositories::user::UserRepository;
use use_cases::auth::AuthHandler;
use use_cases::reviews::ReviewHandler;

pub struct AppState {
    pub auth_handler: AuthHandler,
    pub review_handler: ReviewHandler,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub redis_client: Option<RedisClient>,
    pub config: settings::AppConfig,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let user_repo = Arc::new(SqlxUserRepo::new(pool.clone()));
        let review_repo = Arc::new(SqlxReviewRepo::new(pool));
        Self::with_repos(config, user_repo, review_repo)
    }

    /// Persistence handles are injected explicitly; tests swap in fakes
    /// without a live database.
    pub fn with_repos(
        config: &settings::AppConfig,
        user_repo: Arc<dyn UserRepository>,
        review_repo: Arc<dyn ReviewRepository>,
    ) -> Self {
        let token_service = JwtService::new(config);

        let redis_client = config.redis_url.as_ref().and_then(|url| {
            RedisClient::open(url.as_str())
                .map_err(|e| tracing::error!("Redis connection error: {}", e))
                .ok()
        });

        let window = Duration::from_secs(config.rate_limit_window_secs);
        let rate_limiter: Arc<dyn RateLimitStore> = match &redis_client {
            Some(client) => Arc::new(RedisRateLimiter::new(
                client.clone(),
                window,
                config.rate_limit_max_requests,
            )),
            None => Arc::new(InMemoryRateLimiter::new(
                window,
                config.rate_limit_max_requests,
            )),
        };

        AppState {
            auth_handler: AuthHandler::new(user_repo, token_service),
            review_handler: ReviewHandler::new(review_repo),
            rate_limiter,
            redis_client,
            config: config.clone(),
        }
    }
}
