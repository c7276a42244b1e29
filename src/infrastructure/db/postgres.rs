use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 20;
const MAX_ATTEMPTS: u32 = 6;

/// Connects with exponential backoff so the service survives a database
/// that comes up a little later than it does.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut wait = Duration::from_secs(2);

    for attempt in 1..=MAX_ATTEMPTS {
        match PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connection established.");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    "Database unreachable (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt, MAX_ATTEMPTS, e, wait
                );
                tokio::time::sleep(wait).await;
                wait *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("connect loop always returns")
}
