use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;
use redis::RedisResult;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::START_TIME, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    version: String,
    database: String,
    rate_limit_store: String,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let database = match state.auth_handler.user_repo.check_connection().await {
        Ok(_) => "OK",
        Err(_) => "Unavailable",
    };

    let rate_limit_store = if let Some(redis) = &state.redis_client {
        match redis.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(pong) if pong == "PONG" => "OK",
                    _ => "Unavailable",
                }
            }
            Err(_) => "Unavailable",
        }
    } else {
        "In-memory"
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy".to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        rate_limit_store: rate_limit_store.to_string(),
    })
}
