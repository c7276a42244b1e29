pub mod review;
pub mod sqlx_repo;
pub mod user;
