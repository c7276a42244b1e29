use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Header carrying the double-submit CSRF token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cookie holding the server-issued copy of the CSRF token.
pub const CSRF_COOKIE: &str = "csrf-token";

/// CSRF cookie lifetime.
pub const CSRF_COOKIE_MAX_AGE_SECS: i64 = 24 * 60 * 60;
