use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    http::header::{HeaderName, HeaderValue},
    web, Error,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    errors::AppError,
    limiter::rate_limiter::Decision,
    utils::get_client_ip::get_client_ip,
    AppState,
};

/// First pipeline stage: per-client admission control. Tracked globally per
/// client IP, not per endpoint. The token-issuance path is exempt so a
/// throttled client can still obtain a CSRF token once the window resets.
pub struct RateLimitMiddleware;

impl<S> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_exempt(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.clone(),
                None => {
                    tracing::error!("AppState missing in rate limit middleware");
                    return service.call(req).await;
                }
            };

            let client_ip = get_client_ip(&req, state.config.trust_x_forwarded_for);

            match state.rate_limiter.allow(&client_ip).await {
                Ok(Decision::Allow { .. }) => service.call(req).await,
                Ok(Decision::Deny { retry_after_secs }) => {
                    tracing::warn!(client_ip = %client_ip, "Rate limit exceeded");

                    let mut response = AppError::RateLimited(retry_after_secs).error_response();
                    let headers = response.headers_mut();
                    headers.insert(
                        HeaderName::from_static("x-ratelimit-limit"),
                        header_value(state.rate_limiter.limit()),
                    );
                    headers.insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from_static("0"),
                    );

                    Ok(req.into_response(response))
                }
                Err(e) => {
                    // A dead counter store must not take the site down with it
                    tracing::warn!("Rate limit store failure, admitting request: {}", e);
                    service.call(req).await
                }
            }
        })
    }
}

fn is_exempt(path: &str, method: &str) -> bool {
    method == "OPTIONS" || matches!(path, "/api/csrf" | "/health" | "/")
}

fn header_value(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_issuance_and_probes_are_exempt() {
        assert!(is_exempt("/api/csrf", "GET"));
        assert!(is_exempt("/health", "GET"));
        assert!(is_exempt("/", "GET"));
    }

    #[test]
    fn api_traffic_is_limited() {
        assert!(!is_exempt("/api/public/reviews", "GET"));
        assert!(!is_exempt("/api/reviews", "POST"));
        assert!(!is_exempt("/api/upload", "POST"));
    }
}
